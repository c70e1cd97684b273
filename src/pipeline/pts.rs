//! Landmarks read from iBUG 300-W `.pts` sidecar files.
//!
//! A sidecar holds one block per face:
//!
//! ```text
//! version: 1
//! n_points: 68
//! {
//! 312.5 201.0
//! ...
//! }
//! ```
//!
//! For `faces/ada.jpg` the sidecar is `faces/ada.pts`, or `<dir>/ada.pts` when
//! a landmark directory is configured.

use super::landmarks::{LandmarkProvider, Landmarks, LoadedImage, NUM_LANDMARKS};
use crate::error::{Result, SpliceError};
use crate::shapes::Rect;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

pub struct PtsLandmarks {
    dir: Option<PathBuf>,
    scale: f64,
    /// Parsed (and scaled) sidecars by path; each file is read once.
    cache: Mutex<HashMap<PathBuf, Arc<Vec<Landmarks>>>>,
}

impl PtsLandmarks {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            scale: 1.,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Coordinates are multiplied by `scale`, matching images rescaled on load.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn sidecar_path(&self, image_path: &Path) -> PathBuf {
        match &self.dir {
            Some(dir) => {
                let stem = image_path.file_stem().unwrap_or_default();
                dir.join(format!("{}.pts", stem.to_string_lossy()))
            }
            None => image_path.with_extension("pts"),
        }
    }

    fn read_faces(&self, image: &LoadedImage) -> Result<Arc<Vec<Landmarks>>> {
        let path = self.sidecar_path(&image.path);
        if let Some(faces) = self.cache().get(&path) {
            return Ok(Arc::clone(faces));
        }

        let faces = if path.is_file() {
            let text = std::fs::read_to_string(&path).map_err(|source| SpliceError::Io {
                path: path.clone(),
                source,
            })?;
            let faces = parse_pts(&text, &path)?;
            trace!("{} face(s) in {path:?}", faces.len());
            faces
                .into_iter()
                .map(|lm| {
                    if self.scale == 1. {
                        lm
                    } else {
                        lm.scaled(self.scale)
                    }
                })
                .collect()
        } else {
            debug!("No landmark sidecar at {path:?}");
            Vec::new()
        };

        let faces = Arc::new(faces);
        self.cache().insert(path, Arc::clone(&faces));
        Ok(faces)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Vec<Landmarks>>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LandmarkProvider for PtsLandmarks {
    fn detect_faces(&self, image: &LoadedImage) -> Result<Vec<Rect>> {
        Ok(self
            .read_faces(image)?
            .iter()
            .filter_map(Landmarks::bounds)
            .collect())
    }

    /// The face whose box best overlaps `face`; ties go to the earliest block.
    fn localize_landmarks(&self, image: &LoadedImage, face: &Rect) -> Result<Landmarks> {
        let faces = self.read_faces(image)?;
        let mut best: Option<(f32, &Landmarks)> = None;
        for lm in faces.iter() {
            let Some(bounds) = lm.bounds() else {
                continue;
            };
            let pct = bounds.overlap_pct(face);
            if best.is_none_or(|(top, _)| pct > top) {
                best = Some((pct, lm));
            }
        }

        best.map(|(_, lm)| lm.clone())
            .ok_or_else(|| SpliceError::NoFaceDetected {
                path: image.path.clone(),
            })
    }
}

pub fn parse_pts(text: &str, path: &Path) -> Result<Vec<Landmarks>> {
    let err = |line: usize, reason: String| SpliceError::Landmarks {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut faces = Vec::new();
    let mut expected = NUM_LANDMARKS;
    let mut current: Option<Vec<(f64, f64)>> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match current.as_mut() {
            None => match line {
                "{" => current = Some(Vec::with_capacity(expected)),
                l if l.starts_with("version:") => {}
                l if l.starts_with("n_points:") => {
                    let n = l["n_points:".len()..].trim();
                    expected = n
                        .parse()
                        .map_err(|_| err(line_no, format!("bad point count {n:?}")))?;
                }
                l => return Err(err(line_no, format!("unexpected {l:?} outside a block"))),
            },
            Some(points) if line == "}" => {
                if points.len() != expected {
                    return Err(err(
                        line_no,
                        format!("expected {expected} points, found {}", points.len()),
                    ));
                }
                faces.push(Landmarks::from_points(points));
                current = None;
                expected = NUM_LANDMARKS;
            }
            Some(points) => {
                let mut coords = line.split_whitespace().map(str::parse::<f64>);
                match (coords.next(), coords.next(), coords.next()) {
                    (Some(Ok(x)), Some(Ok(y)), None) => points.push((x, y)),
                    _ => return Err(err(line_no, format!("bad point {line:?}"))),
                }
            }
        }
    }

    if current.is_some() {
        return Err(err(text.lines().count(), "unterminated block".to_string()));
    }

    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(offset: f64) -> String {
        let mut s = String::from("version: 1\nn_points: 68\n{\n");
        for i in 0..NUM_LANDMARKS {
            s.push_str(&format!("{} {}\n", offset + i as f64, offset + 2. * i as f64));
        }
        s.push_str("}\n");
        s
    }

    #[test]
    fn test_parse_single_face() {
        let faces = parse_pts(&block(0.), Path::new("a.pts")).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].len(), NUM_LANDMARKS);
        assert_eq!(faces[0].points()[[10, 1]], 20.);
    }

    #[test]
    fn test_parse_multiple_faces() {
        let text = format!("{}\n{}", block(0.), block(500.));
        let faces = parse_pts(&text, Path::new("a.pts")).unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[1].points()[[0, 0]], 500.);
    }

    #[test]
    fn test_parse_rejects_short_block() {
        let text = "version: 1\nn_points: 68\n{\n1 2\n3 4\n}\n";
        match parse_pts(text, Path::new("a.pts")) {
            Err(SpliceError::Landmarks { line, .. }) => assert_eq!(line, 6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let text = "version: 1\nn_points: 68\n{\n1 two\n";
        assert!(matches!(
            parse_pts(text, Path::new("a.pts")),
            Err(SpliceError::Landmarks { line: 4, .. })
        ));

        assert!(parse_pts("{\n1 2\n", Path::new("a.pts")).is_err());
    }

    #[test]
    fn test_sidecar_path() {
        let provider = PtsLandmarks::new(None);
        assert_eq!(
            provider.sidecar_path(Path::new("faces/ada.jpg")),
            PathBuf::from("faces/ada.pts")
        );

        let provider = PtsLandmarks::new(Some(PathBuf::from("marks")));
        assert_eq!(
            provider.sidecar_path(Path::new("faces/ada.jpg")),
            PathBuf::from("marks/ada.pts")
        );
    }

    #[test]
    fn test_provider_reads_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ada.pts"), format!("{}{}", block(10.), block(300.)))
            .unwrap();

        let image = LoadedImage {
            path: dir.path().join("ada.png"),
            pixels: image::RgbImage::new(4, 4),
        };
        let provider = PtsLandmarks::new(None).with_scale(2.);

        let faces = provider.detect_faces(&image).unwrap();
        assert_eq!(faces.len(), 2);

        let lm = provider.localize_landmarks(&image, &faces[1]).unwrap();
        assert_eq!(lm.points()[[0, 0]], 600.);
    }

    fn sidecar_image(dir: &Path, blocks: &[String]) -> LoadedImage {
        std::fs::write(dir.join("ada.pts"), blocks.concat()).unwrap();
        LoadedImage {
            path: dir.join("ada.png"),
            pixels: image::RgbImage::new(4, 4),
        }
    }

    #[test]
    fn test_equal_boxes_pick_the_first_face() {
        let dir = tempfile::tempdir().unwrap();
        // Entirely off-image faces both clamp to the same empty box.
        let image = sidecar_image(dir.path(), &[block(-1000.), block(-2000.)]);
        let provider = PtsLandmarks::new(None);

        let faces = provider.detect_faces(&image).unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0], faces[1]);

        let lm = provider.localize_landmarks(&image, &faces[0]).unwrap();
        assert_eq!(lm.points()[[0, 0]], -1000.);
    }

    #[test]
    fn test_same_box_different_points_picks_the_first_face() {
        let dir = tempfile::tempdir().unwrap();
        let moved = block(0.).replacen("\n10 20\n", "\n11 21\n", 1);
        let image = sidecar_image(dir.path(), &[block(0.), moved]);
        let provider = PtsLandmarks::new(None);

        let faces = provider.detect_faces(&image).unwrap();
        assert_eq!(faces[0], faces[1]);
        let lm = provider.localize_landmarks(&image, &faces[1]).unwrap();
        assert_eq!(lm.points()[[10, 0]], 10.);
    }

    #[test]
    fn test_large_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let mut text = String::from("version: 1\nn_points: 68\n{\n");
        for i in 0..NUM_LANDMARKS {
            text.push_str(&format!("{} {}\n", i * 1500, i * 1500));
        }
        text.push_str("}\n");
        let image = sidecar_image(dir.path(), &[text]);
        let provider = PtsLandmarks::new(None);

        let faces = provider.detect_faces(&image).unwrap();
        assert_eq!(faces[0].w, 100_500);
        let lm = provider.localize_landmarks(&image, &faces[0]).unwrap();
        assert_eq!(lm.points()[[67, 1]], 100_500.);
    }

    #[test]
    fn test_sidecar_is_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let image = sidecar_image(dir.path(), &[block(0.)]);
        let provider = PtsLandmarks::new(None);
        assert_eq!(provider.detect_faces(&image).unwrap().len(), 1);

        std::fs::write(dir.path().join("ada.pts"), "garbage").unwrap();
        let faces = provider.detect_faces(&image).unwrap();
        assert_eq!(faces.len(), 1);
        assert!(provider.localize_landmarks(&image, &faces[0]).is_ok());
    }

    #[test]
    fn test_missing_sidecar_means_no_faces() {
        let image = LoadedImage {
            path: PathBuf::from("/nonexistent/ada.png"),
            pixels: image::RgbImage::new(4, 4),
        };
        assert!(PtsLandmarks::new(None).detect_faces(&image).unwrap().is_empty());
    }
}
