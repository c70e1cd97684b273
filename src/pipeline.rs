use crate::config::SpliceConfig;
use crate::error::{Result, SpliceError};
use image::ImageReader;
use image::imageops::{FilterType, resize};
use landmarks::ALIGN_GROUPS;
use std::path::Path;
use tracing::{Level, debug, info, span, trace, warn};

pub mod align;
pub mod blur;
pub mod color;
pub mod composite;
pub mod landmarks;
pub mod mask;
pub mod pts;
pub mod warp;

pub use landmarks::{LandmarkProvider, Landmarks, LoadedImage};
pub use pts::PtsLandmarks;

/// Splices donor faces into recipient images using one landmark provider.
pub struct Pipeline {
    provider: Box<dyn LandmarkProvider>,
    config: SpliceConfig,
}

impl Pipeline {
    pub fn new(provider: Box<dyn LandmarkProvider>, config: SpliceConfig) -> Result<Pipeline> {
        config.validate()?;
        Ok(Pipeline { provider, config })
    }

    pub fn config(&self) -> &SpliceConfig {
        &self.config
    }

    /// Decodes an image as RGB, rescaled by the configured scale factor.
    pub fn load(&self, path: &Path) -> Result<LoadedImage> {
        let image_err = |source| SpliceError::Image {
            path: path.to_path_buf(),
            source,
        };
        let pixels = ImageReader::open(path)
            .map_err(|source| SpliceError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .decode()
            .map_err(image_err)?
            .into_rgb8();

        let scale = self.config.scale_factor;
        let pixels = if scale == 1. {
            pixels
        } else {
            let width = ((pixels.width() as f32 * scale).round() as u32).max(1);
            let height = ((pixels.height() as f32 * scale).round() as u32).max(1);
            trace!("Resizing {path:?} to {width}x{height}");
            resize(&pixels, width, height, FilterType::Triangle)
        };

        Ok(LoadedImage {
            path: path.to_path_buf(),
            pixels,
        })
    }

    /// Landmarks of the first face the provider finds.
    pub fn landmarks(&self, image: &LoadedImage) -> Result<Landmarks> {
        let faces = self.provider.detect_faces(image)?;
        let face = match faces.as_slice() {
            [] => {
                return Err(SpliceError::NoFaceDetected {
                    path: image.path.clone(),
                });
            }
            [face] => face,
            [face, ..] => {
                warn!(
                    "{} faces in {:?}, using the first",
                    faces.len(),
                    image.path
                );
                face
            }
        };
        trace!("Face bound: {face:?}");

        self.provider.localize_landmarks(image, face)
    }

    /// Aligns, masks, colour corrects and blends the donor face over the
    /// recipient face. The result has the recipient's dimensions.
    pub fn splice_images(&self, recipient: &LoadedImage, donor: &LoadedImage) -> Result<image::RgbImage> {
        let span = span!(Level::DEBUG, "splice");
        let _guard = span.enter();

        let recipient_landmarks = self.landmarks(recipient)?;
        let donor_landmarks = self.landmarks(donor)?;

        let transform = align::solve(
            &recipient_landmarks.select(&ALIGN_GROUPS)?,
            &donor_landmarks.select(&ALIGN_GROUPS)?,
        )?;
        debug!(
            "Donor to recipient: scale {:.3}, rotation {:.3}, translation {:?}",
            transform.scale(),
            transform.rotation(),
            transform.translation()
        );

        let frame = recipient.pixels.dimensions();
        let (donor_width, donor_height) = donor.pixels.dimensions();

        let donor_mask = mask::face_mask(
            donor_width,
            donor_height,
            &donor_landmarks,
            self.config.feather,
        )?;
        let warped_mask = warp::warp(&donor_mask, &transform, frame)?;
        let warped_donor = warp::warp(&donor.pixels, &transform, frame)?;

        let corrected = color::correct_colors(
            &recipient.pixels,
            &warped_donor,
            &recipient_landmarks,
            self.config.color_blur_fraction,
        )?;

        composite::composite(
            &recipient.pixels,
            &recipient_landmarks,
            &corrected,
            &warped_mask,
            self.config.feather,
        )
    }

    /// Splices the face from `donor_path` into `recipient_path` and writes the
    /// result to `output_path`. Nothing is written unless every stage succeeds.
    pub fn splice(&self, recipient_path: &Path, donor_path: &Path, output_path: &Path) -> Result<()> {
        if let Some(dir) = output_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                return Err(SpliceError::MissingDirectory(dir.to_path_buf()));
            }
        }

        let recipient = self.load(recipient_path)?;
        let donor = self.load(donor_path)?;
        let output = self.splice_images(&recipient, &donor)?;

        output.save(output_path).map_err(|source| SpliceError::Image {
            path: output_path.to_path_buf(),
            source,
        })?;
        info!("Result at {:?}", output_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rect;
    use image::RgbImage;
    use std::path::PathBuf;

    struct FixedFaces(usize);

    impl LandmarkProvider for FixedFaces {
        fn detect_faces(&self, _image: &LoadedImage) -> Result<Vec<Rect>> {
            Ok((0..self.0).map(|i| Rect::from_tl(i as u32 * 10, 0, 5, 5)).collect())
        }

        fn localize_landmarks(&self, _image: &LoadedImage, face: &Rect) -> Result<Landmarks> {
            let x = face.left() as f64;
            Ok(Landmarks::from_points(&vec![(x, 0.); landmarks::NUM_LANDMARKS]))
        }
    }

    fn blank() -> LoadedImage {
        LoadedImage {
            path: PathBuf::from("blank.png"),
            pixels: RgbImage::new(8, 8),
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SpliceConfig {
            feather: 4,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::new(Box::new(FixedFaces(1)), config),
            Err(SpliceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_face() {
        let pipeline = Pipeline::new(Box::new(FixedFaces(0)), SpliceConfig::default()).unwrap();
        assert!(matches!(
            pipeline.landmarks(&blank()),
            Err(SpliceError::NoFaceDetected { .. })
        ));
    }

    #[test]
    fn test_first_of_many_faces() {
        let pipeline = Pipeline::new(Box::new(FixedFaces(3)), SpliceConfig::default()).unwrap();
        let lm = pipeline.landmarks(&blank()).unwrap();
        assert_eq!(lm.points()[[0, 0]], 0.);
    }

    #[test]
    fn test_load_rescales() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        RgbImage::new(40, 20).save(&path).unwrap();

        let config = SpliceConfig {
            scale_factor: 0.5,
            ..Default::default()
        };
        let pipeline = Pipeline::new(Box::new(FixedFaces(1)), config).unwrap();
        let loaded = pipeline.load(&path).unwrap();
        assert_eq!(loaded.pixels.dimensions(), (20, 10));
    }

    #[test]
    fn test_load_missing_file() {
        let pipeline = Pipeline::new(Box::new(FixedFaces(1)), SpliceConfig::default()).unwrap();
        assert!(matches!(
            pipeline.load(Path::new("/nonexistent/face.png")),
            Err(SpliceError::Io { .. })
        ));
    }
}
