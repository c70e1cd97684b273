use crate::error::{Result, SpliceError};
use crate::shapes::{Point, Polygon, Rect};
use image::RgbImage;
use ndarray::{Array1, Array2, Axis};
use std::path::PathBuf;

/// Number of points in the iBUG 68-point annotation every provider must produce.
pub const NUM_LANDMARKS: usize = 68;

/// A named, contiguous range of landmark indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointGroup {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
}

impl PointGroup {
    const fn new(name: &'static str, start: usize, end: usize) -> Self {
        Self { name, start, end }
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> {
        self.start..self.end
    }
}

pub const JAW: PointGroup = PointGroup::new("jaw", 0, 17);
pub const RIGHT_BROW: PointGroup = PointGroup::new("right brow", 17, 22);
pub const LEFT_BROW: PointGroup = PointGroup::new("left brow", 22, 27);
pub const NOSE: PointGroup = PointGroup::new("nose", 27, 35);
pub const RIGHT_EYE: PointGroup = PointGroup::new("right eye", 36, 42);
pub const LEFT_EYE: PointGroup = PointGroup::new("left eye", 42, 48);
pub const MOUTH: PointGroup = PointGroup::new("mouth", 48, 61);

/// Points used to line the donor face up with the recipient face.
pub const ALIGN_GROUPS: [PointGroup; 6] = [LEFT_BROW, RIGHT_EYE, LEFT_EYE, RIGHT_BROW, NOSE, MOUTH];

/// Each entry becomes one convex hull of the face mask.
pub const OVERLAY_GROUPS: [&[PointGroup]; 2] = [
    &[LEFT_EYE, RIGHT_EYE, LEFT_BROW, RIGHT_BROW],
    &[NOSE, MOUTH],
];

pub fn group_indices(groups: &[PointGroup]) -> Vec<usize> {
    groups.iter().flat_map(|g| g.indices()).collect()
}

/// Ordered landmark coordinates of one face, one `(x, y)` row per point.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    points: Array2<f64>,
}

impl Landmarks {
    pub fn new(points: Array2<f64>) -> Result<Self> {
        if points.ncols() != 2 {
            return Err(SpliceError::ShapeMismatch(format!(
                "landmarks need 2 columns, got {}",
                points.ncols()
            )));
        }
        Ok(Self { points })
    }

    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let mut arr = Array2::zeros((points.len(), 2));
        for (i, (x, y)) in points.iter().enumerate() {
            arr[[i, 0]] = *x;
            arr[[i, 1]] = *y;
        }
        Self { points: arr }
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    pub fn scaled(&self, factor: f64) -> Landmarks {
        Landmarks {
            points: &self.points * factor,
        }
    }

    /// Rows for the given groups, in group order.
    pub fn select(&self, groups: &[PointGroup]) -> Result<Array2<f64>> {
        let idxs = group_indices(groups);
        self.check_indices(&idxs)?;
        Ok(self.points.select(Axis(0), &idxs))
    }

    pub fn centroid(&self, group: PointGroup) -> Result<Array1<f64>> {
        self.select(&[group])?
            .mean_axis(Axis(0))
            .ok_or_else(|| SpliceError::ShapeMismatch(format!("{} has no points", group.name)))
    }

    /// Landmarks of the groups as a pixel polygon.
    pub fn polygon(&self, groups: &[PointGroup]) -> Result<Polygon> {
        let selected = self.select(groups)?;
        Ok(Polygon::new(
            selected
                .rows()
                .into_iter()
                .map(|r| Point::from_f64(r[0], r[1]))
                .collect(),
        ))
    }

    pub fn bounds(&self) -> Option<Rect> {
        let points: Vec<Point> = self
            .points
            .rows()
            .into_iter()
            .map(|r| Point::from_f64(r[0], r[1]))
            .collect();
        Rect::bounding(&points)
    }

    fn check_indices(&self, idxs: &[usize]) -> Result<()> {
        match idxs.iter().max() {
            Some(max) if *max >= self.len() => Err(SpliceError::ShapeMismatch(format!(
                "landmark index {max} out of range for {} points",
                self.len()
            ))),
            _ => Ok(()),
        }
    }
}

/// A decoded image together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub pixels: RgbImage,
}

/// Finds faces and places landmarks on them.
///
/// Implementations must produce `NUM_LANDMARKS` points following the iBUG
/// 68-point index layout that the point groups above refer to.
pub trait LandmarkProvider: Send + Sync {
    fn detect_faces(&self, image: &LoadedImage) -> Result<Vec<Rect>>;

    fn localize_landmarks(&self, image: &LoadedImage, face: &Rect) -> Result<Landmarks>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered() -> Landmarks {
        let pts: Vec<(f64, f64)> = (0..NUM_LANDMARKS).map(|i| (i as f64, 2. * i as f64)).collect();
        Landmarks::from_points(&pts)
    }

    #[test]
    fn test_group_ranges() {
        assert_eq!(group_indices(&[JAW]).len(), 17);
        assert_eq!(group_indices(&[MOUTH]), (48..61).collect::<Vec<_>>());
        assert_eq!(group_indices(&ALIGN_GROUPS).len(), 5 + 6 + 6 + 5 + 8 + 13);
    }

    #[test]
    fn test_select_keeps_group_order() {
        let lm = numbered();
        let sel = lm.select(&[LEFT_EYE, RIGHT_EYE]).unwrap();
        assert_eq!(sel.nrows(), 12);
        assert_eq!(sel[[0, 0]], 42.);
        assert_eq!(sel[[6, 0]], 36.);
        assert_eq!(sel[[6, 1]], 72.);
    }

    #[test]
    fn test_centroid() {
        let c = numbered().centroid(RIGHT_EYE).unwrap();
        assert!((c[0] - 38.5).abs() < 1e-9);
        assert!((c[1] - 77.).abs() < 1e-9);
    }

    #[test]
    fn test_short_landmarks_rejected() {
        let lm = Landmarks::from_points(&[(0., 0.), (1., 1.)]);
        assert!(matches!(
            lm.select(&[MOUTH]),
            Err(SpliceError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_new_requires_two_columns() {
        assert!(Landmarks::new(Array2::zeros((68, 3))).is_err());
        assert!(Landmarks::new(Array2::zeros((68, 2))).is_ok());
    }
}
