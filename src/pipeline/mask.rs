use super::blur::gaussian_blur;
use super::landmarks::{Landmarks, OVERLAY_GROUPS};
use crate::config::validate_kernel;
use crate::error::{Result, SpliceError};
use image::{ImageBuffer, Luma};
use tracing::{Level, span};

/// Per-pixel blend weight in `[0, 1]`, shared by every colour channel.
pub type Mask = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Soft mask over the eyes, brows, nose and mouth of a face.
///
/// Each overlay group is filled as a convex hull, the union is blurred and
/// re-thresholded so the region grows by about half the kernel, then blurred
/// once more to feather the edge.
pub fn face_mask(width: u32, height: u32, landmarks: &Landmarks, feather: u32) -> Result<Mask> {
    let span = span!(Level::DEBUG, "face_mask");
    let _guard = span.enter();

    validate_kernel(feather)?;
    if width == 0 || height == 0 {
        return Err(SpliceError::ShapeMismatch(format!(
            "cannot build a {width}x{height} mask"
        )));
    }

    let mut mask = Mask::new(width, height);
    for groups in OVERLAY_GROUPS {
        landmarks
            .polygon(groups)?
            .convex_hull()
            .fill(&mut mask, Luma([1.]));
    }

    let mut grown = gaussian_blur(&mask, feather)?;
    grown
        .pixels_mut()
        .for_each(|p| p[0] = if p[0] > 0. { 1. } else { 0. });

    let mut feathered = gaussian_blur(&grown, feather)?;
    feathered
        .pixels_mut()
        .for_each(|p| p[0] = p[0].clamp(0., 1.));

    Ok(feathered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::landmarks::{
        LEFT_BROW, LEFT_EYE, MOUTH, NOSE, NUM_LANDMARKS, RIGHT_BROW, RIGHT_EYE,
    };

    /// Every group collapsed onto a small square around its own center.
    fn square_face() -> Landmarks {
        let mut pts = vec![(0., 0.); NUM_LANDMARKS];
        let centers = [
            (RIGHT_BROW, (30., 25.)),
            (LEFT_BROW, (70., 25.)),
            (RIGHT_EYE, (30., 40.)),
            (LEFT_EYE, (70., 40.)),
            (NOSE, (50., 55.)),
            (MOUTH, (50., 75.)),
        ];
        for (group, (cx, cy)) in centers {
            for (n, i) in group.indices().enumerate() {
                let dx = if n % 2 == 0 { -6. } else { 6. };
                let dy = if n % 4 < 2 { -4. } else { 4. };
                pts[i] = (cx + dx, cy + dy);
            }
        }
        Landmarks::from_points(&pts)
    }

    #[test]
    fn test_mask_range_and_shape() {
        let mask = face_mask(100, 100, &square_face(), 11).unwrap();
        assert_eq!(mask.dimensions(), (100, 100));
        assert!(mask.pixels().all(|p| (0. ..=1.).contains(&p[0])));
    }

    #[test]
    fn test_mask_covers_features_only() {
        let mask = face_mask(100, 100, &square_face(), 11).unwrap();

        // eye hull interior and mouth
        assert!(mask.get_pixel(50, 35)[0] > 0.99);
        assert!(mask.get_pixel(50, 75)[0] > 0.99);
        // far corners
        assert_eq!(mask.get_pixel(2, 2)[0], 0.);
        assert_eq!(mask.get_pixel(97, 97)[0], 0.);
    }

    #[test]
    fn test_mask_edge_is_soft() {
        let mask = face_mask(100, 100, &square_face(), 11).unwrap();
        let row: Vec<f32> = (0..50).map(|x| mask.get_pixel(x, 35)[0]).collect();
        assert!(row.iter().any(|v| *v > 0.05 && *v < 0.95));
    }

    #[test]
    fn test_mask_rejects_even_feather() {
        assert!(face_mask(100, 100, &square_face(), 10).is_err());
    }

    #[test]
    fn test_mask_needs_full_landmarks() {
        let lm = Landmarks::from_points(&[(1., 1.); 20]);
        assert!(face_mask(50, 50, &lm, 11).is_err());
    }
}
