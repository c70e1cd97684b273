use super::blur::gaussian_blur;
use super::landmarks::{LEFT_EYE, Landmarks, RIGHT_EYE};
use crate::error::{Result, SpliceError};
use image::{Rgb, Rgb32FImage, RgbImage};
use tracing::{Level, span, trace};

/// Blurred source values at or below this are treated as missing.
const MIN_BLURRED: f32 = 1.;
/// Stand-in for missing blurred source values.
const MISSING_FILL: f32 = 128.;

/// Widens an 8 bit image to f32 without rescaling, so values stay in `0..=255`.
pub fn to_float(image: &RgbImage) -> Rgb32FImage {
    Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        Rgb([p[0] as f32, p[1] as f32, p[2] as f32])
    })
}

/// Kernel size for colour correction: `fraction` of the distance between the
/// eye centroids, rounded and forced odd.
pub fn correction_kernel(landmarks: &Landmarks, fraction: f64) -> Result<u32> {
    let left = landmarks.centroid(LEFT_EYE)?;
    let right = landmarks.centroid(RIGHT_EYE)?;
    let distance = (&left - &right).mapv(|v| v * v).sum().sqrt();

    let mut ksize = (fraction * distance).round().max(0.) as u32;
    if ksize % 2 == 0 {
        ksize += 1;
    }
    Ok(ksize)
}

/// Rescales `source` so its low frequency colour matches `target`, keeping
/// the detail of `source`. Both images must already share a frame.
pub fn correct_colors(
    target: &RgbImage,
    source: &RgbImage,
    target_landmarks: &Landmarks,
    blur_fraction: f64,
) -> Result<Rgb32FImage> {
    let span = span!(Level::DEBUG, "correct_colors");
    let _guard = span.enter();

    if target.dimensions() != source.dimensions() {
        return Err(SpliceError::ShapeMismatch(format!(
            "colour target is {:?} but source is {:?}",
            target.dimensions(),
            source.dimensions()
        )));
    }

    let ksize = correction_kernel(target_landmarks, blur_fraction)?;
    trace!("colour correction kernel {ksize}");

    let source = to_float(source);
    let target_blur = gaussian_blur(&to_float(target), ksize)?;
    let source_blur = gaussian_blur(&source, ksize)?;

    let mut out = source;
    for ((px, t), s) in out
        .pixels_mut()
        .zip(target_blur.pixels())
        .zip(source_blur.pixels())
    {
        for c in 0..3 {
            let denom = if s[c] <= MIN_BLURRED { MISSING_FILL } else { s[c] };
            px[c] = px[c] * t[c] / denom;
        }
    }

    Ok(out)
}
