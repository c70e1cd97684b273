use super::landmarks::Landmarks;
use super::mask::{Mask, face_mask};
use crate::error::{Result, SpliceError};
use image::{Rgb, Rgb32FImage, RgbImage};
use tracing::{Level, span};

/// Blends the colour corrected, warped donor into the recipient over the
/// union of the recipient's own face mask and the warped donor mask.
pub fn composite(
    recipient: &RgbImage,
    recipient_landmarks: &Landmarks,
    donor: &Rgb32FImage,
    donor_mask: &Mask,
    feather: u32,
) -> Result<RgbImage> {
    let span = span!(Level::DEBUG, "composite");
    let _guard = span.enter();

    let (width, height) = recipient.dimensions();
    let mut combined = face_mask(width, height, recipient_landmarks, feather)?;
    if combined.dimensions() != donor_mask.dimensions() {
        return Err(SpliceError::ShapeMismatch(format!(
            "recipient is {:?} but donor mask is {:?}",
            recipient.dimensions(),
            donor_mask.dimensions()
        )));
    }
    for (m, d) in combined.pixels_mut().zip(donor_mask.pixels()) {
        m[0] = m[0].max(d[0]);
    }

    blend(recipient, donor, &combined)
}

/// `recipient·(1 − m) + donor·m` per channel, rounded back to 8 bits.
pub fn blend(recipient: &RgbImage, donor: &Rgb32FImage, mask: &Mask) -> Result<RgbImage> {
    if recipient.dimensions() != donor.dimensions() || recipient.dimensions() != mask.dimensions() {
        return Err(SpliceError::ShapeMismatch(format!(
            "cannot blend {:?} with {:?} under a {:?} mask",
            recipient.dimensions(),
            donor.dimensions(),
            mask.dimensions()
        )));
    }

    Ok(RgbImage::from_fn(recipient.width(), recipient.height(), |x, y| {
        let r = recipient.get_pixel(x, y);
        let d = donor.get_pixel(x, y);
        let m = mask.get_pixel(x, y)[0];
        Rgb(std::array::from_fn(|c| {
            let v = r[c] as f32 * (1. - m) + d[c] * m;
            v.round().clamp(0., 255.) as u8
        }))
    }))
}
