use super::align::SimilarityTransform;
use crate::error::{Result, SpliceError};
use image::{GenericImage, Pixel};
use imageproc::definitions::{Clamp, Image};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{Level, span};

/// Resamples `image` into a `(width, height)` canvas, placing each source
/// pixel where `transform` sends it. Output pixels whose source location lies
/// outside `image` stay zero.
pub fn warp<P>(
    image: &Image<P>,
    transform: &SimilarityTransform,
    (width, height): (u32, u32),
) -> Result<Image<P>>
where
    P: Pixel + Send + Sync,
    <P as Pixel>::Subpixel: Send + Sync + Into<f32> + Clamp<f32>,
{
    let span = span!(Level::DEBUG, "warp");
    let _guard = span.enter();

    if width == 0 || height == 0 {
        return Err(SpliceError::ShapeMismatch(format!(
            "cannot warp into a {width}x{height} canvas"
        )));
    }

    let mut out = Image::<P>::new(width, height);
    if image.width() == 0 || image.height() == 0 {
        return Ok(out);
    }
    let background = *out.get_pixel(0, 0);

    // Bilinear sampling skips the last row and column of its input, so give
    // the source a one pixel zero border and shift the projection to match.
    let mut padded = Image::<P>::new(image.width() + 2, image.height() + 2);
    padded
        .copy_from(image, 1, 1)
        .map_err(|e| SpliceError::ShapeMismatch(e.to_string()))?;

    let projection = Projection::translate(-1., -1.).and_then(transform.projection()?);
    warp_into(
        &padded,
        &projection,
        Interpolation::Bilinear,
        background,
        &mut out,
    );

    Ok(out)
}
