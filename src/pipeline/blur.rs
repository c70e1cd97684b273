use crate::config::validate_kernel;
use crate::error::Result;
use image::Pixel;
use imageproc::definitions::{Clamp, Image};
use imageproc::filter::separable_filter_equal;

/// Sigma for a kernel of `ksize` taps when none is given explicitly.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.) * 0.5 - 1.) + 0.8
}

/// Normalised 1D gaussian with exactly `ksize` taps.
pub fn gaussian_kernel(ksize: u32) -> Result<Vec<f32>> {
    validate_kernel(ksize)?;

    let sigma = sigma_for_kernel(ksize);
    let center = (ksize / 2) as f32;
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2. * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    Ok(kernel)
}

/// Gaussian blur with a fixed, odd `ksize` x `ksize` kernel. Edges repeat.
pub fn gaussian_blur<P>(image: &Image<P>, ksize: u32) -> Result<Image<P>>
where
    P: Pixel,
    <P as Pixel>::Subpixel: Into<f32> + Clamp<f32>,
{
    if ksize == 1 {
        return Ok(image.clone());
    }

    let kernel = gaussian_kernel(ksize)?;
    Ok(separable_filter_equal(image, &kernel))
}
