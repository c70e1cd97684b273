use crate::error::{Result, SpliceError};

pub const FEATHER_AMOUNT: u32 = 11;
pub const COLOR_CORRECT_BLUR_FRAC: f64 = 0.6;
pub const SCALE_FACTOR: f32 = 1.;

/// Tuning knobs for a single splice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpliceConfig {
    /// Odd gaussian kernel size used to feather face masks
    pub feather: u32,
    /// Fraction of the inter-eye distance used as the colour correction kernel
    pub color_blur_fraction: f64,
    /// Images (and their landmarks) are rescaled by this factor on load
    pub scale_factor: f32,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            feather: FEATHER_AMOUNT,
            color_blur_fraction: COLOR_CORRECT_BLUR_FRAC,
            scale_factor: SCALE_FACTOR,
        }
    }
}

impl SpliceConfig {
    pub fn validate(&self) -> Result<()> {
        validate_kernel(self.feather)?;

        if !(self.color_blur_fraction.is_finite() && self.color_blur_fraction > 0.) {
            return Err(SpliceError::InvalidConfig(format!(
                "color blur fraction must be positive, got {}",
                self.color_blur_fraction
            )));
        }

        if !(self.scale_factor.is_finite() && self.scale_factor > 0.) {
            return Err(SpliceError::InvalidConfig(format!(
                "scale factor must be positive, got {}",
                self.scale_factor
            )));
        }

        Ok(())
    }
}

pub fn validate_kernel(ksize: u32) -> Result<()> {
    if ksize == 0 || ksize % 2 == 0 {
        return Err(SpliceError::InvalidConfig(format!(
            "blur kernel size must be odd, got {ksize}"
        )));
    }
    Ok(())
}

#[test]
fn test_default_is_valid() {
    assert!(SpliceConfig::default().validate().is_ok());
}

#[test]
fn test_rejects_bad_values() {
    let even = SpliceConfig {
        feather: 10,
        ..Default::default()
    };
    assert!(matches!(even.validate(), Err(SpliceError::InvalidConfig(_))));

    let frac = SpliceConfig {
        color_blur_fraction: 0.,
        ..Default::default()
    };
    assert!(frac.validate().is_err());

    let scale = SpliceConfig {
        scale_factor: f32::NAN,
        ..Default::default()
    };
    assert!(scale.validate().is_err());
}
