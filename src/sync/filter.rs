//! DC-blocking prefilter
//!
//! The spectral estimators never suppress DC on their own. When a capture
//! carries a strong DC term (LO leakage, I/Q offset) this high-pass can be run
//! on the estimation input first.

use biquad::*;
use num::complex::Complex64;
use snafu::ensure;

use crate::error::{FilterSnafu, InvalidParameterSnafu, Result};

/// 2nd-order Butterworth high-pass applied to I and Q independently
///
/// # Arguments
/// * `samples` - Complex baseband samples
/// * `sample_rate` - Sample rate in Hz
/// * `cutoff_hz` - High-pass corner frequency in Hz, below Nyquist
pub fn dc_block(samples: &[Complex64], sample_rate: f64, cutoff_hz: f64) -> Result<Vec<Complex64>> {
    ensure!(
        sample_rate.is_finite() && sample_rate > 0.0,
        InvalidParameterSnafu { name: "sample_rate", value: sample_rate }
    );
    ensure!(
        cutoff_hz.is_finite() && cutoff_hz > 0.0,
        InvalidParameterSnafu { name: "cutoff_hz", value: cutoff_hz }
    );

    let coeffs = Coefficients::<f64>::from_params(
        Type::HighPass,
        sample_rate.hz(),
        cutoff_hz.hz(),
        Q_BUTTERWORTH_F64,
    )
    .map_err(|e| FilterSnafu { reason: format!("{:?}", e) }.build())?;

    let mut re = DirectForm2Transposed::<f64>::new(coeffs);
    let mut im = DirectForm2Transposed::<f64>::new(coeffs);

    Ok(samples
        .iter()
        .map(|s| Complex64::new(re.run(s.re), im.run(s.im)))
        .collect())
}
