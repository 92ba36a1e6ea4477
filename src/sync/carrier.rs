//! Carrier recovery
//!
//! Two passes over a BPSK capture:
//! 1. **Frequency**: the FFT peak of `x²` sits at twice the carrier offset;
//!    the offset is removed with a counter-rotating phasor.
//! 2. **Phase**: each frequency-corrected sample gets its own mod-π phase
//!    estimate (the ±180° symbol flips cancel). The unwrapped trace is
//!    regressed against time to expose any slow residual frequency, then
//!    removed point by point.

use core::f64::consts::PI;

use num::complex::Complex64;
use snafu::ensure;
use tracing::{debug, info, instrument};

use super::fft::spectral_peak;
use super::TimeBase;
use crate::error::{DivisionByZeroSnafu, Result};

/// Output of the coarse frequency pass
#[derive(Debug, Clone)]
pub struct FrequencyCorrection {
    /// Estimated carrier offset in Hz
    pub offset_hz: f64,
    /// `x[n] * exp(-j·2π·offset·t[n])`
    pub samples: Vec<Complex64>,
}

/// Least-squares fit of unwrapped phase (degrees) against time (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseRegression {
    /// Degrees per second
    pub slope: f64,
    /// Degrees at t = 0
    pub intercept: f64,
    /// Pearson correlation; 0 when either variable has no variance
    pub r: f64,
}

/// Output of the fine phase pass
#[derive(Debug, Clone)]
pub struct PhaseCorrection {
    /// Unwrapped per-sample phase error in radians
    pub phase_error: Vec<f64>,
    pub regression: PhaseRegression,
    /// Regression slope normalised by the final timestamp
    pub fine_frequency_offset: f64,
    /// Mean of `phase_error` in radians
    pub mean_phase_error: f64,
    /// `x_fc[n] * exp(-j·phase_error[n])`
    pub samples: Vec<Complex64>,
}

impl PhaseCorrection {
    pub fn mean_phase_error_deg(&self) -> f64 {
        self.mean_phase_error.to_degrees()
    }
}

/// Coarse carrier offset in Hz: spectral peak of `x^power`, divided by `power`
pub fn estimate_carrier_offset(x: &[Complex64], sample_rate: f64, power: u32) -> Result<f64> {
    spectral_peak(x, sample_rate, power)
}

/// Rotate every sample by `-2π·offset_hz·t[n]`
pub fn remove_frequency_offset(
    x: &[Complex64],
    time: &TimeBase,
    offset_hz: f64,
) -> Result<Vec<Complex64>> {
    time.check_len(x.len())?;

    let w = -2.0 * PI * offset_hz;
    Ok(x
        .iter()
        .zip(time.as_slice())
        .map(|(&s, &t)| s * Complex64::cis(w * t))
        .collect())
}

/// Estimate and remove a constant carrier frequency offset
///
/// # Arguments
/// * `x` - Complex baseband capture
/// * `time` - Time base paired with `x`
/// * `sample_rate` - Sample rate in Hz
/// * `power` - Modulation-stripping exponent (2 for BPSK)
///
/// # Returns
/// The corrected samples and the offset that was removed. A constant capture
/// has all of its energy at DC and is reported as a 0 Hz offset.
#[instrument(skip(x, time), fields(n = x.len()))]
pub fn correct_frequency(
    x: &[Complex64],
    time: &TimeBase,
    sample_rate: f64,
    power: u32,
) -> Result<FrequencyCorrection> {
    time.check_len(x.len())?;

    let offset_hz = estimate_carrier_offset(x, sample_rate, power)?;
    info!(offset_hz, "carrier offset");

    let samples = remove_frequency_offset(x, time, offset_hz)?;
    Ok(FrequencyCorrection { offset_hz, samples })
}

/// Per-sample mod-π phase error, unwrapped
///
/// Each sample is rotated by π first so a constellation straddling 0°/180°
/// is centred before the angle is taken. The angle itself is
/// `0.5·atan2(Im(y²), Re(y²))`, which matches `arctan(Im(y)/Re(y))` wherever
/// `Re(y) != 0` and stays defined on the imaginary axis. Under this detector
/// the π rotation is a zero offset.
///
/// Unwrapping is done on the doubled angle with the usual 2π rule, then
/// halved.
pub fn phase_error_trace(x: &[Complex64]) -> Vec<f64> {
    let rotation = Complex64::cis(PI);
    let doubled: Vec<f64> = x
        .iter()
        .map(|&s| {
            let y = s * rotation;
            (y * y).arg()
        })
        .collect();

    unwrap_phase(&doubled).into_iter().map(|p| 0.5 * p).collect()
}

/// Estimate and remove the residual phase error sample by sample
///
/// # Errors
/// `DivisionByZero` when fewer than two samples (zero time variance) make the
/// regression undefined.
#[instrument(skip(x, time), fields(n = x.len()))]
pub fn correct_phase(x: &[Complex64], time: &TimeBase) -> Result<PhaseCorrection> {
    time.check_len(x.len())?;
    ensure!(x.len() >= 2, DivisionByZeroSnafu { quantity: "phase regression" });

    let phase_error = phase_error_trace(x);
    let degrees: Vec<f64> = phase_error.iter().map(|p| p.to_degrees()).collect();
    let regression = linear_regression(time.as_slice(), &degrees)?;

    // check_len + the length guard above make last() > 0
    let t_end = time.last().unwrap_or(1.0);
    let fine_frequency_offset = regression.slope / t_end;
    debug!(
        slope = regression.slope,
        intercept = regression.intercept,
        r = regression.r,
        "secondary frequency offset"
    );

    let mean_phase_error = phase_error.iter().sum::<f64>() / phase_error.len() as f64;
    info!(
        radians = mean_phase_error,
        degrees = mean_phase_error.to_degrees(),
        "average correction phase"
    );

    let samples = x
        .iter()
        .zip(&phase_error)
        .map(|(&s, &p)| s * Complex64::cis(-p))
        .collect();

    Ok(PhaseCorrection {
        phase_error,
        regression,
        fine_frequency_offset,
        mean_phase_error,
        samples,
    })
}

/// Remove 2π jumps: any step of at least π is folded back into (-π, π]
fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase.len());
    let mut correction = 0.0;
    let mut prev: Option<f64> = None;

    for &p in phase {
        if let Some(q) = prev {
            let dd = p - q;
            if dd.abs() >= PI {
                let mut ddmod = (dd + PI).rem_euclid(2.0 * PI) - PI;
                if ddmod == -PI && dd > 0.0 {
                    ddmod = PI;
                }
                correction += ddmod - dd;
            }
        }
        out.push(p + correction);
        prev = Some(p);
    }

    out
}

fn linear_regression(x: &[f64], y: &[f64]) -> Result<PhaseRegression> {
    let n = x.len().min(y.len());
    ensure!(n >= 2, DivisionByZeroSnafu { quantity: "regression mean" });

    let mx = x[..n].iter().sum::<f64>() / n as f64;
    let my = y[..n].iter().sum::<f64>() / n as f64;

    let mut ssx = 0.0;
    let mut ssy = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        ssx += dx * dx;
        ssy += dy * dy;
        sxy += dx * dy;
    }
    ensure!(ssx > 0.0, DivisionByZeroSnafu { quantity: "regression slope" });

    let slope = sxy / ssx;
    let intercept = my - slope * mx;
    let den = (ssx * ssy).sqrt();
    let r = if den == 0.0 { 0.0 } else { (sxy / den).clamp(-1.0, 1.0) };

    Ok(PhaseRegression { slope, intercept, r })
}
