//! Spectral peak estimation
//!
//! Finds the dominant frequency of a signal raised to an integer power. Used
//! for both the carrier offset (on `x²`) and the symbol-rate line (on `Re(x)²`).

use core::ops::Range;

use num::complex::Complex64;
use rustfft::FftPlanner;
use snafu::{ensure, OptionExt};

use crate::error::{DegenerateSignalSnafu, InvalidParameterSnafu, Result};

/// DFT sample frequencies in Hz, folded into `[-fs/2, fs/2)`
///
/// Bin `k` maps to `k*fs/n` for the first `ceil(n/2)` bins and to
/// `(k-n)*fs/n` for the rest.
pub fn fft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    let df = sample_rate / n as f64;
    let positive = (n + 1) / 2;
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64 * df
            } else {
                (k as f64 - n as f64) * df
            }
        })
        .collect()
}

/// Frequency of the strongest DFT bin of `x^power`, divided by `power`
///
/// DC is deliberately left in the search: a constant input yields exactly
/// 0 Hz. Callers that need an AC-only estimate should prefilter
/// (see [`super::filter::dc_block`]).
///
/// # Errors
/// `DegenerateSignal` for an empty input or a spectrum with no energy at all,
/// `InvalidParameter` for `power == 0`.
pub fn spectral_peak(x: &[Complex64], sample_rate: f64, power: u32) -> Result<f64> {
    let n = x.len();
    ensure!(power > 0, InvalidParameterSnafu { name: "power", value: 0.0 });
    ensure!(n > 0, DegenerateSignalSnafu { len: n });

    let scale = 1.0 / n as f64;
    let mut buffer: Vec<Complex64> = x.iter().map(|s| s.powu(power) * scale).collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let magnitudes: Vec<f64> = buffer.iter().map(|c| c.norm()).collect();
    let bin = peak_bin(&magnitudes, 0..n).context(DegenerateSignalSnafu { len: n })?;

    let freqs = fft_frequencies(n, sample_rate);
    Ok(freqs[bin] / power as f64)
}

/// Real-valued variant of [`spectral_peak`] restricted to a range of bins
///
/// Returns the frequency of the bin actually found (not an index into the
/// restricted slice), divided by `power`.
///
/// # Errors
/// `DegenerateSignal` when the bin range is empty after clamping to the input
/// length, or every magnitude inside it is zero.
pub fn spectral_peak_real(
    x: &[f64],
    sample_rate: f64,
    power: u32,
    bins: Range<usize>,
) -> Result<f64> {
    let n = x.len();
    ensure!(power > 0, InvalidParameterSnafu { name: "power", value: 0.0 });
    let bins = bins.start.min(n)..bins.end.min(n);
    ensure!(!bins.is_empty(), DegenerateSignalSnafu { len: n });

    let scale = 1.0 / n as f64;
    let mut buffer: Vec<Complex64> = x
        .iter()
        .map(|&v| Complex64::new(v.powi(power as i32) * scale, 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let magnitudes: Vec<f64> = buffer.iter().map(|c| c.norm()).collect();
    let bin = peak_bin(&magnitudes, bins).context(DegenerateSignalSnafu { len: n })?;

    let freqs = fft_frequencies(n, sample_rate);
    Ok(freqs[bin] / power as f64)
}

/// Peaks smaller than this fraction of the strongest bin anywhere in the
/// spectrum (DC included) are rounding noise, not lines.
const PEAK_FLOOR: f64 = 1e-9;

/// Index of the first maximum inside `bins`; `None` if nothing in range rises
/// above the noise floor
fn peak_bin(magnitudes: &[f64], bins: Range<usize>) -> Option<usize> {
    let reference = magnitudes.iter().copied().fold(0.0, f64::max);
    let floor = reference * PEAK_FLOOR;

    let mut best: Option<(usize, f64)> = None;
    for k in bins {
        let m = magnitudes[k];
        match best {
            Some((_, b)) if m <= b => {}
            _ if m > floor && m > 0.0 => best = Some((k, m)),
            _ => {}
        }
    }
    best.map(|(k, _)| k)
}
