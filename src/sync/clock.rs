//! Symbol clock recovery
//!
//! Two independent estimates of the symbol clock from a real waveform:
//! - the FFT peak of `data²` outside DC (diagnostic only)
//! - the shortest spacing between rising zero crossings, halved
//!
//! A missed transition only ever lengthens a crossing period, so the minimum
//! spacing is a floor on two symbol lengths. That integer estimate is the one
//! the scheduler uses.

use snafu::ensure;
use tracing::{debug, instrument};

use super::fft::spectral_peak_real;
use crate::error::{ClockRecoveryFailureSnafu, InsufficientCrossingsSnafu, Result};

/// Clock estimates for one waveform
#[derive(Debug, Clone, PartialEq)]
pub struct ClockEstimate {
    /// Symbol-rate line from the squared waveform, Hz
    pub spectral_rate_hz: Option<f64>,
    /// Rising zero crossings the estimate was derived from
    pub crossings: Vec<usize>,
    /// Shortest distance between consecutive crossings, samples
    pub min_period: usize,
    /// `min_period / 2`, rounded half-to-even
    pub samples_per_symbol: usize,
}

/// Indices `i` where `data[i] <= 0` and `data[i + 1] > 0`
///
/// The sample before the crossing is recorded.
pub fn zero_crossings(data: &[f64]) -> Vec<usize> {
    data.windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] <= 0.0 && w[1] > 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Estimate the symbol clock of a (phase-corrected) real waveform
///
/// # Arguments
/// * `data` - Real waveform, typically `Re(x_pc)`
/// * `sample_rate` - Sample rate in Hz
/// * `power` - Exponent for the spectral estimate (2)
///
/// # Errors
/// * `InsufficientCrossings` - fewer than two rising crossings
/// * `ClockRecoveryFailure` - the rounded symbol length came out as zero
#[instrument(skip(data), fields(n = data.len()))]
pub fn estimate_clock(data: &[f64], sample_rate: f64, power: u32) -> Result<ClockEstimate> {
    // DC and the first bin are skipped, as is the last bin (wraps onto DC)
    let n = data.len();
    let spectral_rate_hz = match spectral_peak_real(data, sample_rate, power, 2..n.saturating_sub(1)) {
        Ok(f) => Some(f.abs()),
        Err(e) => {
            debug!(error = %e, "no spectral clock line");
            None
        }
    };

    let crossings = zero_crossings(data);
    ensure!(
        crossings.len() >= 2,
        InsufficientCrossingsSnafu { found: crossings.len() }
    );

    let min_period = crossings
        .windows(2)
        .map(|w| w[1] - w[0])
        .min()
        .unwrap_or(0);

    let samples_per_symbol = (min_period as f64 / 2.0).round_ties_even() as usize;
    ensure!(
        samples_per_symbol > 0,
        ClockRecoveryFailureSnafu { samples_per_symbol, available: n }
    );

    debug!(
        crossings = crossings.len(),
        min_period,
        samples_per_symbol,
        spectral_rate_hz = ?spectral_rate_hz,
        "clock estimate"
    );

    Ok(ClockEstimate {
        spectral_rate_hz,
        crossings,
        min_period,
        samples_per_symbol,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn test_zero_crossings_rising_only() {
        let data = [1.0, -1.0, -0.5, 0.5, 1.0, -1.0, 0.0, 2.0];
        assert_eq!(zero_crossings(&data), vec![2, 6]);
    }

    #[test]
    fn test_zero_crossings_zero_counts_as_non_positive() {
        let data = [0.0, 0.0, 1.0];
        assert_eq!(zero_crossings(&data), vec![1]);
    }

    #[test]
    fn test_zero_crossings_none() {
        assert!(zero_crossings(&[1.0, 2.0, 3.0]).is_empty());
        assert!(zero_crossings(&[]).is_empty());
        assert!(zero_crossings(&[-1.0]).is_empty());
    }

    #[test]
    fn test_zero_crossings_dense_sine() {
        let fs = 100_000.0;
        let f = 1000.0;
        let duration = 0.1;
        let n = (fs * duration) as usize;
        let data: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * f * i as f64 / fs).sin())
            .collect();

        let zc = zero_crossings(&data);
        let expected = (duration * f).floor() as i64;
        assert!((zc.len() as i64 - expected).abs() <= 1, "count {}", zc.len());

        let period = fs / f;
        for w in zc.windows(2) {
            let d = (w[1] - w[0]) as f64;
            assert!((d - period).abs() <= 1.0, "spacing {}", d);
        }
    }

    #[test]
    fn test_estimate_clock_square_wave() {
        // 40-sample half periods: rising crossings every 80 samples
        let data: Vec<f64> = (0..800)
            .map(|i| if (i / 40) % 2 == 0 { -1.0 } else { 1.0 })
            .collect();

        let clock = estimate_clock(&data, 8000.0, 2).unwrap();
        assert_eq!(clock.min_period, 80);
        assert_eq!(clock.samples_per_symbol, 40);
        assert_eq!(clock.crossings.len(), 10);
        // Squared, a noise-free ±1 wave is flat: no clock line to report
        assert_eq!(clock.spectral_rate_hz, None);
    }

    #[test]
    fn test_spectral_rate_of_sine() {
        // sin² has its line at 2f; halving reports f
        let fs = 100_000.0;
        let f = 1000.0;
        let data: Vec<f64> = (0..10_000)
            .map(|i| (2.0 * PI * f * i as f64 / fs).sin())
            .collect();

        let clock = estimate_clock(&data, fs, 2).unwrap();
        assert_eq!(clock.spectral_rate_hz, Some(f));
    }

    #[test]
    fn test_estimate_clock_uses_minimum_period() {
        // A long run of ones stretches one period; the short one wins
        let mut data = Vec::new();
        for run in [(-1.0, 10), (1.0, 10), (-1.0, 10), (1.0, 30), (-1.0, 10), (1.0, 10)] {
            data.extend(std::iter::repeat(run.0).take(run.1));
        }

        let clock = estimate_clock(&data, 1.0, 2).unwrap();
        assert_eq!(clock.crossings, vec![9, 29, 69]);
        assert_eq!(clock.min_period, 20);
        assert_eq!(clock.samples_per_symbol, 10);
    }

    #[test]
    fn test_estimate_clock_rounds_half_to_even() {
        // Crossings 21 apart: 10.5 rounds to 10
        let mut data = vec![-1.0; 60];
        data[11..21].fill(1.0);
        data[32..42].fill(1.0);

        let clock = estimate_clock(&data, 1.0, 2).unwrap();
        assert_eq!(clock.min_period, 21);
        assert_eq!(clock.samples_per_symbol, 10);
    }

    #[test]
    fn test_estimate_clock_insufficient_crossings() {
        let data = [-1.0, 1.0, 1.0, 1.0];
        assert_eq!(
            estimate_clock(&data, 1.0, 2),
            Err(crate::error::SyncError::InsufficientCrossings { found: 1 })
        );
    }

    #[test]
    fn test_estimate_clock_positive_for_three_crossings() {
        let data = [-1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0];
        let clock = estimate_clock(&data, 1.0, 2).unwrap();
        assert_eq!(clock.crossings.len(), 3);
        assert!(clock.samples_per_symbol > 0);
    }
}
