//! BPSK Carrier and Symbol Synchronization
//!
//! This module recovers carrier and symbol-clock parameters from one batch of
//! complex baseband samples.
//!
//! **Algorithm**:
//! 1. Square the capture to collapse the BPSK ±180° ambiguity and take the
//!    FFT peak as the coarse carrier offset
//! 2. Remove the offset, then track the residual phase sample by sample
//!    (mod-π detector, unwrapped, regressed against time)
//! 3. Find rising zero crossings of the real part; the shortest spacing
//!    between them is two symbols
//! 4. Lock a decision grid to the bulk of the crossings and sample each
//!    symbol mid-way
//!
//! **Ordering**: frequency correction → phase correction → clock estimate →
//! timing schedule. Each stage is a pure function returning new buffers.
//!
//! **Module Organization**:
//! - `fft` - FFT bin frequencies and spectral peak search
//! - `carrier` - Carrier frequency and phase correction
//! - `clock` - Zero-crossing detection and clock rate estimation
//! - `timing` - Decision-instant scheduling and eye diagram
//! - `filter` - DC-blocking prefilter for spectral estimates

pub mod fft;
pub mod carrier;
pub mod clock;
pub mod timing;
pub mod filter;

pub use fft::{fft_frequencies, spectral_peak, spectral_peak_real};
pub use carrier::{
    correct_frequency, correct_phase, estimate_carrier_offset, phase_error_trace,
    FrequencyCorrection, PhaseCorrection, PhaseRegression,
};
pub use clock::{estimate_clock, zero_crossings, ClockEstimate};
pub use timing::{sample_decisions, schedule, EyeDiagram, SymbolTiming};
pub use filter::dc_block;

use crate::error::{LengthMismatchSnafu, Result};
use snafu::ensure;

/// Exponent that strips BPSK modulation from the carrier (x² has a pure line at 2·f)
pub const BPSK_POWER: u32 = 2;

/// Fraction of peak/trough amplitude used for the eye-mask thresholds
pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.4;

/// Sample timestamps for one capture: `t[n] = n / sample_rate`
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBase {
    times: Vec<f64>,
    sample_rate: f64,
}

impl TimeBase {
    pub fn new(len: usize, sample_rate: f64) -> Self {
        let dt = 1.0 / sample_rate;
        Self {
            times: (0..len).map(|n| n as f64 * dt).collect(),
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    /// Final timestamp, `(N-1) / sample_rate`
    pub fn last(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Fail unless this time base pairs 1:1 with `samples` entries
    pub(crate) fn check_len(&self, samples: usize) -> Result<()> {
        ensure!(
            samples == self.times.len(),
            LengthMismatchSnafu { samples, times: self.times.len() }
        );
        Ok(())
    }
}
