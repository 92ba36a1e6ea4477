//! Batch synchronization pipeline
//!
//! ```text
//! raw I/Q ─► carrier frequency ─► carrier phase ─► Re(·) ─► clock ─► timing
//! ```
//!
//! Each stage consumes the previous stage's output and returns new buffers;
//! the caller's capture is never modified. The first failing stage aborts
//! the run and its error is returned unchanged.

use num::complex::Complex64;
use snafu::{ensure, ResultExt, Snafu};
use tracing::{info, instrument};

use crate::acquire::{AcquireError, IqSource};
use crate::error::{DegenerateSignalSnafu, InvalidParameterSnafu, Result, SyncError};
use crate::sync::carrier::remove_frequency_offset;
use crate::sync::{
    correct_frequency, correct_phase, dc_block, estimate_carrier_offset, estimate_clock,
    sample_decisions, schedule, ClockEstimate, EyeDiagram, FrequencyCorrection, PhaseCorrection,
    SymbolTiming, TimeBase, BPSK_POWER, DEFAULT_THRESHOLD_FRACTION,
};

/// Pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Exponent that strips the modulation before the carrier FFT
    pub carrier_power: u32,
    /// Exponent applied to the baseband before the clock FFT
    pub clock_power: u32,
    /// Eye-mask level as a fraction of the waveform peak and trough
    pub threshold_fraction: f64,
    /// High-pass corner applied to the carrier-estimation input only (Hz)
    pub dc_block_hz: Option<f64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            carrier_power: BPSK_POWER,
            clock_power: BPSK_POWER,
            threshold_fraction: DEFAULT_THRESHOLD_FRACTION,
            dc_block_hz: None,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.carrier_power > 0,
            InvalidParameterSnafu { name: "carrier_power", value: self.carrier_power as f64 }
        );
        ensure!(
            self.clock_power > 0,
            InvalidParameterSnafu { name: "clock_power", value: self.clock_power as f64 }
        );
        ensure!(
            self.threshold_fraction.is_finite() && self.threshold_fraction >= 0.0,
            InvalidParameterSnafu { name: "threshold_fraction", value: self.threshold_fraction }
        );
        Ok(())
    }
}

/// Everything the pipeline learned about one capture
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub carrier: FrequencyCorrection,
    pub phase: PhaseCorrection,
    pub clock: ClockEstimate,
    pub timing: SymbolTiming,
    /// `Re` of the phase-corrected samples
    pub baseband: Vec<f64>,
}

impl SyncReport {
    pub fn eye_diagram(&self) -> Result<EyeDiagram<'_>> {
        EyeDiagram::new(&self.baseband, &self.timing)
    }

    /// Baseband amplitude at each decision instant
    pub fn decision_values(&self) -> Result<Vec<f64>> {
        sample_decisions(&self.baseband, &self.timing)
    }

    /// Hard decisions, `true` for a positive amplitude
    pub fn symbols(&self) -> Result<Vec<bool>> {
        Ok(self.decision_values()?.into_iter().map(|v| v > 0.0).collect())
    }

    /// Phase-corrected complex samples
    pub fn corrected(&self) -> &[Complex64] {
        &self.phase.samples
    }
}

#[derive(Debug, Snafu)]
pub enum PipelineError {
    #[snafu(display("acquisition failed: {source}"))]
    Acquire { source: AcquireError },

    #[snafu(display("synchronization failed: {source}"))]
    Sync { source: SyncError },
}

/// Run every stage over one capture
///
/// # Arguments
/// * `samples` - Complex baseband capture
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Pipeline settings
///
/// # Errors
/// The first stage error, unchanged. An empty capture is `DegenerateSignal`.
#[instrument(skip(samples, config), fields(n = samples.len()))]
pub fn synchronize(samples: &[Complex64], sample_rate: f64, config: &SyncConfig) -> Result<SyncReport> {
    config.validate()?;
    ensure!(
        sample_rate.is_finite() && sample_rate > 0.0,
        InvalidParameterSnafu { name: "sample_rate", value: sample_rate }
    );
    ensure!(!samples.is_empty(), DegenerateSignalSnafu { len: 0usize });

    let time = TimeBase::new(samples.len(), sample_rate);

    let carrier = match config.dc_block_hz {
        Some(cutoff_hz) => {
            let filtered = dc_block(samples, sample_rate, cutoff_hz)?;
            let offset_hz = estimate_carrier_offset(&filtered, sample_rate, config.carrier_power)?;
            info!(offset_hz, cutoff_hz, "carrier offset (DC-blocked estimate)");
            FrequencyCorrection {
                offset_hz,
                samples: remove_frequency_offset(samples, &time, offset_hz)?,
            }
        }
        None => correct_frequency(samples, &time, sample_rate, config.carrier_power)?,
    };

    let phase = correct_phase(&carrier.samples, &time)?;
    let baseband: Vec<f64> = phase.samples.iter().map(|s| s.re).collect();

    let clock = estimate_clock(&baseband, sample_rate, config.clock_power)?;
    let timing = schedule(
        &baseband,
        clock.samples_per_symbol,
        &clock.crossings,
        config.threshold_fraction,
    )?;

    info!(
        offset_hz = carrier.offset_hz,
        phase_deg = phase.mean_phase_error_deg(),
        samples_per_symbol = timing.samples_per_symbol,
        symbols = timing.num_symbols(),
        "synchronized"
    );

    Ok(SyncReport {
        carrier,
        phase,
        clock,
        timing,
        baseband,
    })
}

/// Acquire `num_samples` from `source` and synchronize them
pub fn synchronize_source<S: IqSource + ?Sized>(
    source: &mut S,
    num_samples: usize,
    config: &SyncConfig,
) -> core::result::Result<SyncReport, PipelineError> {
    let capture = source.acquire(num_samples).context(AcquireSnafu)?;
    synchronize(&capture.samples, capture.sample_rate, config).context(SyncSnafu)
}
