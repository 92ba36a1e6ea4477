//! Pulse-width measurement
//!
//! Scans a power-vs-time trace (dBm) for pulses: a rising edge is the first
//! sample above a detection level that follows one at or below it, and the
//! falling edge is the first sample below the level after that.
//!
//! **Level**: `max(trace) - threshold_db`, i.e. the threshold is measured
//! down from the strongest sample in the record.
//!
//! Edge searches are bounds-checked and report what they found through
//! [`PulseSearch`]; running off the end of the record is a normal outcome,
//! not an error.

use num::complex::Complex64;
use tracing::debug;

/// Reference impedance for dBm conversion, ohms
pub const IMPEDANCE_OHMS: f64 = 50.0;

/// Rising and falling edge of one pulse, sample indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub rising: usize,
    pub falling: usize,
}

impl Pulse {
    pub fn width_samples(&self) -> usize {
        self.falling - self.rising
    }

    pub fn width_seconds(&self, sample_rate: f64) -> f64 {
        self.width_samples() as f64 / sample_rate
    }
}

/// Outcome of one edge search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseSearch {
    /// Both edges found
    Found(Pulse),
    /// Rising edge at this index, but the record ends while still above the level
    RisingOnly(usize),
    /// No rising edge at or after the start index
    NotFound,
}

/// Summary of all pulses in a record
#[derive(Debug, Clone, PartialEq)]
pub struct PulseReport {
    pub pulses: Vec<Pulse>,
    /// Widths of `pulses`, seconds
    pub widths: Vec<f64>,
    /// Mean of `widths`; `None` when no pulse remains
    pub mean_width: Option<f64>,
}

/// Instantaneous power in dBm: `10·log10(|x|² / (2·R·1mW))`
///
/// The factor 2 converts peak I/Q amplitude to RMS.
pub fn power_dbm(samples: &[Complex64]) -> Vec<f64> {
    samples
        .iter()
        .map(|s| 10.0 * (s.norm_sqr() / (2.0 * IMPEDANCE_OHMS * 1e-3)).log10())
        .collect()
}

/// Find the next pulse starting the search at `start`
pub fn find_pulse(data: &[f64], level: f64, start: usize) -> PulseSearch {
    let Some(&first) = data.get(start) else {
        return PulseSearch::NotFound;
    };

    let mut previous = first;
    let mut rising = None;
    for (i, &v) in data.iter().enumerate().skip(start) {
        if v > level && previous <= level {
            rising = Some(i);
            break;
        }
        previous = v;
    }
    let Some(rising) = rising else {
        return PulseSearch::NotFound;
    };

    let mut previous = data[rising];
    for (j, &v) in data.iter().enumerate().skip(rising) {
        if v < level && previous >= level {
            return PulseSearch::Found(Pulse { rising, falling: j });
        }
        previous = v;
    }

    PulseSearch::RisingOnly(rising)
}

/// Measure every complete pulse in a dBm trace
///
/// # Arguments
/// * `data` - Power trace in dBm
/// * `threshold_db` - Detection level below the trace maximum
/// * `sample_rate` - Sample rate in Hz
/// * `trim_outliers` - Drop the first and last pulse (often clipped by the
///   record boundaries)
pub fn measure_pulses(
    data: &[f64],
    threshold_db: f64,
    sample_rate: f64,
    trim_outliers: bool,
) -> PulseReport {
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let level = max - threshold_db;

    let mut pulses = Vec::new();
    let mut cursor = 0;
    while let PulseSearch::Found(pulse) = find_pulse(data, level, cursor) {
        pulses.push(pulse);
        cursor = pulse.falling;
    }

    if trim_outliers {
        if pulses.len() <= 2 {
            debug!(found = pulses.len(), "too few pulses to trim");
            pulses.clear();
        } else {
            pulses.remove(0);
            pulses.pop();
        }
    }

    let widths: Vec<f64> = pulses.iter().map(|p| p.width_seconds(sample_rate)).collect();
    let mean_width = if widths.is_empty() {
        None
    } else {
        Some(widths.iter().sum::<f64>() / widths.len() as f64)
    };
    debug!(pulses = pulses.len(), level, mean_width = ?mean_width, "pulse widths");

    PulseReport { pulses, widths, mean_width }
}
