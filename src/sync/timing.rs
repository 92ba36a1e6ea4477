//! Symbol timing and eye diagram
//!
//! Places one decision instant per symbol, half a symbol after the boundary
//! implied by the zero crossings. The second crossing anchors the grid (the
//! first is often a capture-edge artifact), and the anchor is pulled onto the
//! median crossing phase so a single noisy crossing cannot skew the grid.

use snafu::{ensure, OptionExt};
use tracing::{debug, instrument, warn};

use crate::error::{
    ClockRecoveryFailureSnafu, IndexOutOfRangeSnafu, InsufficientCrossingsSnafu, Result,
};

/// Decision grid for one waveform
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTiming {
    pub samples_per_symbol: usize,
    /// Offset of the decision instant inside a symbol, `samples_per_symbol / 2`
    pub decision_offset: usize,
    /// First sample of the first whole symbol (origin of the eye diagram)
    pub start: usize,
    /// Absolute sample indices of the decision instants
    pub decision_indices: Vec<usize>,
    /// Eye-mask level above zero
    pub upper_threshold: f64,
    /// Eye-mask level below zero
    pub lower_threshold: f64,
    /// Crossings at or after `start`, relative to `start`
    pub relative_crossings: Vec<usize>,
}

impl SymbolTiming {
    pub fn num_symbols(&self) -> usize {
        self.decision_indices.len()
    }
}

/// Build the decision grid
///
/// # Arguments
/// * `data` - Real, phase-corrected waveform
/// * `samples_per_symbol` - Recovered symbol length
/// * `crossings` - Rising zero crossings of `data`
/// * `threshold_fraction` - Eye-mask level as a fraction of peak and trough
///
/// # Errors
/// * `InsufficientCrossings` - fewer than two crossings to anchor on
/// * `IndexOutOfRange` - a crossing or decision index lies outside `data`
/// * `ClockRecoveryFailure` - no whole symbol fits after alignment
#[instrument(skip(data, crossings), fields(n = data.len(), crossings = crossings.len()))]
pub fn schedule(
    data: &[f64],
    samples_per_symbol: usize,
    crossings: &[usize],
    threshold_fraction: f64,
) -> Result<SymbolTiming> {
    let n = data.len();
    let sps = samples_per_symbol;
    ensure!(sps > 0, ClockRecoveryFailureSnafu { samples_per_symbol: sps, available: n });
    ensure!(
        crossings.len() >= 2,
        InsufficientCrossingsSnafu { found: crossings.len() }
    );
    if let Some(&bad) = crossings.iter().find(|&&c| c >= n) {
        return IndexOutOfRangeSnafu { index: bad, len: n }.fail();
    }

    let decision_offset = sps / 2;

    // Lock the anchor onto the median crossing phase
    let anchor = crossings[1] as i64;
    let shift = median_phase(crossings, anchor, sps as i64);
    let mut start = anchor + shift + 1;
    while start < 0 {
        start += sps as i64;
    }
    let start = start as usize;
    debug!(anchor, shift, start, "decision grid origin");

    let available = n.saturating_sub(start);
    let num_symbols = available / sps;
    ensure!(
        num_symbols > 0,
        ClockRecoveryFailureSnafu { samples_per_symbol: sps, available }
    );

    let decision_indices: Vec<usize> = (0..num_symbols)
        .map(|k| start + decision_offset + k * sps)
        .collect();
    if let Some(&bad) = decision_indices.iter().find(|&&i| i >= n) {
        return IndexOutOfRangeSnafu { index: bad, len: n }.fail();
    }

    let window = &data[start..];
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);

    let relative_crossings = crossings
        .iter()
        .filter(|&&c| c >= start)
        .map(|&c| c - start)
        .collect();

    debug!(decision_offset, samples_per_symbol = sps, num_symbols, "symbol timing");

    Ok(SymbolTiming {
        samples_per_symbol: sps,
        decision_offset,
        start,
        decision_indices,
        upper_threshold: max * threshold_fraction,
        lower_threshold: min * threshold_fraction,
        relative_crossings,
    })
}

/// Median crossing phase relative to `anchor`, wrapped to (-sps/2, sps/2]
fn median_phase(crossings: &[usize], anchor: i64, sps: i64) -> i64 {
    let mut phases: Vec<i64> = crossings
        .iter()
        .map(|&c| {
            let d = (c as i64 - anchor).rem_euclid(sps);
            if 2 * d > sps { d - sps } else { d }
        })
        .collect();
    phases.sort_unstable();

    let mid = phases.len() / 2;
    let median = if phases.len() % 2 == 0 {
        (phases[mid - 1] + phases[mid]) as f64 / 2.0
    } else {
        phases[mid] as f64
    };
    median.round() as i64
}

/// Waveform amplitudes at each decision instant
///
/// # Errors
/// `IndexOutOfRange` if `data` is shorter than the waveform the timing was
/// computed on.
pub fn sample_decisions(data: &[f64], timing: &SymbolTiming) -> Result<Vec<f64>> {
    timing
        .decision_indices
        .iter()
        .map(|&index| {
            data.get(index)
                .copied()
                .context(IndexOutOfRangeSnafu { index, len: data.len() })
        })
        .collect()
}

/// Read-only eye-diagram view: the waveform from `start`, folded into
/// symbol-wide segments
#[derive(Debug, Clone, Copy)]
pub struct EyeDiagram<'a> {
    data: &'a [f64],
    samples_per_symbol: usize,
    decision_offset: usize,
}

impl<'a> EyeDiagram<'a> {
    pub fn new(data: &'a [f64], timing: &SymbolTiming) -> Result<Self> {
        ensure!(
            timing.samples_per_symbol > 0,
            ClockRecoveryFailureSnafu { samples_per_symbol: 0usize, available: data.len() }
        );
        ensure!(
            timing.start <= data.len(),
            IndexOutOfRangeSnafu { index: timing.start, len: data.len() }
        );
        Ok(Self {
            data: &data[timing.start..],
            samples_per_symbol: timing.samples_per_symbol,
            decision_offset: timing.decision_offset,
        })
    }

    /// Symbol-wide segments; a trailing partial symbol is dropped.
    ///
    /// Each call starts a fresh pass over the same data.
    pub fn segments(&self) -> std::slice::ChunksExact<'a, f64> {
        self.data.chunks_exact(self.samples_per_symbol)
    }

    pub fn segment(&self, index: usize) -> Option<&'a [f64]> {
        let from = index * self.samples_per_symbol;
        self.data.get(from..from + self.samples_per_symbol)
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.samples_per_symbol
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Position of the decision instant inside every segment
    pub fn decision_phase(&self) -> usize {
        self.decision_offset
    }

    /// Segments whose decision sample falls inside the (lower, upper) mask
    pub fn mask_violations(&self, upper: f64, lower: f64) -> usize {
        let count = self
            .segments()
            .filter(|seg| {
                let v = seg[self.decision_offset];
                v < upper && v > lower
            })
            .count();
        if count > 0 {
            warn!(count, "eye mask violations");
        }
        count
    }
}
