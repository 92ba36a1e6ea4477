//! Error taxonomy for the synchronization core
//!
//! Every stage reports failures close to where they originate and hands them
//! straight back to its caller. Nothing here is retried.

use snafu::Snafu;

#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum SyncError {
    /// Spectral estimation found nothing to lock onto (empty input or no energy)
    #[snafu(display("degenerate signal: no spectral peak in {len} samples"))]
    DegenerateSignal { len: usize },

    /// A denominator that must be non-zero was exactly zero
    #[snafu(display("division by zero while computing {quantity}"))]
    DivisionByZero { quantity: &'static str },

    /// Clock recovery needs at least two rising zero crossings
    #[snafu(display("insufficient zero crossings: found {found}, need at least 2"))]
    InsufficientCrossings { found: usize },

    /// Nothing left to schedule once the decision grid was aligned
    #[snafu(display(
        "clock recovery failed: {available} samples cannot hold a {samples_per_symbol}-sample symbol"
    ))]
    ClockRecoveryFailure {
        samples_per_symbol: usize,
        available: usize,
    },

    /// A derived index landed outside the sample buffer
    #[snafu(display("index {index} out of range for {len} samples"))]
    IndexOutOfRange { index: usize, len: usize },

    /// Samples and timestamps must pair up 1:1
    #[snafu(display("length mismatch: {samples} samples but {times} timestamps"))]
    LengthMismatch { samples: usize, times: usize },

    #[snafu(display("invalid parameter {name}: {value}"))]
    InvalidParameter { name: &'static str, value: f64 },

    #[snafu(display("filter design failed: {reason}"))]
    Filter { reason: String },
}

pub type Result<T, E = SyncError> = core::result::Result<T, E>;
