pub mod acquire;
pub mod error;
pub mod pipeline;
pub mod pll;
pub mod pulse;
pub mod simulation;
pub mod sync;
pub mod tracing_init;

pub use acquire::{write_iq_wav, IqCapture, IqSource, WavIqSource};
pub use error::{Result, SyncError};
pub use pipeline::{synchronize, synchronize_source, PipelineError, SyncConfig, SyncReport};
pub use pll::DigitalPll;
