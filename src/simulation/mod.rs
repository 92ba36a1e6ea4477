//! Synthetic captures for tests, benchmarks and the `iqsim` tool

pub mod bpsk;
pub mod noise;

pub use bpsk::{random_symbols, symbols_with_preamble, BpskScenario};
pub use noise::{add_awgn, rms};

use num::complex::Complex64;
use snafu::ensure;

use crate::acquire::{AcquireError, EmptyCaptureSnafu, IqCapture, IqSource};
use crate::error::Result;

pub const PREAMBLE_SYMBOLS: usize = 8;

/// Serves a pre-generated capture through the [`IqSource`] boundary
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    samples: Vec<Complex64>,
    sample_rate: f64,
    position: usize,
}

impl SimulatedSource {
    pub fn new(samples: Vec<Complex64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            position: 0,
        }
    }

    /// Random BPSK for `scenario` behind an 8-symbol alternating preamble,
    /// optionally with AWGN at `snr_db`
    pub fn from_scenario(scenario: &BpskScenario, snr_db: Option<f64>, seed: u64) -> Result<Self> {
        let symbols = symbols_with_preamble(scenario.num_symbols().max(1), PREAMBLE_SYMBOLS, seed);
        let mut samples = scenario.generate(&symbols)?;
        if let Some(snr_db) = snr_db {
            samples = add_awgn(&samples, snr_db, seed.wrapping_add(1))?;
        }
        Ok(Self::new(samples, scenario.sample_rate))
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl IqSource for SimulatedSource {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn acquire(&mut self, num_samples: usize) -> core::result::Result<IqCapture, AcquireError> {
        let end = self.position.saturating_add(num_samples).min(self.samples.len());
        ensure!(end > self.position, EmptyCaptureSnafu);

        let samples = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(IqCapture::new(samples, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_source_serves_in_order() {
        let scenario = BpskScenario::default();
        let mut src = SimulatedSource::from_scenario(&scenario, None, 3).unwrap();
        assert_eq!(src.remaining(), 5000);
        assert_eq!(src.sample_rate(), 1.0e6);

        let a = src.acquire(3000).unwrap();
        let b = src.acquire(3000).unwrap();
        assert_eq!(a.len(), 3000);
        assert_eq!(b.len(), 2000);
        assert!(src.acquire(1).is_err());
    }
}
