//! Synthetic BPSK captures
//!
//! Rectangular-pulse BPSK on a complex carrier:
//!
//! ```text
//! x[n] = A · b[k] · exp(j·(2π·f_off·t[n] + φ))     k = floor(n / sps)
//! ```
//!
//! with `b[k] = ±1`, `t[n] = n / fs` and `sps = fs / Rsym`.

use core::f64::consts::PI;

use num::complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snafu::ensure;

use crate::error::{InvalidParameterSnafu, Result};
use crate::sync::TimeBase;

/// Parameters of one synthetic capture
#[derive(Debug, Clone, PartialEq)]
pub struct BpskScenario {
    /// Hz
    pub sample_rate: f64,
    /// Symbols per second
    pub symbol_rate: f64,
    /// Seconds
    pub duration: f64,
    /// Residual carrier left on the capture, Hz
    pub carrier_offset_hz: f64,
    /// Static carrier phase, degrees
    pub phase_offset_deg: f64,
    pub amplitude: f64,
}

impl Default for BpskScenario {
    fn default() -> Self {
        Self {
            sample_rate: 1.0e6,
            symbol_rate: 10.0e3,
            duration: 5.0e-3,
            carrier_offset_hz: 1000.0,
            phase_offset_deg: 5.0,
            amplitude: 1.0,
        }
    }
}

impl BpskScenario {
    pub fn num_samples(&self) -> usize {
        (self.sample_rate * self.duration).round().max(0.0) as usize
    }

    pub fn samples_per_symbol(&self) -> f64 {
        self.sample_rate / self.symbol_rate
    }

    /// Whole symbols needed to fill the capture
    pub fn num_symbols(&self) -> usize {
        (self.num_samples() as f64 / self.samples_per_symbol()).ceil() as usize
    }

    pub fn time_base(&self) -> TimeBase {
        TimeBase::new(self.num_samples(), self.sample_rate)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sample_rate", self.sample_rate),
            ("symbol_rate", self.symbol_rate),
            ("duration", self.duration),
        ] {
            ensure!(value.is_finite() && value > 0.0, InvalidParameterSnafu { name, value });
        }
        ensure!(
            self.symbol_rate <= self.sample_rate,
            InvalidParameterSnafu { name: "symbol_rate", value: self.symbol_rate }
        );
        Ok(())
    }

    fn carrier(&self, t: f64) -> Complex64 {
        let phase = 2.0 * PI * self.carrier_offset_hz * t + self.phase_offset_deg.to_radians();
        Complex64::cis(phase) * self.amplitude
    }

    /// Modulate `symbols` (`true` = +1), repeating them if the capture is
    /// longer than the sequence
    pub fn generate(&self, symbols: &[bool]) -> Result<Vec<Complex64>> {
        self.validate()?;
        ensure!(
            !symbols.is_empty(),
            InvalidParameterSnafu { name: "symbols", value: 0.0 }
        );

        let sps = self.samples_per_symbol();
        let time = self.time_base();
        Ok(time
            .as_slice()
            .iter()
            .enumerate()
            .map(|(n, &t)| {
                let k = (n as f64 / sps).floor() as usize;
                let b = if symbols[k % symbols.len()] { 1.0 } else { -1.0 };
                self.carrier(t) * b
            })
            .collect())
    }

    /// Alternating symbols as `sign(sin(2π·Rsym·t))`
    ///
    /// Each half cycle of the sine is one symbol, so consecutive rising
    /// crossings are `fs / Rsym` samples apart and the recovered symbol
    /// length is `fs / (2·Rsym)`.
    pub fn square_wave(&self) -> Result<Vec<Complex64>> {
        self.validate()?;

        let time = self.time_base();
        Ok(time
            .as_slice()
            .iter()
            .map(|&t| {
                let s = (2.0 * PI * self.symbol_rate * t).sin();
                let b = if s > 0.0 {
                    1.0
                } else if s < 0.0 {
                    -1.0
                } else {
                    0.0
                };
                self.carrier(t) * b
            })
            .collect())
    }
}

/// Reproducible random bit sequence
pub fn random_symbols(n: usize, seed: u64) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_bool(0.5)).collect()
}

/// Random bits after an alternating `0101…` preamble
///
/// The preamble guarantees two rising transitions one symbol pair apart,
/// which is what the zero-crossing clock estimate locks onto.
pub fn symbols_with_preamble(n: usize, preamble: usize, seed: u64) -> Vec<bool> {
    let mut symbols = random_symbols(n, seed);
    for (k, s) in symbols.iter_mut().take(preamble).enumerate() {
        *s = k % 2 == 1;
    }
    symbols
}
