//! Digital phase-locked loop
//!
//! A complex VCO driven by a second-order loop filter. Each call to
//! [`DigitalPll::step`] consumes one input sample:
//!
//! ```text
//! e      = arg(s · conj(vco))
//! freq  += bw · e
//! phase += sqrt(bw) · e + freq
//! vco    = exp(j · phase)
//! ```
//!
//! `freq` converges to the input's angular frequency in radians/sample.
//! Phase is left unwrapped; only `exp(j·phase)` is ever consumed.

use num::complex::Complex64;
use snafu::ensure;

use crate::error::{InvalidParameterSnafu, Result};

/// Per-sample loop state, for plotting or diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PllSnapshot {
    pub phase: f64,
    pub frequency: f64,
    pub vco: Complex64,
    pub phase_difference: f64,
}

#[derive(Debug, Clone)]
pub struct DigitalPll {
    phase: f64,
    frequency: f64,
    vco: Complex64,
    phase_difference: f64,
    loop_bandwidth: f64,
    beta: f64,
}

impl DigitalPll {
    /// Create a loop with integral gain `loop_bandwidth` and proportional
    /// gain `sqrt(loop_bandwidth)`
    ///
    /// # Errors
    /// `InvalidParameter` unless `loop_bandwidth` is finite and positive.
    pub fn new(loop_bandwidth: f64) -> Result<Self> {
        ensure!(
            loop_bandwidth.is_finite() && loop_bandwidth > 0.0,
            InvalidParameterSnafu { name: "loop_bandwidth", value: loop_bandwidth }
        );

        Ok(Self {
            phase: 0.0,
            frequency: 0.0,
            vco: Complex64::new(1.0, 0.0),
            phase_difference: 0.0,
            loop_bandwidth,
            beta: loop_bandwidth.sqrt(),
        })
    }

    /// Advance the loop by one input sample; returns the phase detector output
    pub fn step(&mut self, sample: Complex64) -> f64 {
        self.phase_difference = (sample * self.vco.conj()).arg();
        self.frequency += self.loop_bandwidth * self.phase_difference;
        self.phase += self.beta * self.phase_difference + self.frequency;
        self.vco = Complex64::cis(self.phase);
        self.phase_difference
    }

    /// Drive the loop over `samples`, recording the state after each step
    pub fn track(&mut self, samples: &[Complex64]) -> Vec<PllSnapshot> {
        samples
            .iter()
            .map(|&s| {
                self.step(s);
                self.snapshot()
            })
            .collect()
    }

    pub fn snapshot(&self) -> PllSnapshot {
        PllSnapshot {
            phase: self.phase,
            frequency: self.frequency,
            vco: self.vco,
            phase_difference: self.phase_difference,
        }
    }

    /// Return to the initial state, keeping the gains
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.frequency = 0.0;
        self.vco = Complex64::new(1.0, 0.0);
        self.phase_difference = 0.0;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Current frequency estimate, radians/sample
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn vco(&self) -> Complex64 {
        self.vco
    }

    pub fn phase_difference(&self) -> f64 {
        self.phase_difference
    }

    pub fn loop_bandwidth(&self) -> f64 {
        self.loop_bandwidth
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn test_gains_from_bandwidth() {
        let pll = DigitalPll::new(0.04).unwrap();
        assert_eq!(pll.loop_bandwidth(), 0.04);
        assert!((pll.beta() - 0.2).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_bad_bandwidth() {
        assert!(DigitalPll::new(0.0).is_err());
        assert!(DigitalPll::new(-0.1).is_err());
        assert!(DigitalPll::new(f64::NAN).is_err());
    }

    #[test]
    fn test_first_step() {
        let mut pll = DigitalPll::new(0.01).unwrap();
        let e = pll.step(Complex64::cis(0.5));
        assert!((e - 0.5).abs() < 1e-12);
        assert!((pll.frequency() - 0.005).abs() < 1e-12);
        assert!((pll.phase() - (0.1 * 0.5 + 0.005)).abs() < 1e-12);
        assert!((pll.vco() - Complex64::cis(pll.phase())).norm() < 1e-12);
    }

    #[test]
    fn test_phase_difference_is_wrapped() {
        let mut pll = DigitalPll::new(0.01).unwrap();
        let e = pll.step(Complex64::cis(3.5));
        assert!(e > -PI && e <= PI);
        assert!((e - (3.5 - 2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_locks_to_static_phase() {
        let mut pll = DigitalPll::new(0.01).unwrap();
        let input = Complex64::cis(1.0);
        for _ in 0..2000 {
            pll.step(input);
        }
        assert!(pll.phase_difference().abs() < 1e-6);
        assert!(pll.frequency().abs() < 1e-6);
    }

    #[test]
    fn test_track_and_reset() {
        let mut pll = DigitalPll::new(0.002).unwrap();
        let samples: Vec<Complex64> = (0..10).map(|i| Complex64::cis(-0.2 * i as f64)).collect();

        let trajectory = pll.track(&samples);
        assert_eq!(trajectory.len(), 10);
        assert_eq!(trajectory[9], pll.snapshot());

        pll.reset();
        assert_eq!(pll.phase(), 0.0);
        assert_eq!(pll.frequency(), 0.0);
        assert_eq!(pll.loop_bandwidth(), 0.002);
    }
}
