//! Additive white Gaussian noise

use num::complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use snafu::ensure;

use crate::error::{InvalidParameterSnafu, Result};

/// Root-mean-square magnitude; 0 for an empty slice
pub fn rms(samples: &[Complex64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Add complex AWGN at `snr_db` relative to the mean power of `samples`
///
/// Noise power is split evenly between I and Q.
pub fn add_awgn(samples: &[Complex64], snr_db: f64, seed: u64) -> Result<Vec<Complex64>> {
    ensure!(snr_db.is_finite(), InvalidParameterSnafu { name: "snr_db", value: snr_db });

    let signal_power = rms(samples).powi(2);
    let noise_power = signal_power / 10f64.powf(snr_db / 10.0);
    let sigma = (noise_power / 2.0).sqrt();

    let normal = Normal::new(0.0, sigma)
        .map_err(|_| InvalidParameterSnafu { name: "noise_sigma", value: sigma }.build())?;
    let mut rng = StdRng::seed_from_u64(seed);

    Ok(samples
        .iter()
        .map(|&s| s + Complex64::new(normal.sample(&mut rng), normal.sample(&mut rng)))
        .collect())
}
