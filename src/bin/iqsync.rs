//! BPSK synchronizer
//!
//! Reads a 2-channel I/Q WAV file, runs carrier and clock recovery and
//! prints what was found.
//!
//! **Usage**:
//! ```bash
//! cargo run --bin iqsync -- capture.wav [dc_block_hz]
//! ```

use iqsync::{synchronize, tracing_init, SyncConfig, WavIqSource};
use std::env;

fn main() {
    tracing_init::init_tracing();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <capture.wav> [dc_block_hz]", args[0]);
        eprintln!();
        eprintln!("Synchronizes a BPSK capture stored as 2-channel (I, Q) WAV.");
        std::process::exit(1);
    }

    let mut config = SyncConfig::default();
    if let Some(raw) = args.get(2) {
        match raw.parse::<f64>() {
            Ok(hz) => config.dc_block_hz = Some(hz),
            Err(_) => {
                eprintln!("Invalid DC-block cutoff: {}", raw);
                std::process::exit(1);
            }
        }
    }

    let capture = match WavIqSource::open(&args[1]).and_then(|mut src| src.acquire_all()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading capture: {}", e);
            std::process::exit(1);
        }
    };

    println!("Capture: {}", args[1]);
    println!("  Samples:     {}", capture.len());
    println!("  Sample rate: {:.0} Hz", capture.sample_rate);
    println!("  Duration:    {:.3} ms", capture.duration() * 1e3);

    let report = match synchronize(&capture.samples, capture.sample_rate, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Synchronization failed: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("Carrier");
    println!("  Offset:            {:.3} Hz", report.carrier.offset_hz);
    println!("  Mean phase error:  {:.3} deg", report.phase.mean_phase_error_deg());
    println!("  Residual slope:    {:.6} deg/s", report.phase.regression.slope);
    println!("  Fine offset:       {:.6}", report.phase.fine_frequency_offset);
    println!("  Regression r:      {:.4}", report.phase.regression.r);

    println!();
    println!("Clock");
    match report.clock.spectral_rate_hz {
        Some(f) => println!("  Spectral line:     {:.1} Hz", f),
        None => println!("  Spectral line:     none"),
    }
    println!("  Zero crossings:    {}", report.clock.crossings.len());
    println!("  Min period:        {} samples", report.clock.min_period);
    println!("  Samples/symbol:    {}", report.timing.samples_per_symbol);
    println!(
        "  Symbol rate:       {:.1} Sym/s",
        capture.sample_rate / report.timing.samples_per_symbol as f64
    );

    println!();
    println!("Timing");
    println!("  Grid start:        {}", report.timing.start);
    println!("  Decision offset:   {}", report.timing.decision_offset);
    println!("  Symbols:           {}", report.timing.num_symbols());
    println!(
        "  Eye mask:          [{:.3}, {:.3}]",
        report.timing.lower_threshold, report.timing.upper_threshold
    );

    if let Ok(eye) = report.eye_diagram() {
        let violations = eye.mask_violations(report.timing.upper_threshold, report.timing.lower_threshold);
        println!("  Mask violations:   {}", violations);
    }

    if let Ok(bits) = report.symbols() {
        let text: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
        println!();
        println!("Symbols: {}", text);
    }
}
