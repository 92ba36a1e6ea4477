//! End-to-end synchronization of synthetic BPSK captures

use iqsync::simulation::{add_awgn, BpskScenario};
use iqsync::{synchronize, SyncConfig, SyncError};
use num::complex::Complex64;

use test_utils::{init_test_tracing, reference_capture, reference_scenario};

#[test]
fn test_clean_capture() {
    init_test_tracing();

    let (x, symbols) = reference_capture(21);
    let fs = reference_scenario().sample_rate;
    let report = synchronize(&x, fs, &SyncConfig::default()).unwrap();

    // 5000 samples at 1 MS/s: 200 Hz bins
    let bin = fs / x.len() as f64;
    assert!((report.carrier.offset_hz - 1000.0).abs() <= bin);
    assert!(
        (report.phase.mean_phase_error_deg() - 5.0).abs() < 1.0,
        "phase {}",
        report.phase.mean_phase_error_deg()
    );

    let timing = &report.timing;
    assert_eq!(timing.samples_per_symbol, 100);
    assert!((47..=50).contains(&timing.num_symbols()));
    for &d in &timing.decision_indices {
        let into_symbol = d % 100;
        assert!((25..=75).contains(&into_symbol), "decision at {} is off-centre", d);
    }

    // Rectangular ±1 baseband squared is flat: no clock line
    assert_eq!(report.clock.spectral_rate_hz, None);

    let first = timing.decision_indices[0] / 100;
    let decided = report.symbols().unwrap();
    assert_eq!(&decided[..], &symbols[first..first + decided.len()]);
}

#[test]
fn test_noisy_capture() {
    init_test_tracing();

    let (clean, symbols) = reference_capture(8);
    let x = add_awgn(&clean, 20.0, 99).unwrap();
    let report = synchronize(&x, 1.0e6, &SyncConfig::default()).unwrap();

    assert!((report.carrier.offset_hz - 1000.0).abs() <= 200.0);
    assert!((report.phase.mean_phase_error_deg() - 5.0).abs() < 1.0);
    assert_eq!(report.timing.samples_per_symbol, 100);

    let first = report.timing.decision_indices[0] / 100;
    let decided = report.symbols().unwrap();
    let errors = decided
        .iter()
        .zip(&symbols[first..])
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(errors, 0);
}

#[test]
fn test_dc_blocked_estimate() {
    init_test_tracing();

    let (clean, _) = reference_capture(4);
    let x: Vec<Complex64> = clean.iter().map(|&s| s + Complex64::new(0.3, -0.2)).collect();

    let config = SyncConfig {
        dc_block_hz: Some(100.0),
        ..Default::default()
    };
    let report = synchronize(&x, 1.0e6, &config).unwrap();
    assert!((report.carrier.offset_hz - 1000.0).abs() <= 200.0);
    // The correction is applied to the capture as given
    assert_eq!(report.carrier.samples.len(), x.len());
}

#[test]
fn test_square_wave() {
    init_test_tracing();

    let scenario = BpskScenario {
        carrier_offset_hz: 0.0,
        phase_offset_deg: 0.0,
        ..reference_scenario()
    };
    let x = scenario.square_wave().unwrap();
    let report = synchronize(&x, scenario.sample_rate, &SyncConfig::default()).unwrap();

    // One sine period per rising crossing: fs / Rsym = 100 samples, give or
    // take the sample the sign flips on
    assert!((99..=101).contains(&report.clock.min_period));
    assert_eq!(report.timing.samples_per_symbol, 50);
}

#[test]
fn test_constant_capture_has_no_clock() {
    init_test_tracing();

    let x = vec![Complex64::new(1.0, 0.0); 1000];
    let err = synchronize(&x, 1.0e6, &SyncConfig::default()).unwrap_err();
    assert!(matches!(err, SyncError::InsufficientCrossings { found: 0 }));
}

#[test]
fn test_silent_capture_is_degenerate() {
    let x = vec![Complex64::new(0.0, 0.0); 1000];
    let err = synchronize(&x, 1.0e6, &SyncConfig::default()).unwrap_err();
    assert!(matches!(err, SyncError::DegenerateSignal { .. }));
}

#[test]
fn test_eye_diagram_view() {
    let (x, _) = reference_capture(2);
    let report = synchronize(&x, 1.0e6, &SyncConfig::default()).unwrap();

    let eye = report.eye_diagram().unwrap();
    assert_eq!(eye.samples_per_symbol(), 100);
    assert_eq!(eye.len(), report.timing.num_symbols());
    assert!(eye.segments().all(|seg| seg.len() == 100));
    assert_eq!(
        eye.mask_violations(report.timing.upper_threshold, report.timing.lower_threshold),
        0
    );
}
