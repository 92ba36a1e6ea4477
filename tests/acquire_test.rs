//! WAV I/Q files through the acquisition boundary and into the pipeline

use iqsync::acquire::AcquireError;
use iqsync::simulation::{BpskScenario, SimulatedSource};
use iqsync::{synchronize, synchronize_source, write_iq_wav, IqSource, SyncConfig, WavIqSource};

use test_utils::{init_test_tracing, temp_wav};

#[test]
fn test_recording_round_trip_synchronizes() {
    init_test_tracing();

    let scenario = BpskScenario::default();
    let mut sim = SimulatedSource::from_scenario(&scenario, Some(25.0), 13).unwrap();
    let capture = sim.acquire(scenario.num_samples()).unwrap();

    let path = temp_wav("roundtrip");
    write_iq_wav(&path, &capture).unwrap();

    let mut recording = WavIqSource::open(&path).unwrap();
    assert_eq!(recording.sample_rate(), 1.0e6);
    let from_file = synchronize_source(&mut recording, capture.len(), &SyncConfig::default()).unwrap();
    let in_memory = synchronize(&capture.samples, capture.sample_rate, &SyncConfig::default()).unwrap();

    assert_eq!(from_file.carrier.offset_hz, in_memory.carrier.offset_hz);
    assert_eq!(from_file.timing.samples_per_symbol, 100);
    assert_eq!(from_file.timing.decision_indices, in_memory.timing.decision_indices);
    assert_eq!(from_file.symbols().unwrap(), in_memory.symbols().unwrap());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_int16_recording() {
    let path = temp_wav("int16");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for (i, q) in [(16384i16, -16384i16), (0, 32767), (-32768, 0)] {
        writer.write_sample(i).unwrap();
        writer.write_sample(q).unwrap();
    }
    writer.finalize().unwrap();

    let mut src = WavIqSource::open(&path).unwrap();
    let capture = src.acquire_all().unwrap();
    assert_eq!(capture.sample_rate, 8000.0);
    assert_eq!(capture.len(), 3);
    assert_eq!(capture.samples[0].re, 0.5);
    assert_eq!(capture.samples[0].im, -0.5);
    assert_eq!(capture.samples[2].re, -1.0);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_mono_recording_rejected() {
    let path = temp_wav("mono");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    writer.write_sample(0i16).unwrap();
    writer.finalize().unwrap();

    let err = WavIqSource::open(&path).err().unwrap();
    assert!(matches!(
        err,
        AcquireError::UnsupportedLayout { channels: 1, bits: 16, .. }
    ));

    std::fs::remove_file(&path).ok();
}
