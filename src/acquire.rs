//! I/Q acquisition boundary
//!
//! The synchronization core never talks to hardware. Whatever produces
//! samples (an instrument driver, a recording, a simulator) implements
//! [`IqSource`]: "give me N complex samples at rate R".
//!
//! **WAV I/Q format**:
//! - 2 channels, I on the left and Q on the right
//! - 32-bit float (written and read) or 16-bit PCM (read, scaled to ±1)
//! - Sample rate stored in the header, in whole Hz

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use num::complex::Complex64;
use snafu::{ensure, ResultExt, Snafu};
use tracing::{debug, info};

use crate::sync::TimeBase;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AcquireError {
    #[snafu(display("failed to open I/Q file '{path}': {source}"))]
    Open { path: String, source: hound::Error },

    #[snafu(display("failed to read I/Q samples: {source}"))]
    Read { source: hound::Error },

    #[snafu(display("failed to write I/Q file '{path}': {source}"))]
    Write { path: String, source: hound::Error },

    #[snafu(display("unsupported I/Q layout: {channels} channel(s), {bits}-bit {format}"))]
    UnsupportedLayout {
        channels: u16,
        bits: u16,
        format: &'static str,
    },

    #[snafu(display("capture is empty"))]
    EmptyCapture,

    #[snafu(display("invalid sample rate {rate} Hz"))]
    InvalidSampleRate { rate: f64 },
}

/// One batch of complex baseband samples
#[derive(Debug, Clone, PartialEq)]
pub struct IqCapture {
    pub samples: Vec<Complex64>,
    /// Hz
    pub sample_rate: f64,
}

impl IqCapture {
    pub fn new(samples: Vec<Complex64>, sample_rate: f64) -> Self {
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Seconds covered by the capture
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn time_base(&self) -> TimeBase {
        TimeBase::new(self.samples.len(), self.sample_rate)
    }
}

/// Anything that can hand over a block of I/Q samples
pub trait IqSource {
    /// Rate the source delivers samples at, Hz
    fn sample_rate(&self) -> f64;

    /// Acquire up to `num_samples` samples
    fn acquire(&mut self, num_samples: usize) -> Result<IqCapture, AcquireError>;

    /// Acquire enough samples to cover `seconds`
    fn acquire_duration(&mut self, seconds: f64) -> Result<IqCapture, AcquireError> {
        let num_samples = (self.sample_rate() * seconds).round().max(0.0) as usize;
        self.acquire(num_samples)
    }
}

enum SampleKind {
    Float32,
    Int16,
}

/// Reads I/Q frames sequentially from a stereo WAV file
pub struct WavIqSource {
    reader: hound::WavReader<BufReader<File>>,
    kind: SampleKind,
    sample_rate: f64,
    frames: usize,
    consumed: usize,
}

impl WavIqSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AcquireError> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path).context(OpenSnafu {
            path: path.display().to_string(),
        })?;

        let spec = reader.spec();
        let kind = match (spec.channels, spec.sample_format, spec.bits_per_sample) {
            (2, hound::SampleFormat::Float, 32) => SampleKind::Float32,
            (2, hound::SampleFormat::Int, 16) => SampleKind::Int16,
            (channels, format, bits) => {
                let format = match format {
                    hound::SampleFormat::Float => "float",
                    hound::SampleFormat::Int => "int",
                };
                return UnsupportedLayoutSnafu { channels, bits, format }.fail();
            }
        };

        info!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            frames = reader.duration(),
            "opened I/Q recording"
        );

        let frames = reader.duration() as usize;
        Ok(Self {
            reader,
            kind,
            sample_rate: spec.sample_rate as f64,
            frames,
            consumed: 0,
        })
    }

    /// Frames not yet consumed
    pub fn remaining(&self) -> usize {
        self.frames.saturating_sub(self.consumed)
    }

    /// Acquire everything left in the file
    pub fn acquire_all(&mut self) -> Result<IqCapture, AcquireError> {
        let n = self.remaining();
        self.acquire(n)
    }
}

impl IqSource for WavIqSource {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn acquire(&mut self, num_samples: usize) -> Result<IqCapture, AcquireError> {
        let wanted = num_samples.saturating_mul(2);
        let interleaved: Vec<f32> = match self.kind {
            SampleKind::Float32 => self
                .reader
                .samples::<f32>()
                .take(wanted)
                .collect::<Result<_, _>>()
                .context(ReadSnafu)?,
            SampleKind::Int16 => self
                .reader
                .samples::<i16>()
                .take(wanted)
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<Result<_, _>>()
                .context(ReadSnafu)?,
        };

        let samples: Vec<Complex64> = interleaved
            .chunks_exact(2)
            .map(|iq| Complex64::new(iq[0] as f64, iq[1] as f64))
            .collect();
        ensure!(!samples.is_empty(), EmptyCaptureSnafu);
        self.consumed += samples.len();
        debug!(requested = num_samples, got = samples.len(), "acquired I/Q block");

        Ok(IqCapture::new(samples, self.sample_rate))
    }
}

/// Write a capture as a 2-channel 32-bit float WAV file
pub fn write_iq_wav<P: AsRef<Path>>(path: P, capture: &IqCapture) -> Result<(), AcquireError> {
    let path = path.as_ref();
    let rate = capture.sample_rate.round();
    ensure!(
        rate >= 1.0 && rate <= u32::MAX as f64,
        InvalidSampleRateSnafu { rate: capture.sample_rate }
    );

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: rate as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let path_str = path.display().to_string();

    let mut writer = hound::WavWriter::create(path, spec).context(WriteSnafu { path: path_str.clone() })?;
    for s in &capture.samples {
        writer
            .write_sample(s.re as f32)
            .context(WriteSnafu { path: path_str.clone() })?;
        writer
            .write_sample(s.im as f32)
            .context(WriteSnafu { path: path_str.clone() })?;
    }
    writer.finalize().context(WriteSnafu { path: path_str })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp {
        next: usize,
    }

    impl IqSource for Ramp {
        fn sample_rate(&self) -> f64 {
            1000.0
        }

        fn acquire(&mut self, num_samples: usize) -> Result<IqCapture, AcquireError> {
            let samples = (self.next..self.next + num_samples)
                .map(|i| Complex64::new(i as f64, 0.0))
                .collect();
            self.next += num_samples;
            Ok(IqCapture::new(samples, 1000.0))
        }
    }

    #[test]
    fn test_acquire_duration_sizes_request() {
        let mut src = Ramp { next: 0 };
        let cap = src.acquire_duration(0.005).unwrap();
        assert_eq!(cap.len(), 5);
        assert!((cap.duration() - 0.005).abs() < 1e-12);
        assert_eq!(cap.time_base().len(), 5);
    }

    #[test]
    fn test_wav_iq_file() {
        let path = std::env::temp_dir().join(format!("iqsync_acquire_{}.wav", std::process::id()));
        let capture = IqCapture::new(
            (0..100).map(|i| Complex64::new(0.01 * i as f64, -0.005 * i as f64)).collect(),
            48_000.0,
        );
        write_iq_wav(&path, &capture).unwrap();

        let mut src = WavIqSource::open(&path).unwrap();
        assert_eq!(src.sample_rate(), 48_000.0);
        assert_eq!(src.remaining(), 100);

        let first = src.acquire(60).unwrap();
        assert_eq!(first.len(), 60);
        assert!((first.samples[10] - capture.samples[10]).norm() < 1e-6);

        let rest = src.acquire_all().unwrap();
        assert_eq!(rest.len(), 40);
        assert!(matches!(src.acquire(10), Err(AcquireError::EmptyCapture)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_open_missing_file() {
        let err = WavIqSource::open("/nonexistent/iqsync.wav").err().unwrap();
        assert!(err.to_string().contains("/nonexistent/iqsync.wav"));
    }
}
