//! Dispatch boundary for finished recordings.
//!
//! The core hands each captured utterance, together with the trigger
//! metadata, across this seam. Downstream transcription and action live on
//! the other side and are out of scope here.

use crate::error::{Result, WakegateError};
use crate::wake::detector::DetectionResult;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Consumer of finished recordings.
pub trait Dispatcher: Send {
    /// Hand off one utterance at `sample_rate` with its trigger metadata.
    fn dispatch(
        &mut self,
        detection: &DetectionResult,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<()>;
}

/// Writes each utterance as a 16-bit PCM mono WAV into a directory,
/// one timestamped file per capture.
pub struct WavDispatcher {
    dir: PathBuf,
}

impl WavDispatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn next_path(&self) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.dir.join(format!("prompt_{}.wav", stamp))
    }
}

impl Dispatcher for WavDispatcher {
    fn dispatch(
        &mut self,
        detection: &DetectionResult,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        write_wav(&path, samples, sample_rate)?;
        println!(
            "Saved utterance to {} ({} matched at distance {:.4})",
            path.display(),
            detection.template,
            detection.distance
        );
        Ok(())
    }
}

/// Write samples as a 16-bit PCM mono WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| WakegateError::Dispatch {
        message: format!("failed to create {}: {}", path.display(), e),
    })?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(value)
            .map_err(|e| WakegateError::Dispatch {
                message: format!("failed to write {}: {}", path.display(), e),
            })?;
    }
    writer.finalize().map_err(|e| WakegateError::Dispatch {
        message: format!("failed to finalize {}: {}", path.display(), e),
    })
}

/// Test dispatcher that collects everything handed across the boundary.
#[derive(Debug, Default)]
pub struct CollectorDispatcher {
    pub captures: Vec<(DetectionResult, Vec<f32>, u32)>,
}

impl CollectorDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dispatcher for CollectorDispatcher {
    fn dispatch(
        &mut self,
        detection: &DetectionResult,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<()> {
        self.captures
            .push((detection.clone(), samples.to_vec(), sample_rate));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection() -> DetectionResult {
        DetectionResult {
            template: "Sample1.wav".to_string(),
            distance: 0.02,
        }
    }

    #[test]
    fn wav_dispatcher_writes_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = WavDispatcher::new(dir.path());
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];

        dispatcher.dispatch(&detection(), &samples, 16000).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);

        let mut reader = hound::WavReader::open(entries[0].path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.channels, 1);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read.len(), samples.len());
        assert_eq!(read[0], 0);
        assert_eq!(read[3], i16::MAX);
    }

    #[test]
    fn write_wav_clamps_out_of_range_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipped.wav");
        write_wav(&path, &[2.0, -2.0], 16000).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read[0], i16::MAX);
        assert_eq!(read[1], -i16::MAX);
    }

    #[test]
    fn collector_records_dispatches() {
        let mut dispatcher = CollectorDispatcher::new();
        dispatcher
            .dispatch(&detection(), &[0.1, 0.2], 16000)
            .unwrap();

        assert_eq!(dispatcher.captures.len(), 1);
        assert_eq!(dispatcher.captures[0].0.template, "Sample1.wav");
        assert_eq!(dispatcher.captures[0].1, vec![0.1, 0.2]);
        assert_eq!(dispatcher.captures[0].2, 16000);
    }
}
