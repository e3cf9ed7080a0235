//! Built-in spectral-envelope feature provider.
//!
//! A deliberately small stand-in for a real acoustic embedding: per-frame
//! energy, zero-crossing rate and a two-band spectral balance, scored with a
//! normalized cosine distance. Good enough to exercise the detection loop end
//! to end and to be replaced behind the trait seam without touching the core.

use crate::audio::level::calculate_rms;
use crate::audio::resample::{LinearResampler, Resampler};
use crate::error::{Result, WakegateError};
use crate::features::{DistanceScorer, FeatureExtractor, Features};
use std::path::Path;

/// Minimum overall RMS for a window to count as non-silent.
const SILENCE_FLOOR: f32 = 1e-4;

/// Frame length in milliseconds.
const FRAME_MS: u32 = 25;

/// Hop length in milliseconds.
const HOP_MS: u32 = 10;

/// Spectral-envelope extractor operating at a fixed analysis rate.
#[derive(Debug)]
pub struct SpectralExtractor {
    analysis_rate: u32,
    frame_len: usize,
    hop_len: usize,
}

impl SpectralExtractor {
    pub fn new(analysis_rate: u32) -> Self {
        Self {
            analysis_rate,
            frame_len: ((analysis_rate * FRAME_MS / 1000) as usize).max(1),
            hop_len: ((analysis_rate * HOP_MS / 1000) as usize).max(1),
        }
    }

    /// Per-frame features: log energy, zero-crossing rate, band balance.
    fn frame_features(frame: &[f32]) -> Vec<f32> {
        let rms = calculate_rms(frame);
        let log_energy = (rms.max(1e-6)).ln();

        let crossings = frame
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count();
        let zcr = crossings as f32 / frame.len().max(1) as f32;

        // First-difference energy approximates high-band content
        let diff_energy: f32 = frame
            .windows(2)
            .map(|pair| {
                let d = pair[1] - pair[0];
                d * d
            })
            .sum::<f32>()
            / frame.len().max(1) as f32;
        let total_energy = rms * rms + 1e-9;
        let band_balance = (diff_energy / total_energy).min(4.0);

        vec![log_energy, zcr, band_balance]
    }
}

impl FeatureExtractor for SpectralExtractor {
    fn extract(&self, window: &[f32], sample_rate: u32) -> Result<Features> {
        if sample_rate != self.analysis_rate {
            return Err(WakegateError::Extraction {
                message: format!(
                    "window rate {} does not match analysis rate {}",
                    sample_rate, self.analysis_rate
                ),
            });
        }
        if window.len() < self.frame_len {
            return Err(WakegateError::Extraction {
                message: format!(
                    "window too short: {} samples, need at least {}",
                    window.len(),
                    self.frame_len
                ),
            });
        }
        if calculate_rms(window) < SILENCE_FLOOR {
            return Err(WakegateError::Extraction {
                message: "silent window".to_string(),
            });
        }

        let frames: Vec<Vec<f32>> = window
            .windows(self.frame_len)
            .step_by(self.hop_len)
            .map(Self::frame_features)
            .collect();

        Ok(Features::from_frames(frames))
    }

    fn load_template(&self, path: &Path) -> Result<Features> {
        let template_error = |message: String| WakegateError::TemplateLoad {
            path: path.display().to_string(),
            message,
        };

        let mut reader = hound::WavReader::open(path)
            .map_err(|e| template_error(format!("failed to open WAV: {}", e)))?;
        let spec = reader.spec();

        let raw: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| template_error(format!("failed to read samples: {}", e)))?,
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| template_error(format!("failed to read samples: {}", e)))?,
        };

        let mono: Vec<f32> = if spec.channels > 1 {
            raw.chunks_exact(spec.channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / spec.channels as f32)
                .collect()
        } else {
            raw
        };

        let samples = LinearResampler.resample(&mono, spec.sample_rate, self.analysis_rate);

        self.extract(&samples, self.analysis_rate)
            .map_err(|e| template_error(e.to_string()))
    }
}

/// Normalized cosine distance over aligned frame pairs.
///
/// Returns a value in [0, 1]: 0 for identical envelopes, 1 for opposed ones.
/// Sequences of different lengths are compared over their common prefix.
#[derive(Debug)]
pub struct CosineScorer;

impl DistanceScorer for CosineScorer {
    fn distance(&self, a: &Features, b: &Features) -> f32 {
        let len = a.frames().len().min(b.frames().len());
        if len == 0 {
            return 1.0;
        }

        let total: f32 = a
            .frames()
            .iter()
            .zip(b.frames())
            .take(len)
            .map(|(fa, fb)| {
                let dot: f32 = fa.iter().zip(fb).map(|(x, y)| x * y).sum();
                let norm_a: f32 = fa.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = fb.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a < 1e-9 || norm_b < 1e-9 {
                    return 1.0;
                }
                let cos = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
                (1.0 - cos) / 2.0
            })
            .sum();

        total / len as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(rate: u32, secs: f32, freq: f32, amplitude: f32) -> Vec<f32> {
        let len = (rate as f32 * secs) as usize;
        (0..len)
            .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * freq / rate as f32).sin() * amplitude)
            .collect()
    }

    #[test]
    fn extract_rejects_silence() {
        let extractor = SpectralExtractor::new(16000);
        let window = vec![0.0f32; 16000];
        let err = extractor.extract(&window, 16000).unwrap_err();
        assert!(matches!(err, WakegateError::Extraction { .. }));
    }

    #[test]
    fn extract_rejects_short_window() {
        let extractor = SpectralExtractor::new(16000);
        let window = vec![0.5f32; 100];
        let err = extractor.extract(&window, 16000).unwrap_err();
        assert!(matches!(err, WakegateError::Extraction { .. }));
    }

    #[test]
    fn extract_rejects_wrong_rate() {
        let extractor = SpectralExtractor::new(16000);
        let window = tone(48000, 1.0, 440.0, 0.5);
        let err = extractor.extract(&window, 48000).unwrap_err();
        assert!(matches!(err, WakegateError::Extraction { .. }));
    }

    #[test]
    fn identical_windows_have_zero_distance() {
        let extractor = SpectralExtractor::new(16000);
        let window = tone(16000, 1.0, 440.0, 0.5);
        let a = extractor.extract(&window, 16000).unwrap();
        let b = extractor.extract(&window, 16000).unwrap();
        let distance = CosineScorer.distance(&a, &b);
        assert!(distance < 1e-6, "distance was {}", distance);
    }

    #[test]
    fn distance_is_symmetric_and_non_negative() {
        let extractor = SpectralExtractor::new(16000);
        let a = extractor
            .extract(&tone(16000, 1.0, 220.0, 0.5), 16000)
            .unwrap();
        let b = extractor
            .extract(&tone(16000, 1.0, 3000.0, 0.3), 16000)
            .unwrap();
        let ab = CosineScorer.distance(&a, &b);
        let ba = CosineScorer.distance(&b, &a);
        assert!(ab >= 0.0);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn different_content_scores_above_identical() {
        let extractor = SpectralExtractor::new(16000);
        let a = extractor
            .extract(&tone(16000, 1.0, 220.0, 0.5), 16000)
            .unwrap();
        let b = extractor
            .extract(&tone(16000, 1.0, 6000.0, 0.5), 16000)
            .unwrap();
        let same = CosineScorer.distance(&a, &a);
        let diff = CosineScorer.distance(&a, &b);
        assert!(diff > same);
    }

    #[test]
    fn load_template_missing_file() {
        let extractor = SpectralExtractor::new(16000);
        let err = extractor
            .load_template(Path::new("/nonexistent/Sample1.wav"))
            .unwrap_err();
        assert!(matches!(err, WakegateError::TemplateLoad { .. }));
    }

    #[test]
    fn load_template_reads_and_resamples_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for sample in tone(48000, 1.0, 440.0, 0.5) {
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();

        let extractor = SpectralExtractor::new(16000);
        let features = extractor.load_template(&path).unwrap();
        assert!(!features.frames().is_empty());
    }
}
