//! Voice-activity-gated utterance recorder.
//!
//! After a wake trigger the recorder borrows the audio source and captures
//! one bounded utterance: it arms on the first chunk whose RMS energy crosses
//! the threshold, keeps everything seen so far (pre-onset audio included, so
//! the onset is never truncated), and stops after a contiguous sub-threshold
//! run of the configured silence duration, or unconditionally at the maximum
//! duration. The accumulated buffer is resampled to the analysis rate once,
//! at the end.

use crate::audio::level::calculate_rms;
use crate::audio::resample::Resampler;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::{Result, WakegateError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Configuration for a capture session.
#[derive(Debug, Clone, Copy)]
pub struct RecorderConfig {
    /// Safety ceiling on the utterance duration in seconds.
    pub max_secs: f32,
    /// Minimum accumulated duration before silence may end the recording.
    pub min_secs: f32,
    /// RMS energy threshold for onset and offset decisions.
    pub energy_threshold: f32,
    /// Required contiguous sub-threshold duration to declare offset.
    pub silence_secs: f32,
    /// Energy-gate granularity in seconds.
    pub chunk_secs: f32,
    /// Native capture sample rate in Hz.
    pub native_rate: u32,
    /// Analysis sample rate the finished utterance is resampled to.
    pub analysis_rate: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_secs: defaults::MAX_CAPTURE_SECS,
            min_secs: defaults::MIN_CAPTURE_SECS,
            energy_threshold: defaults::VAD_THRESHOLD,
            silence_secs: defaults::SILENCE_SECS,
            chunk_secs: defaults::CAPTURE_CHUNK_SECS,
            native_rate: defaults::NATIVE_SAMPLE_RATE,
            analysis_rate: defaults::ANALYSIS_SAMPLE_RATE,
        }
    }
}

/// Current state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Waiting for speech onset.
    Armed,
    /// Accumulating the utterance.
    Recording,
    /// Terminal: the utterance is complete.
    Stopped,
}

/// Voice-activity-gated recorder.
pub struct UtteranceRecorder {
    config: RecorderConfig,
}

impl UtteranceRecorder {
    pub fn new(config: RecorderConfig) -> Result<Self> {
        if config.min_secs > config.max_secs {
            return Err(WakegateError::ConfigInvalidValue {
                key: "recording.min_secs".to_string(),
                message: "minimum duration exceeds maximum duration".to_string(),
            });
        }
        if config.chunk_secs <= 0.0 || (config.chunk_secs * config.native_rate as f32) < 1.0 {
            return Err(WakegateError::ConfigInvalidValue {
                key: "recording.chunk_secs".to_string(),
                message: "capture chunk must cover at least one sample".to_string(),
            });
        }
        Ok(Self { config })
    }

    /// Capture one utterance, blocking until it completes.
    ///
    /// Returns the accumulated samples resampled to the analysis rate.
    ///
    /// # Errors
    /// Returns [`WakegateError::Capture`] if the source fails mid-session;
    /// partial audio is discarded so an incomplete utterance is never handed
    /// downstream. Returns [`WakegateError::Interrupted`] on operator abort.
    pub fn capture(
        &self,
        source: &mut dyn AudioSource,
        resampler: &dyn Resampler,
        interrupt: &AtomicBool,
    ) -> Result<Vec<f32>> {
        let rate = self.config.native_rate as f32;
        let chunk_len = (self.config.chunk_secs * rate) as usize;
        let max_samples = (self.config.max_secs * rate) as usize;
        let min_samples = (self.config.min_secs * rate) as usize;
        let silence_needed = (self.config.silence_secs * rate) as usize;

        let mut samples: Vec<f32> = Vec::with_capacity(max_samples + chunk_len);
        let mut state = RecorderState::Armed;
        let mut silent_run = 0usize;

        while samples.len() < max_samples {
            if interrupt.load(Ordering::SeqCst) {
                return Err(WakegateError::Interrupted);
            }

            let chunk = source
                .read_chunk(chunk_len)
                .map_err(|e| WakegateError::Capture {
                    message: format!("audio source failed mid-capture: {}", e),
                })?;
            let rms = calculate_rms(&chunk);
            // Pre-onset audio is kept so the moment of onset is not truncated.
            samples.extend_from_slice(&chunk);

            match state {
                RecorderState::Armed => {
                    if rms > self.config.energy_threshold {
                        state = RecorderState::Recording;
                    }
                }
                RecorderState::Recording => {
                    if rms < self.config.energy_threshold {
                        silent_run += chunk.len();
                    } else {
                        // Energy spike: the silence run must be contiguous.
                        silent_run = 0;
                    }

                    if silent_run >= silence_needed && samples.len() >= min_samples {
                        state = RecorderState::Stopped;
                        break;
                    }
                }
                RecorderState::Stopped => break,
            }
        }
        // Falling out of the loop without Stopped is the ceiling path.
        let _ = state;

        Ok(resampler.resample(&samples, self.config.native_rate, self.config.analysis_rate))
    }
}
