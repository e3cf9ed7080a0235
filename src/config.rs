use crate::defaults;
use crate::error::{Result, WakegateError};
use crate::wake::detector::DetectorConfig;
use crate::wake::recorder::RecorderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub wake: WakeConfig,
    pub recording: RecordingConfig,
    pub dispatch: DispatchConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub native_rate: u32,
    pub analysis_rate: u32,
}

/// Wake detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WakeConfig {
    pub templates_dir: PathBuf,
    pub buffer_secs: f32,
    pub slide_secs: f32,
    pub threshold: f32,
    pub provider: String,
    pub max_extraction_failures: u32,
}

/// Utterance recording configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    pub max_secs: f32,
    pub min_secs: f32,
    pub energy_threshold: f32,
    pub silence_secs: f32,
    pub chunk_secs: f32,
}

/// Dispatch boundary configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    pub captures_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            native_rate: defaults::NATIVE_SAMPLE_RATE,
            analysis_rate: defaults::ANALYSIS_SAMPLE_RATE,
        }
    }
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(defaults::TEMPLATES_DIR),
            buffer_secs: defaults::BUFFER_SECS,
            slide_secs: defaults::SLIDE_SECS,
            threshold: defaults::WAKE_THRESHOLD,
            provider: "spectral".to_string(),
            max_extraction_failures: defaults::MAX_EXTRACTION_FAILURES,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_secs: defaults::MAX_CAPTURE_SECS,
            min_secs: defaults::MIN_CAPTURE_SECS,
            energy_threshold: defaults::VAD_THRESHOLD,
            silence_secs: defaults::SILENCE_SECS,
            chunk_secs: defaults::CAPTURE_CHUNK_SECS,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            captures_dir: PathBuf::from(defaults::CAPTURES_DIR),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if it is missing.
    ///
    /// Only a missing file falls back to defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(WakegateError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - WAKEGATE_DEVICE → audio.device
    /// - WAKEGATE_TEMPLATES → wake.templates_dir
    /// - WAKEGATE_THRESHOLD → wake.threshold
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("WAKEGATE_DEVICE") {
            if !device.is_empty() {
                self.audio.device = Some(device);
            }
        }

        if let Ok(dir) = std::env::var("WAKEGATE_TEMPLATES") {
            if !dir.is_empty() {
                self.wake.templates_dir = PathBuf::from(dir);
            }
        }

        if let Ok(raw) = std::env::var("WAKEGATE_THRESHOLD") {
            if let Ok(threshold) = raw.parse::<f32>() {
                self.wake.threshold = threshold;
            }
        }

        self
    }

    /// Validate the recognized option surface.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| {
            Err(WakegateError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.audio.native_rate == 0 {
            return invalid("audio.native_rate", "must be positive");
        }
        if self.audio.analysis_rate == 0 {
            return invalid("audio.analysis_rate", "must be positive");
        }
        if self.wake.buffer_secs <= 0.0 {
            return invalid("wake.buffer_secs", "must be positive");
        }
        if self.wake.slide_secs <= 0.0 {
            return invalid("wake.slide_secs", "must be positive");
        }
        if self.wake.slide_secs > self.wake.buffer_secs {
            return invalid("wake.slide_secs", "must not exceed the buffer duration");
        }
        if self.wake.threshold <= 0.0 {
            return invalid("wake.threshold", "must be positive");
        }
        if self.recording.max_secs <= 0.0 {
            return invalid("recording.max_secs", "must be positive");
        }
        if self.recording.min_secs < 0.0 {
            return invalid("recording.min_secs", "must not be negative");
        }
        if self.recording.min_secs > self.recording.max_secs {
            return invalid("recording.min_secs", "must not exceed recording.max_secs");
        }
        if self.recording.energy_threshold < 0.0 {
            return invalid("recording.energy_threshold", "must not be negative");
        }
        if self.recording.silence_secs <= 0.0 {
            return invalid("recording.silence_secs", "must be positive");
        }
        if self.recording.chunk_secs <= 0.0 {
            return invalid("recording.chunk_secs", "must be positive");
        }
        Ok(())
    }

    /// Detector settings derived from this configuration.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            buffer_secs: self.wake.buffer_secs,
            slide_secs: self.wake.slide_secs,
            native_rate: self.audio.native_rate,
            analysis_rate: self.audio.analysis_rate,
            threshold: self.wake.threshold,
            max_extraction_failures: self.wake.max_extraction_failures,
        }
    }

    /// Recorder settings derived from this configuration.
    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            max_secs: self.recording.max_secs,
            min_secs: self.recording.min_secs,
            energy_threshold: self.recording.energy_threshold,
            silence_secs: self.recording.silence_secs,
            chunk_secs: self.recording.chunk_secs,
            native_rate: self.audio.native_rate,
            analysis_rate: self.audio.analysis_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.native_rate, 48000);
        assert_eq!(config.wake.threshold, 0.04);
    }

    #[test]
    fn load_parses_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wakegate.toml");
        std::fs::write(
            &path,
            r#"
[wake]
threshold = 0.08
templates_dir = "/opt/refs"

[recording]
max_secs = 8.0
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.wake.threshold, 0.08);
        assert_eq!(config.wake.templates_dir, PathBuf::from("/opt/refs"));
        assert_eq!(config.recording.max_secs, 8.0);
        // Untouched sections keep defaults
        assert_eq!(config.audio.native_rate, 48000);
        assert_eq!(config.recording.min_secs, 0.5);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/wakegate.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wakegate.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        let result = Config::load_or_default(&path);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_inverted_durations() {
        let mut config = Config::default();
        config.recording.min_secs = 10.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, WakegateError::ConfigInvalidValue { .. }));
    }

    #[test]
    fn validate_rejects_slide_longer_than_buffer() {
        let mut config = Config::default();
        config.wake.slide_secs = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn detector_config_mirrors_sections() {
        let mut config = Config::default();
        config.wake.threshold = 0.1;
        config.audio.native_rate = 44100;

        let detector = config.detector_config();
        assert_eq!(detector.threshold, 0.1);
        assert_eq!(detector.native_rate, 44100);
        assert_eq!(detector.analysis_rate, 16000);
    }

    #[test]
    fn recorder_config_mirrors_sections() {
        let mut config = Config::default();
        config.recording.silence_secs = 2.0;

        let recorder = config.recorder_config();
        assert_eq!(recorder.silence_secs, 2.0);
        assert_eq!(recorder.native_rate, 48000);
    }
}
