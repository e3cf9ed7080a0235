//! wakegate - Wake-phrase gated voice capture front-end
//!
//! Listens to a live microphone, recognizes a spoken wake phrase against a
//! gallery of reference recordings, and captures one voice-activity-gated
//! utterance for downstream processing.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod features;
pub mod prepare;
pub mod wake;

// Core traits (source → detect → capture → dispatch)
pub use audio::resample::{LinearResampler, Resampler};
pub use audio::source::AudioSource;
pub use dispatch::{CollectorDispatcher, Dispatcher, WavDispatcher};
pub use features::{DistanceScorer, FeatureExtractor, Features};

// State machines
pub use wake::detector::{DetectionResult, DetectorConfig, WakeDetector, WakeState};
pub use wake::gallery::{Template, TemplateGallery};
pub use wake::recorder::{RecorderConfig, RecorderState, UtteranceRecorder};

// Session orchestration
pub use app::{run_monitor, run_session, SessionOptions};

// Error handling
pub use error::{Result, WakegateError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
