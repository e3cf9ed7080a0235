//! Feature extraction and distance scoring capability seams.
//!
//! The detection core never inspects features: it obtains them from a
//! [`FeatureExtractor`], stores them in templates, and compares them through
//! a [`DistanceScorer`]. Both capabilities are selected once at startup and
//! held for the whole session; the hot loop never branches on provider.

pub mod spectral;

use crate::error::{Result, WakegateError};
use std::path::Path;

/// Opaque acoustic feature representation.
///
/// Produced only by extractors, consumed only by scorers. The inner layout
/// (a sequence of per-frame feature vectors) is a provider detail.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    frames: Vec<Vec<f32>>,
}

impl Features {
    /// Construct a representation from per-frame feature vectors.
    ///
    /// For use by extractor implementations; the core never calls this.
    pub fn from_frames(frames: Vec<Vec<f32>>) -> Self {
        Self { frames }
    }

    /// Per-frame feature vectors, for scorer implementations.
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }
}

/// Trait for converting an analysis-rate audio window into features.
pub trait FeatureExtractor: Send + Sync + std::fmt::Debug {
    /// Extract features from a window of samples at `sample_rate`.
    ///
    /// # Errors
    /// Returns [`WakegateError::Extraction`] on degenerate input (all-silence
    /// or too short). The detector treats this as transient and skips the
    /// scoring step.
    fn extract(&self, window: &[f32], sample_rate: u32) -> Result<Features>;

    /// Load and extract features from a reference recording on disk.
    ///
    /// Invoked once per gallery entry at startup, never during scanning.
    ///
    /// # Errors
    /// Returns [`WakegateError::TemplateLoad`] if the file is missing or
    /// malformed.
    fn load_template(&self, path: &Path) -> Result<Features>;
}

/// Trait for scoring dissimilarity between two feature representations.
///
/// Implementations must be pure, symmetric and non-negative; zero means
/// identical.
pub trait DistanceScorer: Send + Sync + std::fmt::Debug {
    fn distance(&self, a: &Features, b: &Features) -> f32;
}

/// Resolve a named feature provider to its extractor/scorer pair.
///
/// Selected once at startup and held for the session. "spectral" is the
/// built-in envelope provider; unknown names are a configuration error.
pub fn resolve_provider(
    name: &str,
    analysis_rate: u32,
) -> Result<(Box<dyn FeatureExtractor>, Box<dyn DistanceScorer>)> {
    match name {
        "spectral" => Ok((
            Box::new(spectral::SpectralExtractor::new(analysis_rate)),
            Box::new(spectral::CosineScorer),
        )),
        other => Err(WakegateError::ConfigInvalidValue {
            key: "wake.provider".to_string(),
            message: format!("unknown feature provider '{}'", other),
        }),
    }
}
