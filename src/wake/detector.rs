//! Wake detector state machine.
//!
//! One iteration per slide step: pull a chunk from the source, shift it into
//! the match buffer, resample the window to the analysis rate, extract
//! features and score them against every template in the gallery. The step
//! triggers when the minimum distance falls strictly below the threshold.
//!
//! Extraction failures are transient and skip the step; source read failures
//! terminate the session.

use crate::audio::resample::Resampler;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::{Result, WakegateError};
use crate::features::{DistanceScorer, FeatureExtractor};
use crate::wake::buffer::MatchBuffer;
use crate::wake::gallery::TemplateGallery;
use std::sync::atomic::{AtomicBool, Ordering};

/// Configuration for the wake detection loop.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Sliding buffer duration in seconds.
    pub buffer_secs: f32,
    /// Slide increment in seconds.
    pub slide_secs: f32,
    /// Native capture sample rate in Hz.
    pub native_rate: u32,
    /// Analysis sample rate in Hz.
    pub analysis_rate: u32,
    /// Detection threshold; a step triggers strictly below this distance.
    pub threshold: f32,
    /// Consecutive extraction failures tolerated before the source is
    /// declared unhealthy. Zero disables the bound.
    pub max_extraction_failures: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            buffer_secs: defaults::BUFFER_SECS,
            slide_secs: defaults::SLIDE_SECS,
            native_rate: defaults::NATIVE_SAMPLE_RATE,
            analysis_rate: defaults::ANALYSIS_SAMPLE_RATE,
            threshold: defaults::WAKE_THRESHOLD,
            max_extraction_failures: defaults::MAX_EXTRACTION_FAILURES,
        }
    }
}

/// Current state of the wake detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeState {
    /// Created, not yet scanning.
    Idle,
    /// Steady state: one iteration per slide step.
    Scanning,
    /// Terminal for the current cycle; control hands off to the recorder.
    Triggered,
}

/// Best (minimum-distance) match on one slide step.
///
/// Recomputed fresh every step; carries no persistence beyond reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub template: String,
    pub distance: f32,
}

/// Outcome of a single slide step.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Extraction failed on a degenerate window; no score this step.
    Skipped,
    /// Best match across the gallery for this step.
    Score(DetectionResult),
}

/// Wake detector driving the buffer, extractor and scorer.
///
/// Exclusively owns the sliding window. Borrows the source only for the
/// duration of each call, so the caller can hand the source to the recorder
/// between a trigger and the next scan.
pub struct WakeDetector<'a> {
    config: DetectorConfig,
    gallery: &'a TemplateGallery,
    extractor: &'a dyn FeatureExtractor,
    scorer: &'a dyn DistanceScorer,
    resampler: &'a dyn Resampler,
    buffer: MatchBuffer,
    state: WakeState,
    consecutive_failures: u32,
}

impl<'a> WakeDetector<'a> {
    pub fn new(
        config: DetectorConfig,
        gallery: &'a TemplateGallery,
        extractor: &'a dyn FeatureExtractor,
        scorer: &'a dyn DistanceScorer,
        resampler: &'a dyn Resampler,
    ) -> Result<Self> {
        if config.analysis_rate == 0 || config.native_rate == 0 {
            return Err(WakegateError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "sample rates must be positive".to_string(),
            });
        }

        let buffer = MatchBuffer::new(config.buffer_secs, config.slide_secs, config.native_rate)?;

        Ok(Self {
            config,
            gallery,
            extractor,
            scorer,
            resampler,
            buffer,
            state: WakeState::Idle,
            consecutive_failures: 0,
        })
    }

    /// Returns the current detector state.
    pub fn state(&self) -> WakeState {
        self.state
    }

    /// Perform one slide step: read, shift, extract, score.
    ///
    /// Does not apply the threshold; [`WakeDetector::run`] does. The monitor
    /// tool calls this directly to report distances without triggering.
    ///
    /// # Errors
    /// Propagates source read failures, and reports the source as unhealthy
    /// once the consecutive extraction-failure bound is exceeded.
    pub fn scan_step(&mut self, source: &mut dyn AudioSource) -> Result<ScanOutcome> {
        let chunk = source.read_chunk(self.buffer.slide_len())?;
        self.buffer.slide(&chunk)?;

        let window = self.resampler.resample(
            self.buffer.snapshot(),
            self.config.native_rate,
            self.config.analysis_rate,
        );

        let features = match self.extractor.extract(&window, self.config.analysis_rate) {
            Ok(features) => features,
            Err(e) if e.is_transient() => {
                self.consecutive_failures += 1;
                if self.config.max_extraction_failures > 0
                    && self.consecutive_failures >= self.config.max_extraction_failures
                {
                    return Err(WakegateError::Source {
                        message: format!(
                            "{} consecutive extraction failures; audio source is unhealthy",
                            self.consecutive_failures
                        ),
                    });
                }
                return Ok(ScanOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };
        self.consecutive_failures = 0;

        let mut best: Option<DetectionResult> = None;
        for template in self.gallery.iter() {
            let distance = self.scorer.distance(&features, &template.features);
            // Strict comparison: the first template in gallery order wins ties.
            if best.as_ref().map(|b| distance < b.distance).unwrap_or(true) {
                best = Some(DetectionResult {
                    template: template.name.clone(),
                    distance,
                });
            }
        }

        // Gallery is never empty (enforced at load), so best is always set.
        best.map(ScanOutcome::Score)
            .ok_or_else(|| WakegateError::EmptyGallery {
                dir: "<gallery>".to_string(),
            })
    }

    /// Scan until the wake phrase is detected or the session is interrupted.
    ///
    /// Blocks on the source one slide increment at a time. The interrupt flag
    /// is observed at the top of every iteration. On return the detector is
    /// in [`WakeState::Triggered`]; call [`WakeDetector::reset`] after the
    /// recording session completes to resume scanning.
    pub fn run(
        &mut self,
        source: &mut dyn AudioSource,
        interrupt: &AtomicBool,
    ) -> Result<DetectionResult> {
        self.state = WakeState::Scanning;

        loop {
            if interrupt.load(Ordering::SeqCst) {
                return Err(WakegateError::Interrupted);
            }

            match self.scan_step(source)? {
                ScanOutcome::Skipped => continue,
                ScanOutcome::Score(best) => {
                    if best.distance < self.config.threshold {
                        self.state = WakeState::Triggered;
                        return Ok(best);
                    }
                }
            }
        }
    }

    /// Zero the buffer and return to scanning after a capture session.
    ///
    /// Prevents residual energy from the just-captured utterance from
    /// immediately re-triggering.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.consecutive_failures = 0;
        self.state = WakeState::Scanning;
    }

    /// Window contents, for tests and diagnostics.
    pub fn window(&self) -> &[f32] {
        self.buffer.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::level::calculate_rms;
    use crate::audio::resample::LinearResampler;
    use crate::audio::source::MockAudioSource;
    use crate::features::Features;
    use crate::wake::gallery::Template;

    /// Encodes the newest sample of the window as a one-frame feature.
    /// Fails on all-silence windows, like a real embedding would.
    #[derive(Debug)]
    struct LastSampleExtractor;

    impl FeatureExtractor for LastSampleExtractor {
        fn extract(&self, window: &[f32], _sample_rate: u32) -> Result<Features> {
            if calculate_rms(window) == 0.0 {
                return Err(WakegateError::Extraction {
                    message: "silent window".to_string(),
                });
            }
            let last = *window.last().unwrap_or(&0.0);
            Ok(Features::from_frames(vec![vec![last]]))
        }

        fn load_template(&self, path: &std::path::Path) -> Result<Features> {
            Err(WakegateError::TemplateLoad {
                path: path.display().to_string(),
                message: "not used in tests".to_string(),
            })
        }
    }

    /// Distance between the single frame values of two stub features.
    #[derive(Debug)]
    struct AbsScorer;

    impl DistanceScorer for AbsScorer {
        fn distance(&self, a: &Features, b: &Features) -> f32 {
            (a.frames()[0][0] - b.frames()[0][0]).abs()
        }
    }

    fn stub_template(name: &str, value: f32) -> Template {
        Template {
            name: name.to_string(),
            features: Features::from_frames(vec![vec![value]]),
        }
    }

    fn test_config() -> DetectorConfig {
        DetectorConfig {
            buffer_secs: 3.0,
            slide_secs: 0.25,
            native_rate: 48000,
            analysis_rate: 48000, // identity resample keeps the stub exact
            threshold: 0.04,
            max_extraction_failures: 40,
        }
    }

    #[test]
    fn triggers_on_first_step_below_threshold() {
        let gallery = TemplateGallery::from_templates(vec![stub_template("Sample1.wav", 0.0)])
            .expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        let slide_len = 12000;
        let mut script: Vec<Vec<f32>> = (0..12).map(|_| vec![0.5f32; slide_len]).collect();
        script.push(vec![0.01f32; slide_len]);
        let mut source = MockAudioSource::new()
            .with_script(script)
            .failing_after_script();

        let interrupt = AtomicBool::new(false);
        let result = detector.run(&mut source, &interrupt).expect("detection");

        assert_eq!(result.template, "Sample1.wav");
        assert!((result.distance - 0.01).abs() < 1e-6);
        assert_eq!(source.reads(), 13, "must trigger on the 13th iteration");
        assert_eq!(detector.state(), WakeState::Triggered);
    }

    #[test]
    fn does_not_trigger_at_exactly_threshold() {
        let gallery =
            TemplateGallery::from_templates(vec![stub_template("ref.wav", 0.0)]).expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        // Distance exactly at the threshold must not trigger (strictly below).
        let mut source = MockAudioSource::new().with_script(vec![vec![0.04f32; 12000]]);

        match detector.scan_step(&mut source).expect("step") {
            ScanOutcome::Score(best) => {
                assert!((best.distance - 0.04).abs() < 1e-6);
                assert!(best.distance >= test_config().threshold);
            }
            ScanOutcome::Skipped => panic!("step should have scored"),
        }
        assert_eq!(detector.state(), WakeState::Idle);
    }

    #[test]
    fn first_template_wins_ties() {
        let gallery = TemplateGallery::from_templates(vec![
            stub_template("first.wav", 0.0),
            stub_template("second.wav", 0.0),
        ])
        .expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        let mut source = MockAudioSource::new().with_script(vec![vec![0.01f32; 12000]]);
        let interrupt = AtomicBool::new(false);
        let result = detector.run(&mut source, &interrupt).expect("detection");

        assert_eq!(result.template, "first.wav");
    }

    #[test]
    fn extraction_failure_skips_the_step() {
        let gallery =
            TemplateGallery::from_templates(vec![stub_template("ref.wav", 0.0)]).expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        // All-zero chunk leaves the window silent: extraction fails, the
        // step is skipped, and scanning continues with the next chunk.
        let script = vec![vec![0.0f32; 12000], vec![0.01f32; 12000]];
        let mut source = MockAudioSource::new()
            .with_script(script)
            .failing_after_script();

        let interrupt = AtomicBool::new(false);
        let result = detector.run(&mut source, &interrupt).expect("detection");

        assert!((result.distance - 0.01).abs() < 1e-6);
        assert_eq!(source.reads(), 2);
    }

    #[test]
    fn consecutive_extraction_failures_exhaust_the_bound() {
        let gallery =
            TemplateGallery::from_templates(vec![stub_template("ref.wav", 0.0)]).expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let config = DetectorConfig {
            max_extraction_failures: 3,
            ..test_config()
        };
        let mut detector =
            WakeDetector::new(config, &gallery, &extractor, &scorer, &resampler).expect("detector");

        // Endless silence: every extraction fails.
        let mut source = MockAudioSource::new();
        let interrupt = AtomicBool::new(false);
        let err = detector.run(&mut source, &interrupt).unwrap_err();

        assert!(matches!(err, WakegateError::Source { .. }));
        assert_eq!(source.reads(), 3);
    }

    #[test]
    fn source_failure_is_fatal() {
        let gallery =
            TemplateGallery::from_templates(vec![stub_template("ref.wav", 0.0)]).expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        let mut source = MockAudioSource::new().with_read_failure();
        let interrupt = AtomicBool::new(false);
        let err = detector.run(&mut source, &interrupt).unwrap_err();

        assert!(matches!(err, WakegateError::Source { .. }));
    }

    #[test]
    fn interrupt_is_observed_before_the_first_read() {
        let gallery =
            TemplateGallery::from_templates(vec![stub_template("ref.wav", 0.0)]).expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        let mut source = MockAudioSource::new();
        let interrupt = AtomicBool::new(true);
        let err = detector.run(&mut source, &interrupt).unwrap_err();

        assert!(matches!(err, WakegateError::Interrupted));
        assert_eq!(source.reads(), 0);
    }

    #[test]
    fn reset_zeroes_window_and_resumes_scanning() {
        let gallery =
            TemplateGallery::from_templates(vec![stub_template("ref.wav", 0.0)]).expect("gallery");
        let extractor = LastSampleExtractor;
        let scorer = AbsScorer;
        let resampler = LinearResampler;
        let mut detector =
            WakeDetector::new(test_config(), &gallery, &extractor, &scorer, &resampler)
                .expect("detector");

        let mut source = MockAudioSource::new().with_script(vec![vec![0.01f32; 12000]]);
        let interrupt = AtomicBool::new(false);
        detector.run(&mut source, &interrupt).expect("detection");
        assert_eq!(detector.state(), WakeState::Triggered);
        assert!(detector.window().iter().any(|&s| s != 0.0));

        detector.reset();
        assert_eq!(detector.state(), WakeState::Scanning);
        assert!(detector.window().iter().all(|&s| s == 0.0));
    }
}
