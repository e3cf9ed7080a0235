//! Session orchestration: the composition root for the capture front-end.
//!
//! Wires the capability providers into the two state machines and runs the
//! original device loop: scan until the wake phrase triggers, capture one
//! gated utterance, dispatch it, zero the buffer, resume scanning. Also hosts
//! the distance monitor used for threshold tuning.

use crate::audio::resample::Resampler;
use crate::audio::source::AudioSource;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{Result, WakegateError};
use crate::features::{DistanceScorer, FeatureExtractor};
use crate::wake::detector::{ScanOutcome, WakeDetector};
use crate::wake::gallery::TemplateGallery;
use crate::wake::recorder::UtteranceRecorder;
use std::io::Write;
use std::sync::atomic::AtomicBool;

/// Options controlling a detection session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Exit after the first dispatched utterance.
    pub once: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Run the wake-detect / capture / dispatch loop until interrupted.
///
/// The source is started here and stopped on every exit path, including
/// interrupt and fatal-error exits. An operator interrupt is a clean
/// shutdown, not an error. A failed capture discards its partial audio and
/// resumes scanning; it never takes the session down.
#[allow(clippy::too_many_arguments)]
pub fn run_session(
    config: &Config,
    gallery: &TemplateGallery,
    source: &mut dyn AudioSource,
    extractor: &dyn FeatureExtractor,
    scorer: &dyn DistanceScorer,
    resampler: &dyn Resampler,
    dispatcher: &mut dyn Dispatcher,
    interrupt: &AtomicBool,
    options: SessionOptions,
) -> Result<()> {
    config.validate()?;

    let mut detector = WakeDetector::new(
        config.detector_config(),
        gallery,
        extractor,
        scorer,
        resampler,
    )?;
    let recorder = UtteranceRecorder::new(config.recorder_config())?;

    source.start()?;
    let outcome = session_loop(
        config,
        &mut detector,
        &recorder,
        source,
        resampler,
        dispatcher,
        interrupt,
        options,
    );
    let stopped = source.stop();

    match outcome {
        Ok(()) | Err(WakegateError::Interrupted) => stopped,
        Err(e) => {
            // Source cleanup already attempted; the loop error is primary.
            drop(stopped);
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn session_loop(
    config: &Config,
    detector: &mut WakeDetector<'_>,
    recorder: &UtteranceRecorder,
    source: &mut dyn AudioSource,
    resampler: &dyn Resampler,
    dispatcher: &mut dyn Dispatcher,
    interrupt: &AtomicBool,
    options: SessionOptions,
) -> Result<()> {
    if !options.quiet {
        println!("Listening for the wake phrase...");
    }

    loop {
        let detection = detector.run(source, interrupt)?;
        if !options.quiet {
            println!(
                "Wake phrase detected ({}, distance {:.4})",
                detection.template, detection.distance
            );
        }

        // Source ownership hands over to the recorder for one capture
        // session, then returns to the detector.
        match recorder.capture(source, resampler, interrupt) {
            Ok(samples) => {
                dispatcher.dispatch(&detection, &samples, config.audio.analysis_rate)?;
                detector.reset();
                if options.once {
                    return Ok(());
                }
            }
            Err(WakegateError::Capture { message }) => {
                // Partial audio is already discarded; scanning resumes.
                eprintln!("wakegate: capture aborted: {}", message);
                detector.reset();
            }
            Err(e) => return Err(e),
        }

        if !options.quiet {
            println!("Listening for the wake phrase...");
        }
    }
}

/// Run the scan loop reporting per-step distances instead of triggering.
///
/// Threshold-tuning aid: prints the best-matching template and its distance
/// for every slide step until interrupted.
pub fn run_monitor(
    config: &Config,
    gallery: &TemplateGallery,
    source: &mut dyn AudioSource,
    extractor: &dyn FeatureExtractor,
    scorer: &dyn DistanceScorer,
    resampler: &dyn Resampler,
    interrupt: &AtomicBool,
) -> Result<()> {
    config.validate()?;

    let mut detector = WakeDetector::new(
        config.detector_config(),
        gallery,
        extractor,
        scorer,
        resampler,
    )?;

    source.start()?;
    let outcome = monitor_loop(config, &mut detector, source, interrupt);
    let stopped = source.stop();

    match outcome {
        Ok(()) | Err(WakegateError::Interrupted) => {
            eprintln!();
            stopped
        }
        Err(e) => {
            drop(stopped);
            Err(e)
        }
    }
}

fn monitor_loop(
    config: &Config,
    detector: &mut WakeDetector<'_>,
    source: &mut dyn AudioSource,
    interrupt: &AtomicBool,
) -> Result<()> {
    eprintln!(
        "Monitoring distances (threshold {:.4}); Ctrl-C to stop",
        config.wake.threshold
    );

    loop {
        if interrupt.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(WakegateError::Interrupted);
        }

        match detector.scan_step(source)? {
            ScanOutcome::Skipped => {
                eprint!("\r  [skip] window not scorable                    ");
            }
            ScanOutcome::Score(best) => {
                let marker = if best.distance < config.wake.threshold {
                    "<< below threshold"
                } else {
                    ""
                };
                eprint!(
                    "\r  distance {:.4} ({}) {}        ",
                    best.distance, best.template, marker
                );
            }
        }
        std::io::stderr().flush().ok();
    }
}
