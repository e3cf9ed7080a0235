//! Default configuration constants for wakegate.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default native sample rate of the microphone in Hz.
///
/// 48kHz is the native rate of the USB microphones the device ships with.
/// All capture happens at this rate; analysis happens at [`ANALYSIS_SAMPLE_RATE`].
pub const NATIVE_SAMPLE_RATE: u32 = 48000;

/// Default analysis sample rate in Hz.
///
/// 16kHz is the standard for speech processing. Windows are resampled from
/// the native rate to this rate before feature extraction, and captured
/// utterances are resampled to it once at the end of a recording session.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16000;

/// Default sliding match buffer duration in seconds.
///
/// Reference recordings are a uniform 2.5 seconds; the buffer adds half a
/// second of slack so the phrase is never clipped at a window edge.
pub const BUFFER_SECS: f32 = 3.0;

/// Default slide increment in seconds.
///
/// Each detection step pulls this much new audio and shifts it into the
/// buffer. Smaller values react faster but cost more extraction calls.
pub const SLIDE_SECS: f32 = 0.25;

/// Default wake detection threshold.
///
/// A slide step triggers when the minimum template distance falls strictly
/// below this value. Smaller is stricter. Use `wakegate monitor` to tune it
/// against your own reference recordings.
pub const WAKE_THRESHOLD: f32 = 0.04;

/// Default Voice Activity Detection (VAD) energy threshold.
///
/// RMS-based threshold (0.0 to 1.0) deciding whether a capture chunk counts
/// as speech. Used for both recording onset and silence offset.
pub const VAD_THRESHOLD: f32 = 0.01;

/// Default silence duration in seconds before a recording is considered ended.
///
/// The sub-threshold run must be contiguous; any energy spike resets it.
pub const SILENCE_SECS: f32 = 1.5;

/// Default minimum utterance duration in seconds.
///
/// Silence never ends a recording before this much audio has accumulated.
pub const MIN_CAPTURE_SECS: f32 = 0.5;

/// Default maximum utterance duration in seconds.
///
/// Safety ceiling: the recorder stops unconditionally once this much audio
/// has accumulated, whether or not silence was detected.
pub const MAX_CAPTURE_SECS: f32 = 5.0;

/// Default capture chunk duration in seconds.
///
/// Granularity of the recorder's energy gate (about 0.1s, 4800 samples at
/// 48kHz). Independent of the detector's slide increment.
pub const CAPTURE_CHUNK_SECS: f32 = 0.1;

/// Default bound on consecutive feature-extraction failures.
///
/// Extraction failures are transient and skipped, but this many in a row
/// (10 seconds of slide steps at the default increment) means the source is
/// delivering unusable audio and the loop terminates instead of spinning.
pub const MAX_EXTRACTION_FAILURES: u32 = 40;

/// Default uniform duration for prepared reference recordings, in seconds.
///
/// `wakegate prepare` pads or trims every sample to this length so template
/// distances are comparable across the gallery.
pub const REFERENCE_SECS: f32 = 2.5;

/// Default directory of prepared reference recordings.
pub const TEMPLATES_DIR: &str = "./voice_examples_16k";

/// Default directory captured utterances are written into.
pub const CAPTURES_DIR: &str = "./captures";
