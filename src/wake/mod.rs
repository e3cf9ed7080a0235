//! Wake-phrase detection and voice-activity-gated utterance capture.

pub mod buffer;
pub mod detector;
pub mod gallery;
pub mod recorder;
