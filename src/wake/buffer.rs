//! Sliding match buffer over the most recent span of audio.
//!
//! A fixed-length window refreshed one slide increment at a time: the oldest
//! chunk-length of samples is discarded and the new chunk is appended, a
//! strict FIFO shift. The window always holds the most recent buffer-duration
//! seconds of audio in chronological order, oldest first.

use crate::error::{Result, WakegateError};

/// Fixed-duration sliding window at the native sample rate.
#[derive(Debug, Clone)]
pub struct MatchBuffer {
    window: Vec<f32>,
    slide_len: usize,
}

impl MatchBuffer {
    /// Allocate a zero-filled window of `buffer_secs` at `native_rate`,
    /// advanced in increments of `slide_secs`.
    pub fn new(buffer_secs: f32, slide_secs: f32, native_rate: u32) -> Result<Self> {
        let window_len = (buffer_secs * native_rate as f32) as usize;
        let slide_len = (slide_secs * native_rate as f32) as usize;

        if slide_len == 0 {
            return Err(WakegateError::ConfigInvalidValue {
                key: "wake.slide_secs".to_string(),
                message: "slide increment must cover at least one sample".to_string(),
            });
        }
        if window_len < slide_len {
            return Err(WakegateError::ConfigInvalidValue {
                key: "wake.buffer_secs".to_string(),
                message: "buffer must be at least one slide increment long".to_string(),
            });
        }

        Ok(Self {
            window: vec![0.0; window_len],
            slide_len,
        })
    }

    /// Shift one chunk into the window: drop the oldest `chunk.len()` samples,
    /// append the chunk at the end.
    ///
    /// # Errors
    /// Returns [`WakegateError::SizeMismatch`] if the chunk length is not the
    /// configured slide increment. The window is untouched in that case.
    pub fn slide(&mut self, chunk: &[f32]) -> Result<()> {
        if chunk.len() != self.slide_len {
            return Err(WakegateError::SizeMismatch {
                expected: self.slide_len,
                actual: chunk.len(),
            });
        }

        let keep = self.window.len() - self.slide_len;
        self.window.copy_within(self.slide_len.., 0);
        self.window[keep..].copy_from_slice(chunk);
        Ok(())
    }

    /// Current window contents without mutation, oldest sample first.
    pub fn snapshot(&self) -> &[f32] {
        &self.window
    }

    /// Zero-fill the window.
    ///
    /// Used after a successful trigger so the tail of the triggering
    /// utterance cannot cause a spurious re-detection.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
    }

    /// Number of samples in one slide increment.
    pub fn slide_len(&self) -> usize {
        self.slide_len
    }

    /// Total window length in samples.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True if the window holds no samples (never the case after `new`).
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
