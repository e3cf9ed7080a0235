use crate::error::{Result, WakegateError};
use std::collections::VecDeque;

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device vs mock).
/// Exactly one state machine owns the source at any time: the wake detector
/// during scanning, the recorder during a capture session. Ownership is
/// handed over sequentially, never shared.
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    ///
    /// Whoever called [`AudioSource::start`] must call this on every exit
    /// path, including interrupt and fatal-error exits.
    fn stop(&mut self) -> Result<()>;

    /// Read exactly `len` samples at the native rate, blocking until they
    /// are available.
    ///
    /// # Errors
    /// Returns [`WakegateError::Source`] on hardware/stream failure. Source
    /// failures are fatal for the session; they are not retried here.
    fn read_chunk(&mut self, len: usize) -> Result<Vec<f32>>;
}

/// Mock audio source for testing.
///
/// Plays back a script of chunks, then either repeats a fill value or fails,
/// depending on configuration.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    script: VecDeque<Vec<f32>>,
    fill: f32,
    should_fail_start: bool,
    should_fail_stop: bool,
    should_fail_read: bool,
    fail_after_script: bool,
    error_message: String,
    reads: usize,
}

impl MockAudioSource {
    /// Create a new mock audio source that returns silence forever.
    pub fn new() -> Self {
        Self {
            is_started: false,
            script: VecDeque::new(),
            fill: 0.0,
            should_fail_start: false,
            should_fail_stop: false,
            should_fail_read: false,
            fail_after_script: false,
            error_message: "mock audio error".to_string(),
            reads: 0,
        }
    }

    /// Configure the mock to play back the given chunks in order.
    pub fn with_script(mut self, chunks: Vec<Vec<f32>>) -> Self {
        self.script = chunks.into();
        self
    }

    /// Configure the sample value returned once the script is exhausted.
    pub fn with_fill(mut self, fill: f32) -> Self {
        self.fill = fill;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on stop.
    pub fn with_stop_failure(mut self) -> Self {
        self.should_fail_stop = true;
        self
    }

    /// Configure the mock to fail on every read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the mock to fail on the first read past the end of the script.
    pub fn failing_after_script(mut self) -> Self {
        self.fail_after_script = true;
        self
    }

    /// Configure the error message for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Number of successful reads served so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    fn source_error(&self) -> WakegateError {
        WakegateError::Source {
            message: self.error_message.clone(),
        }
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(self.source_error());
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.should_fail_stop {
            return Err(self.source_error());
        }
        self.is_started = false;
        Ok(())
    }

    fn read_chunk(&mut self, len: usize) -> Result<Vec<f32>> {
        if self.should_fail_read {
            return Err(self.source_error());
        }

        let chunk = match self.script.pop_front() {
            Some(mut chunk) => {
                // Honor the requested length regardless of script granularity.
                chunk.resize(len, self.fill);
                chunk
            }
            None if self.fail_after_script => return Err(self.source_error()),
            None => vec![self.fill; len],
        };

        self.reads += 1;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_source_plays_script_in_order() {
        let mut source =
            MockAudioSource::new().with_script(vec![vec![0.1f32; 4], vec![0.2f32; 4]]);

        assert_eq!(source.read_chunk(4).unwrap(), vec![0.1f32; 4]);
        assert_eq!(source.read_chunk(4).unwrap(), vec![0.2f32; 4]);
        // Script exhausted: silence
        assert_eq!(source.read_chunk(4).unwrap(), vec![0.0f32; 4]);
        assert_eq!(source.reads(), 3);
    }

    #[test]
    fn mock_source_resizes_script_chunks() {
        let mut source = MockAudioSource::new().with_script(vec![vec![0.5f32; 2]]);
        let chunk = source.read_chunk(4).unwrap();
        assert_eq!(chunk, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn mock_source_fails_after_script_when_configured() {
        let mut source = MockAudioSource::new()
            .with_script(vec![vec![0.1f32; 4]])
            .failing_after_script();

        assert!(source.read_chunk(4).is_ok());
        let err = source.read_chunk(4).unwrap_err();
        assert!(matches!(err, WakegateError::Source { .. }));
    }

    #[test]
    fn mock_source_read_failure() {
        let mut source = MockAudioSource::new()
            .with_read_failure()
            .with_error_message("buffer overflow");

        match source.read_chunk(4) {
            Err(WakegateError::Source { message }) => assert_eq!(message, "buffer overflow"),
            other => panic!("Expected Source error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn mock_source_start_stop_tracking() {
        let mut source = MockAudioSource::new();
        assert!(!source.is_started());
        source.start().unwrap();
        assert!(source.is_started());
        source.stop().unwrap();
        assert!(!source.is_started());
    }

    #[test]
    fn mock_source_start_failure() {
        let mut source = MockAudioSource::new().with_start_failure();
        assert!(source.start().is_err());
    }
}
