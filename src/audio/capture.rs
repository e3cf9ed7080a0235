//! Real audio capture using CPAL (Cross-Platform Audio Library).

use crate::audio::resample::{LinearResampler, Resampler};
use crate::audio::source::AudioSource;
use crate::error::{Result, WakegateError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA error messages that occur during audio backend probing.
/// These are harmless but confusing to users.
///
/// Must be called at startup, before any threads are spawned.
pub fn suppress_audio_warnings() {
    std::env::set_var("JACK_NO_START_SERVER", "1");
    std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
    std::env::set_var("PIPEWIRE_DEBUG", "0");
    std::env::set_var("ALSA_DEBUG", "0");
    std::env::set_var("PW_LOG", "0");
}

/// Preferred device names for PipeWire/PulseAudio environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns to filter out (not useful for voice input).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List all available audio input devices with filtering and recommendations.
///
/// # Returns
/// A vector of device names, with preferred devices marked with "\[recommended\]".
/// Filters out obviously unusable devices (surround channels, HDMI, etc.).
///
/// # Errors
/// Returns `WakegateError::Source` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| WakegateError::Source {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }

            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Get the best default input device, preferring PipeWire/PulseAudio.
///
/// This ensures we respect the desktop's audio device selection.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name() {
                    if is_preferred_device(&name) {
                        return Ok(device);
                    }
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| WakegateError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only accessed from a single thread at a time through
/// the Mutex wrapper in CpalAudioSource. The stream methods are called
/// synchronously and don't cross thread boundaries unsafely.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Real audio capture implementation using CPAL.
///
/// Captures mono float samples at the configured native rate. Tries the
/// preferred format first (f32/native-rate/mono), then i16 with conversion,
/// then the device's default config with software channel mixing and
/// resampling. The last path handles PipeWire-ALSA setups that accept
/// non-native configs but never fire the data callback.
pub struct CpalAudioSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    buffer: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    poll_interval: Duration,
}

impl CpalAudioSource {
    /// Create a new CPAL audio source capturing at `sample_rate`.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the best default
    ///   input device (prefers PipeWire/PulseAudio).
    ///
    /// # Errors
    /// Returns `AudioDeviceNotFound` if the named device does not exist, or
    /// `Source` if device enumeration fails.
    pub fn new(device_name: Option<&str>, sample_rate: u32) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host.input_devices().map_err(|e| WakegateError::Source {
                    message: format!("Failed to enumerate devices: {}", e),
                })?;

                let mut found_device = None;
                for dev in devices {
                    if let Ok(dev_name) = dev.name() {
                        if dev_name == name {
                            found_device = Some(dev);
                            break;
                        }
                    }
                }

                found_device.ok_or_else(|| WakegateError::AudioDeviceNotFound {
                    device: name.to_string(),
                })
            } else {
                get_best_default_device()
            }
        })?;

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
            poll_interval: Duration::from_millis(10),
        })
    }

    /// Build the audio stream with the configured format.
    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        // Try f32/native-rate/mono — PipeWire/PulseAudio convert transparently
        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Try i16/native-rate/mono — for devices that only expose integer formats
        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.build_stream_native()
    }

    /// Build a stream using the device's default/native config, with software
    /// channel mixing (stereo→mono) and resampling (device rate→native rate).
    fn build_stream_native(&self) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| WakegateError::Source {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let device_rate = default_config.sample_rate().0;
        let device_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;

        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "wakegate: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            device_channels,
            device_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        let buffer = Arc::clone(&self.buffer);

        match default_config.sample_format() {
            SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted =
                            convert_to_mono_rate(data, device_channels, device_rate, target_rate);
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| WakegateError::Source {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let float_data: Vec<f32> =
                            data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                        let converted = convert_to_mono_rate(
                            &float_data,
                            device_channels,
                            device_rate,
                            target_rate,
                        );
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| WakegateError::Source {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            fmt => Err(WakegateError::Source {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        let stream = self.build_stream()?;
        stream.play().map_err(|e| WakegateError::Source {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        if let Ok(mut guard) = self.stream.lock() {
            *guard = Some(SendableStream(stream));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Ok(mut guard) = self.stream.lock() {
            *guard = None; // dropping the stream stops capture
        }
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
        Ok(())
    }

    fn read_chunk(&mut self, len: usize) -> Result<Vec<f32>> {
        loop {
            {
                let stream_alive = self
                    .stream
                    .lock()
                    .map(|guard| guard.is_some())
                    .unwrap_or(false);
                if !stream_alive {
                    return Err(WakegateError::Source {
                        message: "audio stream is not running".to_string(),
                    });
                }

                let mut buf = self.buffer.lock().map_err(|_| WakegateError::Source {
                    message: "audio buffer lock poisoned".to_string(),
                })?;
                if buf.len() >= len {
                    let chunk: Vec<f32> = buf.drain(..len).collect();
                    return Ok(chunk);
                }
            }
            // Not enough samples yet; the callback thread is still filling.
            std::thread::sleep(self.poll_interval);
        }
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_rate(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let mono: Vec<f32> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    LinearResampler.resample(&mono, source_rate, target_rate)
}
