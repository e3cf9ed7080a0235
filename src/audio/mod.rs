//! Audio input, level measurement and sample-rate conversion.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod level;
pub mod resample;
pub mod source;
