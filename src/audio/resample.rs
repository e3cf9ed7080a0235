//! Sample-rate conversion between the native capture rate and the analysis rate.

/// Trait for sample-rate conversion.
///
/// Implementations must be pure and deterministic: the same input always
/// produces the same output. The detector calls this once per slide step and
/// the recorder once per finished utterance, so quality matters more than
/// per-call overhead here.
pub trait Resampler: Send + Sync {
    /// Convert `samples` from `from_rate` to `to_rate`.
    fn resample(&self, samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32>;
}

/// Linear-interpolation resampler.
///
/// Adequate for speech-band energy and envelope features; swap in a windowed
/// sinc implementation behind the trait if higher fidelity is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(&self, samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
        if from_rate == to_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = from_rate as f64 / to_rate as f64;
        let output_len = (samples.len() as f64 / ratio).ceil() as usize;

        (0..output_len)
            .map(|i| {
                let source_pos = i as f64 * ratio;
                let source_idx = source_pos.floor() as usize;
                let fraction = source_pos - source_idx as f64;

                if source_idx + 1 >= samples.len() {
                    samples[samples.len() - 1]
                } else {
                    let left = samples[source_idx] as f64;
                    let right = samples[source_idx + 1] as f64;
                    (left + (right - left) * fraction) as f32
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![0.1f32, 0.2, 0.3, 0.4, 0.5];
        let resampled = LinearResampler.resample(&samples, 16000, 16000);
        assert_eq!(resampled, samples);
    }

    #[test]
    fn resample_empty_input() {
        let resampled = LinearResampler.resample(&[], 48000, 16000);
        assert!(resampled.is_empty());
    }

    #[test]
    fn resample_downsample_length() {
        let samples = vec![0.0f32; 48000];
        let resampled = LinearResampler.resample(&samples, 48000, 16000);
        assert_eq!(resampled.len(), 16000);
    }

    #[test]
    fn resample_upsample_interpolates() {
        let samples = vec![0.0f32, 0.1, 0.2];
        let resampled = LinearResampler.resample(&samples, 8000, 16000);

        // Upsampling from 8kHz to 16kHz should double the sample count
        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0.0);
        assert!(resampled[1] > 0.0 && resampled[1] < 0.1);
    }

    #[test]
    fn resample_is_deterministic() {
        let samples: Vec<f32> = (0..4800).map(|i| (i as f32 / 100.0).sin()).collect();
        let a = LinearResampler.resample(&samples, 48000, 16000);
        let b = LinearResampler.resample(&samples, 48000, 16000);
        assert_eq!(a, b);
    }
}
