//! Reference sample preparation.
//!
//! Raw wake-phrase recordings come in at whatever rate and length the
//! operator captured them. Before they can serve as gallery templates they
//! are resampled to the analysis rate and padded or trimmed to a uniform
//! duration, so template distances are comparable across the gallery.

use crate::audio::resample::Resampler;
use crate::dispatch::write_wav;
use crate::error::{Result, WakegateError};
use std::path::Path;

/// Resample and length-normalize one recording.
///
/// Returns exactly `target_rate * target_secs` samples: short recordings are
/// zero-padded at the end, long ones are trimmed.
pub fn prepare_sample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
    target_secs: f32,
    resampler: &dyn Resampler,
) -> Vec<f32> {
    let mut prepared = resampler.resample(samples, source_rate, target_rate);
    let target_len = (target_rate as f32 * target_secs) as usize;
    prepared.resize(target_len, 0.0);
    prepared
}

/// Prepare every `.wav` in `input_dir` and write the results into
/// `output_dir`, keeping file names. Returns the number of files written.
///
/// # Errors
/// Fails if a recording cannot be read or a result cannot be written; a
/// directory yielding zero prepared samples is an error, since the gallery
/// it feeds would be unusable.
pub fn prepare_dir(
    input_dir: &Path,
    output_dir: &Path,
    target_rate: u32,
    target_secs: f32,
    resampler: &dyn Resampler,
) -> Result<usize> {
    let mut paths: Vec<_> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    std::fs::create_dir_all(output_dir)?;

    let mut written = 0usize;
    for path in &paths {
        let (samples, source_rate) = read_wav(path)?;
        let prepared = prepare_sample(&samples, source_rate, target_rate, target_secs, resampler);

        let name = path
            .file_name()
            .ok_or_else(|| WakegateError::TemplateLoad {
                path: path.display().to_string(),
                message: "path has no file name".to_string(),
            })?;
        write_wav(&output_dir.join(name), &prepared, target_rate)?;
        written += 1;
    }

    if written == 0 {
        return Err(WakegateError::EmptyGallery {
            dir: input_dir.display().to_string(),
        });
    }
    Ok(written)
}

/// Read a WAV file as normalized mono floats plus its sample rate.
fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let load_error = |message: String| WakegateError::TemplateLoad {
        path: path.display().to_string(),
        message,
    };

    let mut reader =
        hound::WavReader::open(path).map_err(|e| load_error(format!("failed to open: {}", e)))?;
    let spec = reader.spec();

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| load_error(format!("failed to read samples: {}", e)))?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| load_error(format!("failed to read samples: {}", e)))?,
    };

    let mono: Vec<f32> = if spec.channels > 1 {
        raw.chunks_exact(spec.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / spec.channels as f32)
            .collect()
    } else {
        raw
    };

    Ok((mono, spec.sample_rate))
}
