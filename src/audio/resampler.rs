//! Mono downmixing, resampling and WAV encoding of captured audio

use super::types::AudioCaptureError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::io::Cursor;
use tracing::debug;

/// Frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Convert interleaved frames to mono by averaging channels
pub(crate) fn downmix(data: &[i16], channels: usize) -> Vec<i16> {
    if channels > 1 {
        data.chunks(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    } else {
        data.to_vec()
    }
}

/// Convert a float sample to 16-bit PCM
pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Resample a whole mono recording
pub(crate) fn resample(
    samples: &[i16],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<i16>, AudioCaptureError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| AudioCaptureError::Encoding(format!("Failed to create resampler: {}", e)))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(expected + RESAMPLE_CHUNK);

    for chunk in samples.chunks(RESAMPLE_CHUNK) {
        // The last chunk is zero-padded; the tail is trimmed below
        let mut input: Vec<f32> = chunk.iter().map(|&s| s as f32 / 32768.0).collect();
        input.resize(RESAMPLE_CHUNK, 0.0);

        let resampled = resampler
            .process(&[input], None)
            .map_err(|e| AudioCaptureError::Encoding(format!("Resampling error: {}", e)))?;
        output.extend(resampled[0].iter().map(|&s| f32_to_i16(s)));
    }

    output.truncate(expected);
    debug!(
        from_rate,
        to_rate,
        input = samples.len(),
        output = output.len(),
        "Resampled recording"
    );
    Ok(output)
}

/// Encode mono 16-bit samples as a WAV file in memory
pub(crate) fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, AudioCaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
