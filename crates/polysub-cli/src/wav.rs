//! WAV output.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Mono WAV spec at `sample_rate` with `bits_per_sample` of 16, 24 or 32
/// (32 writes float samples).
pub fn mono_spec(sample_rate: u32, bits_per_sample: u16) -> anyhow::Result<WavSpec> {
    if !matches!(bits_per_sample, 16 | 24 | 32) {
        anyhow::bail!("unsupported bit depth {bits_per_sample} (expected 16, 24 or 32)");
    }
    Ok(WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    })
}

/// Write samples in `[-1, 1]` to a WAV file.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], spec: WavSpec) -> anyhow::Result<()> {
    let mut writer = WavWriter::create(path, spec)?;
    if spec.sample_format == SampleFormat::Float {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }
    writer.finalize()?;
    Ok(())
}
