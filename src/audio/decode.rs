use anyhow::{Context, Result};
use rodio::{Decoder, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use log::info;

/// Mono audio ready for analysis.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode any format rodio/symphonia understands (WAV, MP3, M4A, OGG, ...)
/// and mix it down to mono f32 in -1.0..1.0.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
    let path = path.as_ref();
    let file = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open audio file {}", path.display()))?,
    );
    let source = Decoder::new(file)
        .with_context(|| format!("Failed to decode audio file {}", path.display()))?;

    let sample_rate = source.sample_rate();
    let channels = source.channels();
    let samples: Vec<i16> = source.convert_samples().collect();

    let samples = mix_to_mono(&samples, channels);
    info!(
        "Decoded {}: {} Hz, {} channel(s), {} mono samples",
        path.display(),
        sample_rate,
        channels,
        samples.len()
    );

    Ok(DecodedAudio { samples, sample_rate })
}

/// Average interleaved i16 frames into one f32 channel. A trailing partial
/// frame is dropped.
pub fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: f32 = chunk.iter().map(|&s| s as f32 / 32768.0).sum();
            sum / channels as f32
        })
        .collect()
}
