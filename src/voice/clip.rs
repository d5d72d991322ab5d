//! Decoded audio clips

use std::io::Cursor;

use crate::{Error, Result};

/// Mono audio clip with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap mono f32 samples
    ///
    /// # Errors
    ///
    /// Returns error if the sample rate is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::Audio("sample rate must be positive".to_string()));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Decode WAV bytes, falling back to MP3
    ///
    /// # Errors
    ///
    /// Returns error if the payload is neither valid WAV nor MP3
    pub fn decode(data: &[u8]) -> Result<Self> {
        match decode_wav(data) {
            Ok(clip) => Ok(clip),
            Err(wav_err) => {
                tracing::debug!(error = %wav_err, "not a WAV payload, trying MP3");
                decode_mp3(data)
            }
        }
    }

    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback length in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Samples converted to `rate`
    ///
    /// # Errors
    ///
    /// Returns error if the resampler cannot be built
    pub fn resampled(&self, rate: u32) -> Result<Vec<f32>> {
        if rate == self.sample_rate {
            return Ok(self.samples.clone());
        }
        resample(&self.samples, self.sample_rate, rate)
    }
}

/// Decode WAV bytes to a mono clip
#[allow(clippy::cast_precision_loss)]
fn decode_wav(data: &[u8]) -> Result<AudioClip> {
    let reader = hound::WavReader::new(Cursor::new(data)).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(e.to_string()))?
        }
    };

    AudioClip::new(downmix(&interleaved, usize::from(spec.channels)), spec.sample_rate)
}

/// Decode MP3 bytes to a mono clip
#[allow(clippy::cast_sign_loss)]
fn decode_mp3(mp3_data: &[u8]) -> Result<AudioClip> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0_u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate as u32;
                let frame_samples: Vec<f32> =
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                samples.extend(downmix(&frame_samples, frame.channels));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(Error::Audio("unsupported audio payload".to_string()));
    }

    AudioClip::new(samples, sample_rate)
}

/// Average interleaved channels down to mono
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    #[allow(clippy::cast_precision_loss)]
    let count = channels as f32;
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / count)
        .collect()
}

/// Resample mono audio using rubato
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    let chunk_size = 1024;
    let sub_chunks = 2;

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, chunk_size, sub_chunks, 1)
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let expected = (samples.len() as f64 * f64::from(to_rate) / f64::from(from_rate)) as usize;
    let mut output = Vec::with_capacity(expected);

    for chunk in samples.chunks(chunk_size) {
        let mut block: Vec<f64> = chunk.iter().map(|&s| f64::from(s)).collect();
        // Pad the tail so the final partial chunk is not dropped
        block.resize(chunk_size, 0.0);

        let result = resampler
            .process(&[block], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend(result[0].iter().map(|&s| s as f32));
    }

    output.truncate(expected);
    Ok(output)
}
