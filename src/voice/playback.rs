//! Audio output
//!
//! The avatar has a single audio channel: playing a new clip stops the
//! previous one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::AudioClip;
use crate::{Error, Result};

/// Destination for the avatar's voice
pub trait AudioSink {
    /// Start playing `clip`, replacing whatever is playing
    ///
    /// # Errors
    ///
    /// Returns error if playback cannot start
    fn play(&mut self, clip: &AudioClip) -> Result<()>;

    /// Stop the current clip, if any
    fn stop(&mut self) {}
}

/// Sink that only logs; used when no audio device is wanted
#[derive(Debug, Default)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        tracing::debug!(duration = clip.duration(), "audio clip (silent)");
        Ok(())
    }
}

/// Plays clips on the default output device
pub struct SpeakerSink {
    config: StreamConfig,
    current: Option<Arc<AtomicBool>>,
}

impl SpeakerSink {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns error if no output device or config is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| Error::Audio(e.to_string()))?
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self {
            config,
            current: None,
        })
    }
}

impl AudioSink for SpeakerSink {
    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        self.stop();

        let samples = clip.resampled(self.config.sample_rate.0)?;
        if samples.is_empty() {
            return Ok(());
        }

        let stop = Arc::new(AtomicBool::new(false));
        self.current = Some(Arc::clone(&stop));
        let config = self.config.clone();

        std::thread::Builder::new()
            .name("puppeteer-audio".to_string())
            .spawn(move || {
                if let Err(e) = play_samples_blocking(&config, samples, &stop) {
                    tracing::error!(error = %e, "audio playback failed");
                }
            })?;

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(flag) = self.current.take() {
            flag.store(true, Ordering::Release);
        }
    }
}

impl Drop for SpeakerSink {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Play mono samples until finished or stopped
fn play_samples_blocking(config: &StreamConfig, samples: Vec<f32>, stop: &AtomicBool) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let channels = usize::from(config.channels);
    let sample_count = samples.len();
    let samples = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let finished = Arc::clone(&finished);

        device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = position.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = samples.get(pos).copied().unwrap_or_else(|| {
                            finished.store(true, Ordering::Release);
                            0.0
                        });
                        frame.fill(sample);
                        pos = (pos + 1).min(samples.len());
                    }
                    position.store(pos, Ordering::Relaxed);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?
    };

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let duration_ms = (sample_count as u64 * 1000) / u64::from(config.sample_rate.0);
    let timeout = Duration::from_millis(duration_ms + 500);
    let start = Instant::now();

    while !finished.load(Ordering::Acquire) && !stop.load(Ordering::Acquire) {
        if start.elapsed() > timeout {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
    tracing::debug!(samples = sample_count, "playback complete");

    Ok(())
}
