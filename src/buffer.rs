//! Decoded audio: interleaved normalized `f32` samples.

use std::time::Duration;

use crate::error::{FormatError, Result};

/// An immutable block of interleaved audio.
///
/// Samples are frame-major: `[L0, R0, L1, R1, ...]` for stereo. Values are
/// nominally in `[-1.0, 1.0]` but are never clamped.
///
/// The default value is the empty buffer (zero channels, zero rate); any
/// buffer built with [`SampleBuffer::new`] or produced by the decoder has
/// `samples.len() == channels * frames`. The empty buffer cannot be encoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    channels: u16,
    sample_rate: u32,
    frames: u32,
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Build a buffer from caller-supplied parts.
    pub fn new(channels: u16, sample_rate: u32, frames: u32, samples: Vec<f32>) -> Result<Self> {
        if channels < 1 {
            return Err(FormatError::invalid_construction("channel count must be at least 1"));
        }
        if sample_rate == 0 {
            return Err(FormatError::invalid_construction("sample rate must be non-zero"));
        }
        let expected = channels as usize * frames as usize;
        if samples.len() != expected {
            return Err(FormatError::invalid_construction(format!(
                "expected {expected} samples ({channels} channels x {frames} frames), got {}",
                samples.len()
            )));
        }

        Ok(SampleBuffer {
            channels,
            sample_rate,
            frames,
            samples,
        })
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Frames per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Read-only view of the interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length. Zero for the empty buffer.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }

    /// Iterate frame by frame, each item holding one sample per channel.
    pub fn frames_iter(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.chunks_exact(self.channels.max(1) as usize)
    }
}
