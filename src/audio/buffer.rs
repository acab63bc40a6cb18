use std::sync::Arc;
use thiserror::Error;

/// Shared, immutable handle used by history snapshots, the clipboard and segments.
pub type SharedBuffer = Arc<PcmBuffer>;

/// Upper bound on channels. Keeps the 16-bit WAV block align within a `u16`.
pub const MAX_CHANNELS: u16 = 1024;

/// Upper bound on sample rate. With [`MAX_CHANNELS`] the WAV byte rate still fits a `u32`.
pub const MAX_SAMPLE_RATE: u32 = 1 << 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("Buffer must have at least one channel")]
    NoChannels,

    #[error("Channel {channel} has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("{0} channels exceeds the limit of {max}", max = MAX_CHANNELS)]
    TooManyChannels(usize),

    #[error("Sample rate {0} Hz exceeds the limit of {max} Hz", max = MAX_SAMPLE_RATE)]
    SampleRateTooHigh(u32),
}

/// Planar multi-channel f32 audio at a fixed sample rate.
///
/// Every channel holds exactly `len()` samples. There is always at least
/// one channel and at most [`MAX_CHANNELS`], and the sample rate lies in
/// `1..=MAX_SAMPLE_RATE`, so every buffer has a valid WAV header. Samples
/// are finite: construction replaces NaN with silence and saturates
/// infinities to full scale.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        if sample_rate > MAX_SAMPLE_RATE {
            return Err(BufferError::SampleRateTooHigh(sample_rate));
        }
        if channels.len() > usize::from(MAX_CHANNELS) {
            return Err(BufferError::TooManyChannels(channels.len()));
        }
        let expected = match channels.first() {
            Some(first) => first.len(),
            None => return Err(BufferError::NoChannels),
        };
        for (channel, data) in channels.iter().enumerate() {
            if data.len() != expected {
                return Err(BufferError::ChannelLengthMismatch {
                    channel,
                    expected,
                    actual: data.len(),
                });
            }
        }

        for data in channels.iter_mut() {
            for sample in data.iter_mut().filter(|s| !s.is_finite()) {
                *sample = clamp_sample(*sample);
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// For callers that already uphold the shape invariants.
    pub(crate) fn from_parts(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(!channels.is_empty());
        debug_assert!(channels.len() <= usize::from(MAX_CHANNELS));
        debug_assert!((1..=MAX_SAMPLE_RATE).contains(&sample_rate));
        debug_assert!(channels.iter().all(|c| c.len() == channels[0].len()));
        Self {
            channels,
            sample_rate,
        }
    }

    /// All-zero buffer. `num_channels` and `sample_rate` are clamped into their valid ranges.
    pub fn silent(num_channels: usize, len: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![vec![0.0; len]; num_channels.clamp(1, usize::from(MAX_CHANNELS))],
            sample_rate: sample_rate.clamp(1, MAX_SAMPLE_RATE),
        }
    }

    /// Zero-length mono buffer.
    pub fn empty(sample_rate: u32) -> Self {
        Self::silent(1, 0, sample_rate)
    }

    /// De-interleave frames of `num_channels` samples. A trailing partial frame is dropped.
    pub fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if num_channels == 0 {
            return Err(BufferError::NoChannels);
        }
        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Panics if `index >= num_channels()`.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Channel `index`, or channel 0 when this buffer has fewer channels.
    ///
    /// This is the channel-reuse rule shared by range replacement and merge.
    pub fn channel_or_first(&self, index: usize) -> &[f32] {
        self.channels
            .get(index)
            .unwrap_or(&self.channels[0])
            .as_slice()
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn duration_secs(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }

    /// Interleaved copy, frame by frame.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * self.num_channels());
        for frame in 0..self.len() {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }

    /// Peak absolute amplitude across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    pub fn into_shared(self) -> SharedBuffer {
        Arc::new(self)
    }
}

/// Clamp to full scale, mapping NaN to silence.
pub fn clamp_sample(sample: f32) -> f32 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}
