use crate::audio::PcmBuffer;

/// Sample rate of the empty buffer returned when nothing is present to merge.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

pub struct Stitcher;

impl Stitcher {
    /// Concatenate the present buffers end to end, in order.
    ///
    /// Absent entries are skipped without silence padding. The first present
    /// buffer fixes the channel count and sample rate; a later buffer with
    /// fewer channels contributes its channel 0 to the missing ones. Buffers
    /// at another sample rate are appended sample for sample, not resampled.
    pub fn merge_buffers<'a, I>(buffers: I) -> PcmBuffer
    where
        I: IntoIterator<Item = Option<&'a PcmBuffer>>,
    {
        let present: Vec<&PcmBuffer> = buffers.into_iter().flatten().collect();
        let Some(first) = present.first() else {
            return PcmBuffer::empty(DEFAULT_SAMPLE_RATE);
        };

        let num_channels = first.num_channels();
        let sample_rate = first.sample_rate();
        let total_len: usize = present.iter().map(|b| b.len()).sum();

        let mut channels: Vec<Vec<f32>> = vec![Vec::with_capacity(total_len); num_channels];
        for (index, buffer) in present.iter().enumerate() {
            if buffer.sample_rate() != sample_rate {
                tracing::warn!(
                    "Merge input {} is {} Hz, output is {} Hz; appending without resampling",
                    index,
                    buffer.sample_rate(),
                    sample_rate
                );
            }
            for (c, out) in channels.iter_mut().enumerate() {
                out.extend_from_slice(buffer.channel_or_first(c));
            }
        }

        tracing::debug!(
            "Merged {} buffers into {} samples x {} channels",
            present.len(),
            total_len,
            num_channels
        );

        PcmBuffer::from_parts(channels, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: &[f32]) -> PcmBuffer {
        PcmBuffer::new(vec![samples.to_vec()], 8000).unwrap()
    }

    #[test]
    fn test_merge_length_is_sum_of_present() {
        let a = mono(&[0.1; 30]);
        let b = mono(&[0.2; 12]);
        let c = mono(&[0.3; 7]);
        let merged = Stitcher::merge_buffers([Some(&a), Some(&b), Some(&c)]);
        assert_eq!(merged.len(), 49);
        assert_eq!(merged.channel(0)[29], 0.1);
        assert_eq!(merged.channel(0)[30], 0.2);
        assert_eq!(merged.channel(0)[48], 0.3);
    }

    #[test]
    fn test_merge_skips_absent_middle() {
        let a = mono(&[0.1, 0.2]);
        let c = mono(&[0.5]);
        let merged = Stitcher::merge_buffers([Some(&a), None, Some(&c)]);
        assert_eq!(merged.channel(0), &[0.1, 0.2, 0.5]);
    }

    #[test]
    fn test_merge_all_absent_is_empty() {
        let merged = Stitcher::merge_buffers([None, None]);
        assert!(merged.is_empty());
        assert_eq!(merged.num_channels(), 1);
        assert_eq!(merged.sample_rate(), DEFAULT_SAMPLE_RATE);

        let merged = Stitcher::merge_buffers(std::iter::empty::<Option<&PcmBuffer>>());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_broadcasts_first_channel_of_narrow_input() {
        let stereo = PcmBuffer::new(vec![vec![0.1], vec![-0.1]], 8000).unwrap();
        let narrow = mono(&[0.7]);
        let merged = Stitcher::merge_buffers([Some(&stereo), Some(&narrow)]);
        assert_eq!(merged.num_channels(), 2);
        assert_eq!(merged.channel(0), &[0.1, 0.7]);
        assert_eq!(merged.channel(1), &[-0.1, 0.7]);
    }

    #[test]
    fn test_merge_format_follows_first_present() {
        let wide = PcmBuffer::new(vec![vec![0.0; 2]; 3], 22050).unwrap();
        let merged = Stitcher::merge_buffers([None, Some(&mono(&[0.0])), Some(&wide)]);
        assert_eq!(merged.num_channels(), 1);
        assert_eq!(merged.sample_rate(), 8000);
        assert_eq!(merged.len(), 3);
    }
}
