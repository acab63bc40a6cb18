//! Pure editing primitives over [`PcmBuffer`].
//!
//! Every function allocates a new buffer and leaves its inputs untouched, so
//! a buffer held by an undo snapshot or the clipboard can never change under
//! its owner. Ranges are half-open sample indices. Offsets past the end are
//! clamped to the buffer length; a range that is empty or inverted after
//! clamping yields `None` (a no-op, not an error).

use super::buffer::{clamp_sample, PcmBuffer};

/// Normalise `[start, end)` against a buffer of `len` samples.
fn clamp_range(start: usize, end: usize, len: usize) -> Option<(usize, usize)> {
    let end = end.min(len);
    if start >= end {
        return None;
    }
    Some((start, end))
}

/// Copy `[start, end)` of every channel.
pub fn extract_range(buffer: &PcmBuffer, start: usize, end: usize) -> Option<PcmBuffer> {
    let (start, end) = clamp_range(start, end, buffer.len())?;
    let channels = buffer
        .channels()
        .iter()
        .map(|channel| channel[start..end].to_vec())
        .collect();
    Some(PcmBuffer::from_parts(channels, buffer.sample_rate()))
}

/// Replace `[start, end)` with the full content of `insert`.
///
/// The result keeps `buffer`'s channel count and sample rate. When `insert`
/// has fewer channels, its channel 0 fills the missing ones. `start == end`
/// is a pure insertion; only `start > end` is a no-op.
pub fn replace_range(
    buffer: &PcmBuffer,
    insert: &PcmBuffer,
    start: usize,
    end: usize,
) -> Option<PcmBuffer> {
    if start > end {
        return None;
    }
    let len = buffer.len();
    let end = end.min(len);
    let start = start.min(end);

    if insert.sample_rate() != buffer.sample_rate() {
        tracing::warn!(
            "Splicing {} Hz audio into a {} Hz buffer without resampling",
            insert.sample_rate(),
            buffer.sample_rate()
        );
    }

    let new_len = len - (end - start) + insert.len();
    let channels = buffer
        .channels()
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let mut data = Vec::with_capacity(new_len);
            data.extend_from_slice(&source[..start]);
            data.extend_from_slice(insert.channel_or_first(index));
            data.extend_from_slice(&source[end..]);
            data
        })
        .collect();

    Some(PcmBuffer::from_parts(channels, buffer.sample_rate()))
}

/// Insert `insert` before sample `position`.
pub fn insert_at(buffer: &PcmBuffer, insert: &PcmBuffer, position: usize) -> Option<PcmBuffer> {
    let position = position.min(buffer.len());
    replace_range(buffer, insert, position, position)
}

/// Remove `[start, end)`.
pub fn remove_range(buffer: &PcmBuffer, start: usize, end: usize) -> Option<PcmBuffer> {
    let (start, end) = clamp_range(start, end, buffer.len())?;
    let gap = PcmBuffer::silent(buffer.num_channels(), 0, buffer.sample_rate());
    replace_range(buffer, &gap, start, end)
}

/// Multiply samples by `gain` and clamp to full scale.
///
/// `range` of `None` scales the whole buffer; samples outside the range are
/// copied unchanged. A non-finite gain is a no-op.
pub fn scale_range(
    buffer: &PcmBuffer,
    gain: f32,
    range: Option<(usize, usize)>,
) -> Option<PcmBuffer> {
    if !gain.is_finite() {
        return None;
    }
    let (start, end) = match range {
        Some((start, end)) => clamp_range(start, end, buffer.len())?,
        None => (0, buffer.len()),
    };

    let channels = buffer
        .channels()
        .iter()
        .map(|source| {
            let mut data = source.clone();
            for sample in &mut data[start..end] {
                *sample = clamp_sample(*sample * gain);
            }
            data
        })
        .collect();

    Some(PcmBuffer::from_parts(channels, buffer.sample_rate()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, sample_rate: u32) -> PcmBuffer {
        let data: Vec<f32> = (0..len).map(|i| i as f32 / len as f32).collect();
        PcmBuffer::new(vec![data], sample_rate).unwrap()
    }

    fn stereo(left: Vec<f32>, right: Vec<f32>) -> PcmBuffer {
        PcmBuffer::new(vec![left, right], 8000).unwrap()
    }

    #[test]
    fn test_extract_range_copies_every_channel() {
        let buffer = stereo(vec![0.1, 0.2, 0.3, 0.4], vec![-0.1, -0.2, -0.3, -0.4]);
        let clip = extract_range(&buffer, 1, 3).unwrap();
        assert_eq!(clip.len(), 2);
        assert_eq!(clip.channel(0), &[0.2, 0.3]);
        assert_eq!(clip.channel(1), &[-0.2, -0.3]);
        assert_eq!(clip.sample_rate(), 8000);
    }

    #[test]
    fn test_extract_range_empty_or_inverted_is_noop() {
        let buffer = ramp(10, 8000);
        assert!(extract_range(&buffer, 4, 4).is_none());
        assert!(extract_range(&buffer, 6, 2).is_none());
        assert!(extract_range(&buffer, 12, 20).is_none());
    }

    #[test]
    fn test_extract_range_clamps_end() {
        let buffer = ramp(10, 8000);
        assert_eq!(extract_range(&buffer, 8, 100).unwrap().len(), 2);
    }

    #[test]
    fn test_replace_range_length_law() {
        let buffer = ramp(100, 8000);
        let insert = ramp(7, 8000);
        for (start, end) in [(0, 0), (0, 100), (10, 20), (50, 50), (99, 100), (100, 100)] {
            let result = replace_range(&buffer, &insert, start, end).unwrap();
            assert_eq!(result.len(), buffer.len() - (end - start) + insert.len());
        }
    }

    #[test]
    fn test_replace_range_preserves_surroundings() {
        let buffer = PcmBuffer::new(vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]], 8000).unwrap();
        let insert = PcmBuffer::new(vec![vec![9.0, 9.0, 9.0]], 8000).unwrap();
        let result = replace_range(&buffer, &insert, 1, 3).unwrap();
        assert_eq!(result.channel(0), &[1.0, 9.0, 9.0, 9.0, 4.0, 5.0]);
        // Inputs are untouched.
        assert_eq!(buffer.channel(0), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_replace_range_broadcasts_insert_channel_zero() {
        let buffer = stereo(vec![0.0; 3], vec![0.0; 3]);
        let insert = PcmBuffer::new(vec![vec![0.5]], 8000).unwrap();
        let result = replace_range(&buffer, &insert, 1, 2).unwrap();
        assert_eq!(result.num_channels(), 2);
        assert_eq!(result.channel(0), &[0.0, 0.5, 0.0]);
        assert_eq!(result.channel(1), &[0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_replace_range_drops_extra_insert_channels() {
        let buffer = PcmBuffer::new(vec![vec![0.0; 2]], 8000).unwrap();
        let insert = stereo(vec![0.3], vec![-0.3]);
        let result = replace_range(&buffer, &insert, 1, 1).unwrap();
        assert_eq!(result.num_channels(), 1);
        assert_eq!(result.channel(0), &[0.0, 0.3, 0.0]);
    }

    #[test]
    fn test_replace_range_inverted_is_noop() {
        let buffer = ramp(10, 8000);
        assert!(replace_range(&buffer, &ramp(2, 8000), 5, 4).is_none());
    }

    #[test]
    fn test_insert_at_positions() {
        let buffer = PcmBuffer::new(vec![vec![1.0, 2.0]], 8000).unwrap();
        let insert = PcmBuffer::new(vec![vec![7.0]], 8000).unwrap();
        assert_eq!(insert_at(&buffer, &insert, 0).unwrap().channel(0), &[7.0, 1.0, 2.0]);
        assert_eq!(insert_at(&buffer, &insert, 2).unwrap().channel(0), &[1.0, 2.0, 7.0]);
        assert_eq!(insert_at(&buffer, &insert, 50).unwrap().channel(0), &[1.0, 2.0, 7.0]);
    }

    #[test]
    fn test_remove_range() {
        let buffer = stereo(vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]);
        let result = remove_range(&buffer, 1, 3).unwrap();
        assert_eq!(result.channel(0), &[1.0, 4.0]);
        assert_eq!(result.channel(1), &[5.0, 8.0]);
        assert!(remove_range(&buffer, 3, 3).is_none());
    }

    #[test]
    fn test_scale_range_only_touches_range() {
        let buffer = PcmBuffer::new(vec![vec![0.2, 0.2, 0.2, 0.2]], 8000).unwrap();
        let result = scale_range(&buffer, 2.0, Some((1, 3))).unwrap();
        assert_eq!(result.channel(0), &[0.2, 0.4, 0.4, 0.2]);
    }

    #[test]
    fn test_scale_whole_buffer_clamps() {
        let data: Vec<f32> = (0..200).map(|i| ((i as f32) * 0.1).sin() * 0.9).collect();
        let buffer = PcmBuffer::new(vec![data.clone(), data], 8000).unwrap();
        for gain in [0.1, 1.0, 3.0, 50.0, -20.0] {
            let result = scale_range(&buffer, gain, None).unwrap();
            assert!(result
                .channels()
                .iter()
                .flatten()
                .all(|s| (-1.0..=1.0).contains(s)));
        }
    }

    #[test]
    fn test_scale_range_rejects_bad_input() {
        let buffer = ramp(10, 8000);
        assert!(scale_range(&buffer, f32::NAN, None).is_none());
        assert!(scale_range(&buffer, 2.0, Some((5, 5))).is_none());
    }
}
