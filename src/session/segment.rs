use crate::audio::{PcmBuffer, SharedBuffer};
use serde::Serialize;
use uuid::Uuid;

/// Result of synthesizing one segment: decoded audio, or the error text.
#[derive(Debug, Clone)]
pub enum SegmentAudio {
    Ready(SharedBuffer),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: String,
    pub text: String,
    pub audio: SegmentAudio,
    pub played: bool,
}

impl Segment {
    pub fn new(text: impl Into<String>, audio: SegmentAudio) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            audio,
            played: false,
        }
    }

    pub fn ready(text: impl Into<String>, buffer: impl Into<SharedBuffer>) -> Self {
        Self::new(text, SegmentAudio::Ready(buffer.into()))
    }

    pub fn failed(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(text, SegmentAudio::Failed(error.into()))
    }

    /// `None` for failed segments; these are skipped by merge.
    pub fn buffer(&self) -> Option<&PcmBuffer> {
        match &self.audio {
            SegmentAudio::Ready(buffer) => Some(buffer.as_ref()),
            SegmentAudio::Failed(_) => None,
        }
    }

    pub fn shared_buffer(&self) -> Option<&SharedBuffer> {
        match &self.audio {
            SegmentAudio::Ready(buffer) => Some(buffer),
            SegmentAudio::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.audio {
            SegmentAudio::Ready(_) => None,
            SegmentAudio::Failed(message) => Some(message),
        }
    }

    pub fn is_playable(&self) -> bool {
        matches!(self.audio, SegmentAudio::Ready(_))
    }

    pub fn duration_secs(&self) -> f32 {
        self.buffer().map(|b| b.duration_secs()).unwrap_or(0.0)
    }

    pub fn summary(&self) -> SegmentSummary {
        SegmentSummary {
            id: self.id.clone(),
            text: self.text.clone(),
            duration_secs: self.duration_secs(),
            error: self.error().map(str::to_string),
            played: self.played,
        }
    }
}

/// Serializable view of a segment for reports and manifests.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub id: String,
    pub text: String,
    pub duration_secs: f32,
    pub error: Option<String>,
    pub played: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_and_failed_segments() {
        let ok = Segment::ready("hello", PcmBuffer::silent(1, 8000, 8000));
        assert!(ok.is_playable());
        assert!(ok.error().is_none());
        assert!((ok.duration_secs() - 1.0).abs() < 1e-6);

        let failed = Segment::failed("hello", "Network error");
        assert!(!failed.is_playable());
        assert!(failed.buffer().is_none());
        assert_eq!(failed.error(), Some("Network error"));
        assert_eq!(failed.summary().duration_secs, 0.0);
    }

    #[test]
    fn test_segment_ids_are_unique() {
        let a = Segment::failed("a", "x");
        let b = Segment::failed("a", "x");
        assert_ne!(a.id, b.id);
    }
}
