//! A named group of segments and its merge cache.
//!
//! The merged buffer is what gets exported and what whole-group playback
//! plays. It is cached as [`MergeCache::Clean`] and dropped back to
//! [`MergeCache::Dirty`] by every change to the segment list or to a
//! segment's audio. Reading the merged audio while dirty re-merges first.

use super::segment::{Segment, SegmentAudio};
use super::stitcher::Stitcher;
use super::SessionError;
use crate::audio::SharedBuffer;
use uuid::Uuid;

/// Separator that lets one group export under several file names.
pub const NAME_SEPARATOR: char = '&';

#[derive(Debug, Clone, Default)]
pub enum MergeCache {
    #[default]
    Dirty,
    Clean(SharedBuffer),
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    pub label: String,
    segments: Vec<Segment>,
    cache: MergeCache,
}

impl Group {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_segments(label, Vec::new())
    }

    pub fn with_segments(label: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            segments,
            cache: MergeCache::Dirty,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Result<&Segment, SessionError> {
        let len = self.segments.len();
        self.segments
            .get(index)
            .ok_or(SessionError::SegmentIndexOutOfRange { index, len })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.cache, MergeCache::Dirty)
    }

    pub fn cache(&self) -> &MergeCache {
        &self.cache
    }

    pub fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.invalidate();
    }

    /// Swap in new audio for a segment, e.g. after an edit session is saved.
    pub fn replace_segment_audio(
        &mut self,
        index: usize,
        audio: SegmentAudio,
    ) -> Result<(), SessionError> {
        let segment = self.segment_mut(index)?;
        segment.audio = audio;
        segment.played = false;
        self.invalidate();
        Ok(())
    }

    /// Replace a segment's text and audio with a fresh synthesis result.
    pub fn regenerate_segment(
        &mut self,
        index: usize,
        text: impl Into<String>,
        audio: SegmentAudio,
    ) -> Result<(), SessionError> {
        let segment = self.segment_mut(index)?;
        segment.text = text.into();
        segment.audio = audio;
        segment.played = false;
        self.invalidate();
        Ok(())
    }

    pub fn remove_segment(&mut self, index: usize) -> Result<Segment, SessionError> {
        let len = self.segments.len();
        if index >= len {
            return Err(SessionError::SegmentIndexOutOfRange { index, len });
        }
        let removed = self.segments.remove(index);
        self.invalidate();
        Ok(removed)
    }

    pub fn move_segment(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        let len = self.segments.len();
        for index in [from, to] {
            if index >= len {
                return Err(SessionError::SegmentIndexOutOfRange { index, len });
            }
        }
        if from != to {
            let segment = self.segments.remove(from);
            self.segments.insert(to, segment);
            self.invalidate();
        }
        Ok(())
    }

    /// Playback bookkeeping only; the merged audio is unaffected.
    pub fn mark_played(&mut self, index: usize) -> Result<(), SessionError> {
        self.segment_mut(index)?.played = true;
        Ok(())
    }

    /// The merged audio of every playable segment, re-merging if dirty.
    pub fn merged(&mut self) -> SharedBuffer {
        if let MergeCache::Clean(buffer) = &self.cache {
            return buffer.clone();
        }

        let merged = Stitcher::merge_buffers(self.segments.iter().map(Segment::buffer)).into_shared();
        tracing::info!(
            "Merged group '{}': {} segments, {:.2}s",
            self.label,
            self.segments.len(),
            merged.duration_secs()
        );
        self.cache = MergeCache::Clean(merged.clone());
        merged
    }

    pub fn has_playable_segments(&self) -> bool {
        self.segments.iter().any(Segment::is_playable)
    }

    /// File names this group exports under: the label split on `&`.
    pub fn export_names(&self) -> Vec<String> {
        self.label
            .split(NAME_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn segment_mut(&mut self, index: usize) -> Result<&mut Segment, SessionError> {
        let len = self.segments.len();
        self.segments
            .get_mut(index)
            .ok_or(SessionError::SegmentIndexOutOfRange { index, len })
    }

    fn invalidate(&mut self) {
        if !self.is_dirty() {
            tracing::debug!("Group '{}' merge cache invalidated", self.label);
        }
        self.cache = MergeCache::Dirty;
    }
}
