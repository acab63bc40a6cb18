//! Segment/group model for a synthesis batch.
//!
//! A [`Workspace`] holds the groups of one batch in input order. Each group
//! owns its segments and caches their merged audio; see [`group`].

use crate::audio::SharedBuffer;
use thiserror::Error;

pub mod group;
pub mod progress;
pub mod segment;
pub mod stitcher;

pub use group::{Group, MergeCache};
pub use progress::{BatchProgress, SegmentStatus};
pub use segment::{Segment, SegmentAudio, SegmentSummary};
pub use stitcher::Stitcher;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Group index {index} out of range ({len} groups)")]
    GroupIndexOutOfRange { index: usize, len: usize },

    #[error("Segment index {index} out of range ({len} segments)")]
    SegmentIndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    groups: Vec<Group>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_segments(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn push_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub fn group(&self, index: usize) -> Result<&Group, SessionError> {
        let len = self.groups.len();
        self.groups
            .get(index)
            .ok_or(SessionError::GroupIndexOutOfRange { index, len })
    }

    pub fn group_mut(&mut self, index: usize) -> Result<&mut Group, SessionError> {
        let len = self.groups.len();
        self.groups
            .get_mut(index)
            .ok_or(SessionError::GroupIndexOutOfRange { index, len })
    }

    pub fn delete_group(&mut self, index: usize) -> Result<Group, SessionError> {
        let len = self.groups.len();
        if index >= len {
            return Err(SessionError::GroupIndexOutOfRange { index, len });
        }
        let removed = self.groups.remove(index);
        tracing::info!("Deleted group '{}'", removed.label);
        Ok(removed)
    }

    /// Delete one segment. A group left without segments is removed too.
    pub fn delete_segment(
        &mut self,
        group_index: usize,
        segment_index: usize,
    ) -> Result<Segment, SessionError> {
        let group = self.group_mut(group_index)?;
        let removed = group.remove_segment(segment_index)?;
        if group.is_empty() {
            self.delete_group(group_index)?;
        }
        Ok(removed)
    }

    /// Store the result of an edit session back into its segment.
    pub fn update_segment_audio(
        &mut self,
        group_index: usize,
        segment_index: usize,
        buffer: SharedBuffer,
    ) -> Result<(), SessionError> {
        self.group_mut(group_index)?
            .replace_segment_audio(segment_index, SegmentAudio::Ready(buffer))
    }

    pub fn regenerate_segment(
        &mut self,
        group_index: usize,
        segment_index: usize,
        text: impl Into<String>,
        audio: SegmentAudio,
    ) -> Result<(), SessionError> {
        self.group_mut(group_index)?
            .regenerate_segment(segment_index, text, audio)
    }
}
