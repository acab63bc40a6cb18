//! Interactive editing session for one decoded buffer.
//!
//! [`EditorSession`] is the entry point a control surface (keyboard
//! shortcuts, buttons) drives: copy, cut, paste, gain, undo, redo, save.
//! Invalid selections and an empty clipboard produce [`EditOutcome::NoOp`]
//! and leave every piece of state untouched. A session is single-threaded
//! and not reentrant; callers serialise commands.

pub mod clipboard;
pub mod history;
pub mod selection;

pub use clipboard::Clipboard;
pub use history::EditHistory;
pub use selection::Selection;

use crate::audio::{edit, wav, DecodeError, PcmBuffer, SharedBuffer};

/// Gain range offered to users for loudness adjustment.
pub const MIN_GAIN: f32 = 0.1;
pub const MAX_GAIN: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    NoSelection,
    InvalidRange,
    EmptyClipboard,
    GainOutOfRange,
    NothingToUndo,
    NothingToRedo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NoOp(NoOpReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

/// Discrete commands from the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
}

#[derive(Debug)]
pub struct EditorSession {
    history: EditHistory,
    clipboard: Clipboard,
    selection: Option<Selection>,
    playhead: usize,
}

impl EditorSession {
    pub fn new(buffer: impl Into<SharedBuffer>) -> Self {
        Self {
            history: EditHistory::new(buffer),
            clipboard: Clipboard::new(),
            selection: None,
            playhead: 0,
        }
    }

    /// Decode WAV bytes and open them for editing.
    pub fn open(bytes: &[u8]) -> Result<Self, DecodeError> {
        let buffer = wav::decode(bytes)?;
        tracing::info!(
            "Editor opened: {:.2}s, {} channels, {} Hz",
            buffer.duration_secs(),
            buffer.num_channels(),
            buffer.sample_rate()
        );
        Ok(Self::new(buffer))
    }

    pub fn current(&self) -> &SharedBuffer {
        self.history.current()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn playhead(&self) -> usize {
        self.playhead
    }

    pub fn is_modified(&self) -> bool {
        self.history.is_modified()
    }

    pub fn select(&mut self, start: usize, end: usize) -> EditOutcome {
        match Selection::new(start, end, self.current().len()) {
            Some(selection) => {
                self.selection = Some(selection);
                EditOutcome::Applied
            }
            None => EditOutcome::NoOp(NoOpReason::InvalidRange),
        }
    }

    pub fn select_secs(&mut self, start_secs: f64, end_secs: f64) -> EditOutcome {
        let current = self.current();
        match Selection::from_secs(start_secs, end_secs, current.sample_rate(), current.len()) {
            Some(selection) => {
                self.selection = Some(selection);
                EditOutcome::Applied
            }
            None => EditOutcome::NoOp(NoOpReason::InvalidRange),
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn set_playhead(&mut self, sample: usize) {
        self.playhead = sample.min(self.current().len());
    }

    /// Range the playback layer should play: the selection, or playhead to end.
    pub fn play_region(&self) -> (usize, usize) {
        match self.selection {
            Some(selection) => selection.range(),
            None => (self.playhead, self.current().len()),
        }
    }

    pub fn apply(&mut self, command: EditorCommand) -> EditOutcome {
        match command {
            EditorCommand::Copy => self.copy(),
            EditorCommand::Cut => self.cut(),
            EditorCommand::Paste => self.paste(),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
        }
    }

    pub fn copy(&mut self) -> EditOutcome {
        let Some(selection) = self.selection else {
            return EditOutcome::NoOp(NoOpReason::NoSelection);
        };
        match edit::extract_range(self.current(), selection.start(), selection.end()) {
            Some(clip) => {
                tracing::debug!("Copied {} samples", clip.len());
                self.clipboard.set(clip);
                EditOutcome::Applied
            }
            None => EditOutcome::NoOp(NoOpReason::InvalidRange),
        }
    }

    pub fn cut(&mut self) -> EditOutcome {
        let Some(selection) = self.selection else {
            return EditOutcome::NoOp(NoOpReason::NoSelection);
        };
        let (start, end) = selection.range();
        let current = self.current().clone();
        let (Some(clip), Some(remaining)) = (
            edit::extract_range(&current, start, end),
            edit::remove_range(&current, start, end),
        ) else {
            return EditOutcome::NoOp(NoOpReason::InvalidRange);
        };

        tracing::debug!("Cut {} samples at {}", clip.len(), start);
        self.clipboard.set(clip);
        self.history.commit(remaining);
        self.selection = None;
        self.playhead = start;
        EditOutcome::Applied
    }

    /// Insert the clipboard at the selection start, or at the playhead.
    pub fn paste(&mut self) -> EditOutcome {
        let Some(clip) = self.clipboard.get().cloned() else {
            return EditOutcome::NoOp(NoOpReason::EmptyClipboard);
        };
        let position = self
            .selection
            .map(|s| s.start())
            .unwrap_or(self.playhead);

        match edit::insert_at(self.current(), &clip, position) {
            Some(pasted) => {
                tracing::debug!("Pasted {} samples at {}", clip.len(), position);
                self.history.commit(pasted);
                EditOutcome::Applied
            }
            None => EditOutcome::NoOp(NoOpReason::InvalidRange),
        }
    }

    /// Replace the selected region with the clipboard.
    pub fn paste_replace(&mut self) -> EditOutcome {
        let Some(clip) = self.clipboard.get().cloned() else {
            return EditOutcome::NoOp(NoOpReason::EmptyClipboard);
        };
        let Some(selection) = self.selection else {
            return EditOutcome::NoOp(NoOpReason::NoSelection);
        };

        match edit::replace_range(self.current(), &clip, selection.start(), selection.end()) {
            Some(replaced) => {
                self.history.commit(replaced);
                self.selection = None;
                EditOutcome::Applied
            }
            None => EditOutcome::NoOp(NoOpReason::InvalidRange),
        }
    }

    /// Scale the selection, or the whole buffer when nothing is selected.
    pub fn scale(&mut self, gain: f32) -> EditOutcome {
        if !(MIN_GAIN..=MAX_GAIN).contains(&gain) {
            return EditOutcome::NoOp(NoOpReason::GainOutOfRange);
        }
        let range = self.selection.map(|s| s.range());
        match edit::scale_range(self.current(), gain, range) {
            Some(scaled) => {
                tracing::debug!("Scaled {:?} by {:.2}", range, gain);
                self.history.commit(scaled);
                EditOutcome::Applied
            }
            None => EditOutcome::NoOp(NoOpReason::InvalidRange),
        }
    }

    pub fn undo(&mut self) -> EditOutcome {
        if self.history.undo().is_none() {
            return EditOutcome::NoOp(NoOpReason::NothingToUndo);
        }
        self.reconcile_with_current();
        EditOutcome::Applied
    }

    pub fn redo(&mut self) -> EditOutcome {
        if self.history.redo().is_none() {
            return EditOutcome::NoOp(NoOpReason::NothingToRedo);
        }
        self.reconcile_with_current();
        EditOutcome::Applied
    }

    pub fn revert_to_original(&mut self) {
        self.history.revert_to_original();
        self.reconcile_with_current();
    }

    /// Encode the current snapshot as WAV bytes.
    pub fn save(&self) -> Vec<u8> {
        wav::encode(self.current())
    }

    /// Finish editing and hand back the current buffer.
    pub fn into_buffer(self) -> SharedBuffer {
        self.history.current().clone()
    }

    fn reconcile_with_current(&mut self) {
        let len = self.current().len();
        if matches!(self.selection, Some(s) if !s.fits(len)) {
            self.selection = None;
        }
        self.playhead = self.playhead.min(len);
    }
}

impl From<PcmBuffer> for EditorSession {
    fn from(buffer: PcmBuffer) -> Self {
        Self::new(buffer)
    }
}
