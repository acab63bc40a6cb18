use crate::audio::SharedBuffer;

/// Single-slot clipboard. Copy and cut overwrite it; paste reads it without
/// clearing, so the same content can be pasted repeatedly.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    content: Option<SharedBuffer>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, content: impl Into<SharedBuffer>) {
        self.content = Some(content.into());
    }

    pub fn get(&self) -> Option<&SharedBuffer> {
        self.content.as_ref()
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmBuffer;

    #[test]
    fn test_clipboard_overwrite_and_repeatable_read() {
        let mut clipboard = Clipboard::new();
        assert!(clipboard.is_empty());

        clipboard.set(PcmBuffer::silent(1, 3, 8000));
        clipboard.set(PcmBuffer::silent(1, 5, 8000));
        assert_eq!(clipboard.get().unwrap().len(), 5);
        assert_eq!(clipboard.get().unwrap().len(), 5);

        clipboard.clear();
        assert!(clipboard.get().is_none());
    }
}
