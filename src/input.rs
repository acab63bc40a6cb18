//! Batch text input: one item per line, optionally labelled, optionally
//! split into sentences before synthesis.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Column separator of labelled input (`label<TAB>text`).
pub const LABEL_SEPARATOR: char = '\t';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("No valid text lines in input")]
    Empty,

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Every non-blank line becomes an item labelled by its 1-based position
/// among the kept lines.
pub fn parse_text_lines(input: &str) -> Result<Vec<InputItem>, InputError> {
    let items: Vec<InputItem> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| InputItem {
            label: (i + 1).to_string(),
            text: line.to_string(),
        })
        .collect();

    if items.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(items)
}

/// `label<TAB>text` lines. Rows with a blank label or blank text are skipped.
pub fn parse_labeled_lines(input: &str) -> Result<Vec<InputItem>, InputError> {
    let mut items = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        let Some((label, text)) = line.split_once(LABEL_SEPARATOR) else {
            if !line.trim().is_empty() {
                tracing::warn!("Line {} has no label column, skipping", line_no + 1);
            }
            continue;
        };
        let (label, text) = (label.trim(), text.trim());
        if label.is_empty() || text.is_empty() {
            continue;
        }
        items.push(InputItem {
            label: label.to_string(),
            text: text.to_string(),
        });
    }

    if items.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(items)
}

pub fn read_items(path: &Path, labeled: bool) -> Result<Vec<InputItem>, InputError> {
    let content = std::fs::read_to_string(path)?;
    let items = if labeled {
        parse_labeled_lines(&content)?
    } else {
        parse_text_lines(&content)?
    };
    tracing::info!("Loaded {} input items from {}", items.len(), path.display());
    Ok(items)
}

/// Split after each sentence terminator, keeping the terminator with its
/// sentence. Blank pieces are dropped; a trailing unterminated piece is kept.
pub fn split_sentences(text: &str) -> Vec<String> {
    static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SENTENCE_RE
        .get_or_init(|| Regex::new(r"[^。？！?!]*[。？！?!]+|[^。？！?!]+$").expect("valid sentence regex"));

    re.find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The segment texts for one item.
pub fn segment_texts(item: &InputItem, split: bool) -> Vec<String> {
    if split {
        let sentences = split_sentences(&item.text);
        if !sentences.is_empty() {
            return sentences;
        }
    }
    vec![item.text.clone()]
}
