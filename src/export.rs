//! Packaging of merged group audio.
//!
//! Every group with at least one playable segment is merged and written as
//! `<name>.wav` once per `&`-separated name in its label. A `manifest.json`
//! describing the written files goes last.

use crate::audio::wav;
use crate::session::Workspace;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: no group has playable audio")]
    NothingToExport,

    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Destination for exported files (a directory, an archive, ...).
pub trait ArchiveSink {
    fn add_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// Writes each file into a directory, creating it on first use.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveSink for DirectorySink {
    fn add_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        fs::create_dir_all(&self.root).map_err(|source| ExportError::Io {
            path: self.root.clone(),
            source,
        })?;
        let path = self.root.join(name);
        fs::write(&path, bytes).map_err(|source| ExportError::Io { path, source })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportManifest {
    pub created_at: String,
    pub files: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub file: String,
    pub group: String,
    pub duration_secs: f32,
    pub sample_rate: u32,
    pub channels: usize,
    pub segments: usize,
    pub failed_segments: usize,
}

/// Reject names that would escape the sink or are not usable as file names.
fn validate_name(name: &str) -> Result<(), ExportError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if bad {
        Err(ExportError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

pub fn export_workspace(
    workspace: &mut Workspace,
    sink: &mut dyn ArchiveSink,
) -> Result<ExportManifest, ExportError> {
    let mut files = Vec::new();

    for group in workspace.groups_mut() {
        if !group.has_playable_segments() {
            tracing::warn!("Group '{}' has no playable segments, skipping", group.label);
            continue;
        }
        let names = group.export_names();
        if names.is_empty() {
            tracing::warn!("Group with empty label skipped");
            continue;
        }
        for name in &names {
            validate_name(name)?;
        }

        let merged = group.merged();
        let bytes = wav::encode(&merged);
        let failed_segments = group.segments().iter().filter(|s| !s.is_playable()).count();

        for name in names {
            let file = format!("{}.wav", name);
            if files.iter().any(|e: &ManifestEntry| e.file == file) {
                tracing::warn!("{} written by more than one group; last one wins", file);
                files.retain(|e: &ManifestEntry| e.file != file);
            }
            sink.add_file(&file, &bytes)?;
            files.push(ManifestEntry {
                file,
                group: group.label.clone(),
                duration_secs: merged.duration_secs(),
                sample_rate: merged.sample_rate(),
                channels: merged.num_channels(),
                segments: group.len(),
                failed_segments,
            });
        }
    }

    if files.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let manifest = ExportManifest {
        created_at: Utc::now().to_rfc3339(),
        files,
    };
    sink.add_file(MANIFEST_FILE, serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    tracing::info!("Exported {} files", manifest.files.len());
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmBuffer;
    use crate::session::{Group, Segment};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemorySink {
        files: BTreeMap<String, Vec<u8>>,
    }

    impl ArchiveSink for MemorySink {
        fn add_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
            self.files.insert(name.to_string(), bytes.to_vec());
            Ok(())
        }
    }

    fn workspace() -> Workspace {
        Workspace::from_groups(vec![
            Group::with_segments(
                "hello&hi",
                vec![
                    Segment::ready("a", PcmBuffer::silent(1, 100, 8000)),
                    Segment::failed("b", "Timeout"),
                    Segment::ready("c", PcmBuffer::silent(1, 60, 8000)),
                ],
            ),
            Group::with_segments("broken", vec![Segment::failed("x", "Timeout")]),
        ])
    }

    #[test]
    fn test_export_writes_one_file_per_name() {
        let mut ws = workspace();
        let mut sink = MemorySink::default();
        let manifest = export_workspace(&mut ws, &mut sink).unwrap();

        let names: Vec<&str> = sink.files.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["hello.wav", "hi.wav", "manifest.json"]);
        assert_eq!(sink.files["hello.wav"], sink.files["hi.wav"]);

        let merged = wav::decode(&sink.files["hello.wav"]).unwrap();
        assert_eq!(merged.len(), 160);

        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.files[0].failed_segments, 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&manifest.created_at).is_ok());
    }

    #[test]
    fn test_export_nothing_playable() {
        let mut ws = Workspace::from_groups(vec![Group::with_segments(
            "x",
            vec![Segment::failed("a", "e")],
        )]);
        let mut sink = MemorySink::default();
        assert!(matches!(
            export_workspace(&mut ws, &mut sink),
            Err(ExportError::NothingToExport)
        ));
        assert!(sink.files.is_empty());
    }

    #[test]
    fn test_export_rejects_path_names() {
        let mut ws = Workspace::from_groups(vec![Group::with_segments(
            "../evil",
            vec![Segment::ready("a", PcmBuffer::silent(1, 1, 8000))],
        )]);
        let mut sink = MemorySink::default();
        assert!(matches!(
            export_workspace(&mut ws, &mut sink),
            Err(ExportError::InvalidName(_))
        ));
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));
        let mut ws = workspace();
        export_workspace(&mut ws, &mut sink).unwrap();
        assert!(dir.path().join("out/hello.wav").exists());
        assert!(dir.path().join("out/manifest.json").exists());
    }
}
