//! The fallback provider lets groups be served from a static JSON document
//! when the host database is missing or has nothing to report.

use crate::normalize::{display_string, normalize_key, safe_count};
use crate::types::{Group, RawValue};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(thiserror::Error, Debug)]
pub enum FallbackError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait FallbackProvider: Send + Sync {
    /// `Ok(None)` when there is no fallback document to read.
    fn load(&self) -> Result<Option<Vec<Group>>, FallbackError>;
    fn store(&self, groups: &[Group]) -> Result<(), FallbackError>;
}

#[derive(Serialize)]
struct FallbackDocument<'a> {
    groups: &'a [Group],
}

/// Extracts group records from a parsed document. Anything that doesn't have
/// the expected shape reads as "no groups" rather than an error.
fn parse_document(payload: &serde_json::Value) -> Vec<Group> {
    let Some(entries) = payload.get("groups").and_then(|g| g.as_array()) else {
        tracing::warn!("fallback document has no `groups` array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_object()?;
            let id = normalize_key(&RawValue::from(entry.get("id")?))?;
            let name = display_string(&RawValue::from(entry.get("name")?))?;
            let members = entry
                .get("members")
                .map(|m| safe_count(&RawValue::from(m)))
                .unwrap_or(0);
            Some(Group::new(id, name, members))
        })
        .collect()
}

// Used when no fallback document is configured.
pub struct NoopFallbackProvider {}

impl FallbackProvider for NoopFallbackProvider {
    fn load(&self) -> Result<Option<Vec<Group>>, FallbackError> {
        Ok(None)
    }

    fn store(&self, _groups: &[Group]) -> Result<(), FallbackError> {
        tracing::warn!("no fallback provider configured, discarding groups");
        Ok(())
    }
}

pub struct FilesystemFallbackProvider {
    path: PathBuf,
}

impl FilesystemFallbackProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FilesystemFallbackProvider {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FallbackProvider for FilesystemFallbackProvider {
    fn load(&self) -> Result<Option<Vec<Group>>, FallbackError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %self.path.display(),
                    "failed to open fallback document"
                );
                return Err(e.into());
            }
        };

        let payload: serde_json::Value = serde_json::from_reader(BufReader::new(file))
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    path = %self.path.display(),
                    "failed to parse fallback document"
                );
            })?;

        Ok(Some(parse_document(&payload)))
    }

    fn store(&self, groups: &[Group]) -> Result<(), FallbackError> {
        // Written next to the target and renamed over it, so readers see
        // either the old document or the new one.
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &FallbackDocument { groups })?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::info!(
            path = %self.path.display(),
            groups = groups.len(),
            "stored fallback groups"
        );

        Ok(())
    }
}
