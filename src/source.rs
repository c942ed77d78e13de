use crate::error::{InspectError, Result};
use crate::model::{DetailedHistory, DocumentMeta, RevisionList, RevisionRecord};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const METADATA_FILE: &str = "metadata.json";
pub const REVISIONS_FILE: &str = "revisions.json";
pub const DETAILED_FILE: &str = "detailed.json";

/// Where document metadata and revision history come from.
pub trait DocumentSource {
    fn metadata(&self, id: &str) -> Result<DocumentMeta>;

    /// Revision list in source order; callers sort before bucketing.
    fn revisions(&self, id: &str) -> Result<Vec<RevisionRecord>>;

    /// Fine-grained diff payload, if the source has one for `id`.
    fn detailed(&self, id: &str) -> Result<Option<DetailedHistory>>;
}

/// Reads payloads exported to disk, one directory per id:
/// `<root>/<id>/{metadata,revisions,detailed}.json`.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Opens `path`, or the current dir if `None`.
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let root = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };
        if !root.is_dir() {
            return Err(InspectError::Source(format!(
                "Data directory not found: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(InspectError::Source(format!("Invalid document id '{id}'")));
        }
        let dir = self.root.join(id);
        if !dir.is_dir() {
            return Err(InspectError::Source(format!(
                "No data for '{id}' under {}",
                self.root.display()
            )));
        }
        Ok(dir)
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        debug!(path = %path.display(), "reading payload");
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            InspectError::Parse(format!("{}: {e}", path.display()))
        })
    }
}

impl DocumentSource for DirSource {
    fn metadata(&self, id: &str) -> Result<DocumentMeta> {
        let path = self.entry_dir(id)?.join(METADATA_FILE);
        Self::read_json(&path)
    }

    fn revisions(&self, id: &str) -> Result<Vec<RevisionRecord>> {
        let path = self.entry_dir(id)?.join(REVISIONS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let list: RevisionList = Self::read_json(&path)?;
        Ok(list.items)
    }

    fn detailed(&self, id: &str) -> Result<Option<DetailedHistory>> {
        let path = self.entry_dir(id)?.join(DETAILED_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_json(&path).map(Some)
    }
}
