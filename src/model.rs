use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const DOCUMENT_MIME: &str = "application/vnd.google-apps.document";

/// File metadata as returned by the hosting API's `files.get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub self_link: String,
    pub created_date: String,
    #[serde(default)]
    pub mime_type: String,
    /// Child ids, only populated for folders.
    #[serde(default)]
    pub children: Vec<String>,
}

impl DocumentMeta {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    pub fn is_document(&self) -> bool {
        self.mime_type == DOCUMENT_MIME
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionList {
    #[serde(default)]
    pub items: Vec<RevisionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRecord {
    pub modified_date: String,
    #[serde(default)]
    pub last_modifying_user_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedHistory {
    #[serde(default)]
    pub revisions: Vec<DetailedRevision>,
}

/// One revision of the fine-grained diff payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedRevision {
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub end: u64,
    pub end_millis: i64,
    /// Raw chunk entries. Diff entries are read one at a time so that a
    /// single unreadable entry cannot reject the whole payload.
    #[serde(default)]
    pub chunked_snapshot: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub user_info: IndexMap<String, UserInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default)]
    pub ty: String,
    #[serde(default)]
    pub st: Option<String>,
    #[serde(rename = "si", default)]
    pub start_index: i64,
    #[serde(rename = "ei", default)]
    pub end_index: i64,
    #[serde(rename = "sm", default)]
    pub meta: SnapshotMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Kept raw: anything other than an integer code is a ghost edit.
    #[serde(rename = "revdiff_dt", default)]
    pub edit_type: Option<serde_json::Value>,
    #[serde(rename = "revdiff_aid", default)]
    pub author: Option<String>,
}

/// Display identity for a raw author tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub document: DocumentOutput,
    pub individuals: IndividualsOutput,
    pub timeline: TimelineOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutput {
    pub id: String,
    pub name: String,
    pub link: String,
    pub creation_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorOutput {
    pub id: String,
    pub name: Option<String>,
    pub additions: Option<u64>,
    pub removals: Option<u64>,
    pub changes: Option<u64>,
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualsOutput {
    pub editors: Vec<EditorOutput>,
    pub total: EditorOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementOutput {
    pub index: usize,
    pub start: Option<DateTime<Utc>>,
    pub editors: Vec<EditorOutput>,
    pub total: EditorOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineOutput {
    pub increment_size_ms: i64,
    pub timeline_start: Option<DateTime<Utc>>,
    pub increments: Vec<IncrementOutput>,
}

#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(since) = self.since {
            if timestamp < &since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if timestamp > &until {
                return false;
            }
        }
        true
    }

    pub fn contains_millis(&self, millis: i64) -> bool {
        match DateTime::<Utc>::from_timestamp_millis(millis) {
            Some(ts) => self.contains(&ts),
            None => self.is_unbounded(),
        }
    }
}
