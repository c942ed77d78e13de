use super::record::{EditOutcome, EditRecord};
use crate::error::{InspectError, Result};
use crate::model::{DetailedRevision, SnapshotEntry};
use crate::stats::{EditorStats, IndividualStats};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

/// Bucket for edits whose author has no display identity.
pub const UNKNOWN_EDITOR: &str = "unknown";

const DIFF_ENTRY_TYPE: &str = "as";
const DIFF_STYLE: &str = "revision_diff";

/// Counters for one author inside a [`ChangeData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorChanges {
    pub additions: u64,
    pub removals: u64,
    pub changes: u64,
    pub user_id: Option<String>,
    pub name: Option<String>,
}

impl EditorChanges {
    /// Applies an accepted outcome. Rejected outcomes leave the counters alone.
    pub fn apply(&mut self, outcome: EditOutcome) {
        match outcome {
            EditOutcome::Added(size) | EditOutcome::FallbackAdded(size) => {
                self.additions = self.additions.saturating_add(size);
                self.changes = self.changes.saturating_add(1);
            }
            EditOutcome::Removed(size) => {
                self.removals = self.removals.saturating_add(size);
                self.changes = self.changes.saturating_add(1);
            }
            EditOutcome::Empty | EditOutcome::Ghost { .. } | EditOutcome::Malformed { .. } => {}
        }
    }

    /// Sums `other` into `self`, keeping this record's id.
    pub fn merge_in(&mut self, other: &EditorChanges) {
        self.additions = self.additions.saturating_add(other.additions);
        self.removals = self.removals.saturating_add(other.removals);
        self.changes = self.changes.saturating_add(other.changes);
        if self.name.is_none() {
            self.name = other.name.clone();
        }
    }

    pub fn to_editor_stats(&self) -> EditorStats {
        EditorStats {
            additions: Some(self.additions),
            removals: Some(self.removals),
            changes: Some(self.changes),
            name: self.name.clone(),
            secondary_id: self.user_id.clone(),
            percent: None,
        }
    }
}

/// Tally of how diff entries were classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub accepted: usize,
    pub fallback: usize,
    pub ghost: usize,
    pub empty: usize,
    pub malformed: usize,
}

impl ParseReport {
    fn record(&mut self, outcome: EditOutcome) {
        match outcome {
            EditOutcome::Added(_) | EditOutcome::Removed(_) => self.accepted += 1,
            EditOutcome::FallbackAdded(_) => {
                self.accepted += 1;
                self.fallback += 1;
            }
            EditOutcome::Empty => self.empty += 1,
            EditOutcome::Ghost { .. } => self.ghost += 1,
            EditOutcome::Malformed { .. } => self.malformed += 1,
        }
    }

    pub fn merge_in(&mut self, other: &ParseReport) {
        self.accepted += other.accepted;
        self.fallback += other.fallback;
        self.ghost += other.ghost;
        self.empty += other.empty;
        self.malformed += other.malformed;
    }

    pub fn has_anomalies(&self) -> bool {
        self.fallback + self.ghost + self.malformed > 0
    }
}

/// Per-author additions, removals and edit counts aggregated from diff payloads.
///
/// Authors are keyed by their resolved display id (the color id of the
/// identity map); authors without an identity share [`UNKNOWN_EDITOR`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeData {
    editors: IndexMap<String, EditorChanges>,
    pub total: EditorChanges,
    pub report: ParseReport,
}

impl ChangeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_revision(revision: &DetailedRevision) -> Self {
        let mut working: IndexMap<String, EditorChanges> = IndexMap::new();
        let mut report = ParseReport::default();

        for raw in revision.chunked_snapshot.iter().flatten().filter(|v| is_diff_entry(v)) {
            let entry = match SnapshotEntry::deserialize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "discarding unreadable diff entry");
                    report.malformed += 1;
                    continue;
                }
            };
            let record = EditRecord::from_entry(&entry);
            let outcome = record.outcome();
            report.record(outcome);
            match outcome {
                EditOutcome::FallbackAdded(size) => {
                    warn!(size, author = %record.author, "diff entry has no edit type, counting it as an addition");
                }
                EditOutcome::Ghost { size, edit_type } => {
                    warn!(?size, ?edit_type, author = %record.author, "discarding ghost edit");
                }
                EditOutcome::Malformed { size } => {
                    warn!(?size, author = %record.author, "discarding diff entry with unusable range");
                }
                _ => {}
            }
            if outcome.is_accepted() {
                working.entry(record.author).or_default().apply(outcome);
            }
        }

        let mut data = ChangeData {
            report,
            ..ChangeData::default()
        };
        for (tag, mut changes) in working {
            match revision.user_info.get(&tag).filter(|user| !user.anonymous) {
                Some(user) => {
                    changes.user_id = Some(user.color.clone());
                    changes.name = Some(user.name.clone());
                    data.absorb(user.color.clone(), changes);
                }
                None => {
                    trace!(tag = %tag, "no identity for author tag");
                    changes.user_id = Some(UNKNOWN_EDITOR.to_string());
                    data.absorb(UNKNOWN_EDITOR.to_string(), changes);
                }
            }
        }

        for changes in data.editors.values() {
            data.total.merge_in(changes);
        }
        data
    }

    /// Folds every revision into one aggregate.
    pub fn from_revisions<'a>(revisions: impl IntoIterator<Item = &'a DetailedRevision>) -> Self {
        let mut data = ChangeData::new();
        for revision in revisions {
            data.merge_in(ChangeData::from_revision(revision));
        }
        data
    }

    /// Aggregates revisions lying wholly inside the id range `[start, end]`.
    pub fn for_id_range(revisions: &[DetailedRevision], start: u64, end: u64) -> Self {
        Self::from_revisions(
            revisions
                .iter()
                .filter(|r| r.start >= start && r.end <= end),
        )
    }

    pub fn merge_in(&mut self, other: ChangeData) {
        self.total.merge_in(&other.total);
        self.report.merge_in(&other.report);
        for (id, changes) in other.editors {
            self.absorb(id, changes);
        }
    }

    fn absorb(&mut self, id: String, changes: EditorChanges) {
        match self.editors.get_mut(&id) {
            Some(existing) => existing.merge_in(&changes),
            None => {
                self.editors.insert(id, changes);
            }
        }
    }

    pub fn get_users(&self) -> Vec<&str> {
        self.editors.keys().map(String::as_str).collect()
    }

    pub fn editors(&self) -> impl Iterator<Item = (&str, &EditorChanges)> {
        self.editors.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn editor(&self, id: &str) -> Result<&EditorChanges> {
        self.editors
            .get(id)
            .ok_or_else(|| InspectError::EditorNotFound(id.to_string()))
    }

    pub fn user_additions(&self, id: &str) -> Result<u64> {
        self.editor(id).map(|c| c.additions)
    }

    pub fn user_removals(&self, id: &str) -> Result<u64> {
        self.editor(id).map(|c| c.removals)
    }

    pub fn user_changes(&self, id: &str) -> Result<u64> {
        self.editor(id).map(|c| c.changes)
    }

    pub fn total_additions(&self) -> u64 {
        self.total.additions
    }

    pub fn total_removals(&self) -> u64 {
        self.total.removals
    }

    pub fn total_changes(&self) -> u64 {
        self.total.changes
    }

    /// Converts into editor statistics keyed by display id.
    ///
    /// The unknown bucket always counts toward the total; it is listed as an
    /// editor only when `include_unknown` is set.
    pub fn to_individual_stats(&self, include_unknown: bool) -> IndividualStats {
        let mut stats = IndividualStats::new();
        for (id, changes) in &self.editors {
            if id == UNKNOWN_EDITOR && !include_unknown {
                continue;
            }
            let mut editor = changes.to_editor_stats();
            if id == UNKNOWN_EDITOR {
                editor.name = Some("Unknown".to_string());
            }
            *stats.make_editor(id.as_str()) = editor;
        }
        stats.total = self.total.to_editor_stats();
        stats.total.secondary_id = None;
        stats.recompute_percentages();
        stats
    }
}

/// Matches on the raw fields so entries of other kinds are never parsed.
fn is_diff_entry(raw: &Value) -> bool {
    raw.get("ty").and_then(Value::as_str) == Some(DIFF_ENTRY_TYPE)
        && raw.get("st").and_then(Value::as_str) == Some(DIFF_STYLE)
}
