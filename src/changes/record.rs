use crate::model::SnapshotEntry;

pub const ADDITION_TYPE: i64 = 1;
pub const REMOVAL_TYPE: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Addition,
    Removal,
    /// No edit type on the entry; counted as an addition.
    Untyped,
    /// An edit type outside {addition, removal}; never counted.
    /// `None` when the type is not an integer at all.
    Ghost(Option<i64>),
}

/// What happened to a diff entry once classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Added(u64),
    Removed(u64),
    FallbackAdded(u64),
    Empty,
    Ghost { size: Option<i64>, edit_type: Option<i64> },
    /// Inverted range, or a span too wide to represent (`size` is `None`).
    Malformed { size: Option<i64> },
}

impl EditOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            EditOutcome::Added(_) | EditOutcome::Removed(_) | EditOutcome::FallbackAdded(_)
        )
    }
}

/// One character-range change by one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    /// Raw author tag, empty when the entry carries none.
    pub author: String,
    /// `end - start + 1`; ranges are inclusive on both ends. `None` on overflow.
    pub size: Option<i64>,
    pub kind: EditKind,
}

impl EditRecord {
    pub fn from_entry(entry: &SnapshotEntry) -> Self {
        let kind = match entry.meta.edit_type.as_ref().map(serde_json::Value::as_i64) {
            None => EditKind::Untyped,
            Some(Some(ADDITION_TYPE)) => EditKind::Addition,
            Some(Some(REMOVAL_TYPE)) => EditKind::Removal,
            Some(other) => EditKind::Ghost(other),
        };
        Self {
            author: entry.meta.author.clone().unwrap_or_default(),
            size: entry
                .end_index
                .checked_sub(entry.start_index)
                .and_then(|span| span.checked_add(1)),
            kind,
        }
    }

    pub fn outcome(&self) -> EditOutcome {
        if self.size == Some(0) {
            return EditOutcome::Empty;
        }
        match (self.kind, self.size.and_then(|size| u64::try_from(size).ok())) {
            (EditKind::Ghost(edit_type), _) => EditOutcome::Ghost {
                size: self.size,
                edit_type,
            },
            (_, None) => EditOutcome::Malformed { size: self.size },
            (EditKind::Addition, Some(size)) => EditOutcome::Added(size),
            (EditKind::Removal, Some(size)) => EditOutcome::Removed(size),
            (EditKind::Untyped, Some(size)) => EditOutcome::FallbackAdded(size),
        }
    }
}
