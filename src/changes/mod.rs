//! Fine-grained diff payloads turned into per-author counts.

pub mod data;
pub mod record;

pub use data::{ChangeData, EditorChanges, ParseReport, UNKNOWN_EDITOR};
pub use record::{EditKind, EditOutcome, EditRecord};
