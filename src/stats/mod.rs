pub mod doc;
pub mod editor;
pub mod individual;
pub mod timeline;

pub use doc::{DocStats, GeneralStats};
pub use editor::{EditorField, EditorStats, FieldValue};
pub use individual::IndividualStats;
pub use timeline::{bucket_by_time, RevisionPoint, TimelineStats, DEFAULT_TOLERANCE_FRACTION};
