use super::individual::IndividualStats;
use super::timeline::TimelineStats;
use crate::error::{InspectError, Result};
use crate::model::DocumentMeta;
use crate::util::timestamp_millis;
use tracing::debug;

/// Descriptive metadata of a document or folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralStats {
    pub id: String,
    pub name: String,
    pub link: String,
    /// ISO-8601, as reported by the source.
    pub creation_date: String,
}

impl GeneralStats {
    pub fn from_meta(meta: &DocumentMeta) -> Self {
        Self {
            id: meta.id.clone(),
            name: meta.title.clone(),
            link: meta.self_link.clone(),
            creation_date: meta.created_date.clone(),
        }
    }

    pub fn creation_millis(&self) -> Result<i64> {
        timestamp_millis(&self.creation_date)
    }
}

/// Everything collected for one document, or for a folder rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct DocStats {
    pub general: GeneralStats,
    pub individuals: IndividualStats,
    pub timeline: TimelineStats,
}

impl DocStats {
    pub fn new(increment_size: &str) -> Result<Self> {
        Ok(Self::with_timeline(TimelineStats::new(increment_size)?))
    }

    pub fn with_timeline(timeline: TimelineStats) -> Self {
        Self {
            general: GeneralStats::default(),
            individuals: IndividualStats::new(),
            timeline,
        }
    }

    /// Merges lifetime totals and timelines. `general` is left untouched.
    pub fn merge_in(&mut self, other: DocStats) -> Result<()> {
        if other.timeline.increment_size() != self.timeline.increment_size() {
            return Err(InspectError::IncrementSizeMismatch {
                expected: self.timeline.increment_size(),
                found: other.timeline.increment_size(),
            });
        }
        debug!(into = %self.general.id, from = %other.general.id, "merging document stats");
        self.individuals.merge_in(other.individuals);
        self.timeline.merge_in(other.timeline)
    }

    /// Builds a folder-level total from `children`.
    ///
    /// `timeline` supplies the (empty) timeline configuration of the rollup.
    /// The rollup's creation date becomes the earliest creation date among
    /// the children, falling back to the folder's own when none parse.
    pub fn rollup<'a>(
        general: GeneralStats,
        timeline: TimelineStats,
        children: impl IntoIterator<Item = &'a DocStats>,
    ) -> Result<DocStats> {
        let mut total = DocStats {
            general,
            individuals: IndividualStats::new(),
            timeline,
        };

        let mut earliest: Option<(i64, String)> = None;
        for child in children {
            if let Ok(millis) = child.general.creation_millis() {
                if earliest.as_ref().map_or(true, |(best, _)| millis < *best) {
                    earliest = Some((millis, child.general.creation_date.clone()));
                }
            }
            total.merge_in(child.clone())?;
        }

        if let Some((_, date)) = earliest {
            total.general.creation_date = date;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(id: &str, created: &str, editor: &str, additions: u64) -> DocStats {
        let mut stats = DocStats::new("0:1:0").unwrap();
        stats.general = GeneralStats {
            id: id.into(),
            name: id.into(),
            link: String::new(),
            creation_date: created.into(),
        };
        let created_ms = stats.general.creation_millis().unwrap();
        stats.timeline.set_timeline_start(created_ms);

        let lifetime = stats.individuals.make_editor(editor);
        lifetime.add_addition(additions);
        let snapshot = lifetime.clone();
        stats.individuals.total.merge_in(&snapshot);
        stats.individuals.recompute_percentages();

        let increment = stats.timeline.make_increment();
        increment.make_editor(editor).add_addition(additions);
        stats
    }

    #[test]
    fn merge_combines_children() {
        let mut a = doc("a", "2024-01-01T10:00:00.000Z", "alice", 30);
        let b = doc("b", "2024-01-01T10:20:00.000Z", "bob", 10);
        a.merge_in(b).unwrap();

        assert_eq!(a.general.id, "a");
        assert_eq!(a.individuals.get_editors(), vec!["alice", "bob"]);
        assert_eq!(a.individuals.get_editor("alice").unwrap().percent, Some(75.0));
        assert_eq!(a.timeline.get_num_increments(), 1);
        assert_eq!(a.timeline.get_increment(0).unwrap().len(), 2);
    }

    #[test]
    fn mismatched_increment_leaves_target_untouched() {
        let mut a = doc("a", "2024-01-01T10:00:00.000Z", "alice", 30);
        let mut b = DocStats::new("1:0:0").unwrap();
        b.individuals.make_editor("bob");
        assert!(a.merge_in(b).is_err());
        assert_eq!(a.individuals.get_editors(), vec!["alice"]);
    }

    #[test]
    fn rollup_uses_earliest_child_creation() {
        let later = doc("later", "2024-03-01T00:00:00.000Z", "alice", 1);
        let earlier = doc("earlier", "2024-01-01T00:00:00.000Z", "bob", 1);
        let folder = GeneralStats {
            id: "folder".into(),
            name: "Folder".into(),
            link: String::new(),
            creation_date: "2025-01-01T00:00:00.000Z".into(),
        };

        let rollup = DocStats::rollup(
            folder,
            TimelineStats::new("0:1:0").unwrap(),
            [&later, &earlier],
        )
        .unwrap();

        assert_eq!(rollup.general.id, "folder");
        assert_eq!(rollup.general.creation_date, "2024-01-01T00:00:00.000Z");
        assert_eq!(rollup.individuals.len(), 2);
        assert_eq!(
            rollup.timeline.timeline_start,
            earlier.timeline.timeline_start
        );
    }

    #[test]
    fn rollup_without_children_keeps_folder_date() {
        let folder = GeneralStats {
            creation_date: "2025-01-01T00:00:00.000Z".into(),
            ..GeneralStats::default()
        };
        let rollup =
            DocStats::rollup(folder, TimelineStats::new("1:0:0").unwrap(), std::iter::empty())
                .unwrap();
        assert_eq!(rollup.general.creation_date, "2025-01-01T00:00:00.000Z");
        assert_eq!(rollup.timeline.get_num_increments(), 0);
    }
}
