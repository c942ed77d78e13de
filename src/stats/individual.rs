use super::editor::EditorStats;
use crate::error::{InspectError, Result};
use indexmap::IndexMap;

/// Per-editor contribution records plus their running total.
///
/// Editors iterate in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndividualStats {
    editors: IndexMap<String, EditorStats>,
    pub total: EditorStats,
}

impl IndividualStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh record under `id`, replacing any existing one.
    pub fn make_editor(&mut self, id: impl Into<String>) -> &mut EditorStats {
        let id = id.into();
        self.editors.insert(id.clone(), EditorStats::new());
        self.editors.entry(id).or_default()
    }

    /// Returns the record under `id`, creating an empty one if needed.
    pub fn editor_entry(&mut self, id: impl Into<String>) -> &mut EditorStats {
        self.editors.entry(id.into()).or_default()
    }

    pub fn get_editor(&self, id: &str) -> Result<&EditorStats> {
        self.editors
            .get(id)
            .ok_or_else(|| InspectError::EditorNotFound(id.to_string()))
    }

    pub fn get_editor_mut(&mut self, id: &str) -> Result<&mut EditorStats> {
        self.editors
            .get_mut(id)
            .ok_or_else(|| InspectError::EditorNotFound(id.to_string()))
    }

    pub fn remove_editor(&mut self, id: &str) -> Result<EditorStats> {
        self.editors
            .shift_remove(id)
            .ok_or_else(|| InspectError::EditorNotFound(id.to_string()))
    }

    pub fn clear_editors(&mut self) {
        self.editors.clear();
    }

    pub fn contains_editor(&self, id: &str) -> bool {
        self.editors.contains_key(id)
    }

    pub fn get_editors(&self) -> Vec<&str> {
        self.editors.keys().map(String::as_str).collect()
    }

    pub fn editors(&self) -> impl Iterator<Item = (&str, &EditorStats)> {
        self.editors.iter().map(|(id, stats)| (id.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Finds the editor whose secondary id equals `secondary_id`.
    pub fn find_editor_by_secondary(&self, secondary_id: &str) -> Option<&str> {
        self.editors
            .iter()
            .find(|(_, e)| e.secondary_id.as_deref() == Some(secondary_id))
            .map(|(id, _)| id.as_str())
    }

    /// Folds `other` into `self`.
    ///
    /// Incoming editors are matched by secondary id first, then by key.
    /// Unmatched editors are added under their own key. Percentages are
    /// recomputed from the merged total afterwards.
    pub fn merge_in(&mut self, other: IndividualStats) {
        let IndividualStats { editors, total } = other;

        for (key, incoming) in editors {
            let target = incoming
                .secondary_id
                .as_deref()
                .and_then(|sid| self.find_editor_by_secondary(sid))
                .map(str::to_owned)
                .or_else(|| self.editors.contains_key(&key).then(|| key.clone()));

            match target.and_then(|id| self.editors.get_mut(&id)) {
                Some(existing) => existing.merge_in(&incoming),
                None => self.make_editor(key).merge_in(&incoming),
            }
        }

        self.total.merge_in(&total);
        self.recompute_percentages();
    }

    pub fn recompute_percentages(&mut self) {
        let total = &self.total;
        for editor in self.editors.values_mut() {
            editor.update_percent(total);
        }
        let snapshot = self.total.clone();
        self.total.update_percent(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_editor(id: &str, additions: u64, removals: u64) -> IndividualStats {
        let mut stats = IndividualStats::new();
        let editor = stats.make_editor(id);
        editor.name = Some(id.to_string());
        editor.add_addition(additions);
        editor.add_removal(removals);
        let snapshot = editor.clone();
        stats.total.merge_in(&snapshot);
        stats.recompute_percentages();
        stats
    }

    #[test]
    fn lookup_miss_is_an_error() {
        let mut stats = IndividualStats::new();
        assert!(matches!(
            stats.get_editor("nobody"),
            Err(InspectError::EditorNotFound(id)) if id == "nobody"
        ));
        assert!(stats.remove_editor("nobody").is_err());
    }

    #[test]
    fn editors_keep_insertion_order() {
        let mut stats = IndividualStats::new();
        stats.make_editor("zed");
        stats.make_editor("amy");
        stats.make_editor("bob");
        stats.remove_editor("amy").unwrap();
        assert_eq!(stats.get_editors(), vec!["zed", "bob"]);
    }

    #[test]
    fn merge_disjoint_editors_and_percentages() {
        let mut a = with_editor("alice", 30, 0);
        a.merge_in(with_editor("bob", 5, 5));

        assert_eq!(a.get_editors(), vec!["alice", "bob"]);
        assert_eq!(a.total.additions, Some(35));
        assert_eq!(a.total.removals, Some(5));
        assert_eq!(a.total.changes, Some(4));
        assert_eq!(a.get_editor("alice").unwrap().percent, Some(75.0));
        assert_eq!(a.get_editor("bob").unwrap().percent, Some(25.0));
        assert_eq!(a.total.percent, Some(100.0));
    }

    #[test]
    fn merge_same_key_sums() {
        let mut a = with_editor("alice", 10, 0);
        a.merge_in(with_editor("alice", 2, 1));
        let alice = a.get_editor("alice").unwrap();
        assert_eq!(alice.additions, Some(12));
        assert_eq!(alice.removals, Some(1));
        assert_eq!(alice.changes, Some(4));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn merge_matches_secondary_id_across_key_spaces() {
        let mut coarse = with_editor("Alice Smith", 10, 0);
        coarse.get_editor_mut("Alice Smith").unwrap().secondary_id = Some("#f00".into());

        let mut fine = with_editor("#f00", 4, 4);
        fine.get_editor_mut("#f00").unwrap().secondary_id = Some("#f00".into());

        coarse.merge_in(fine);
        assert_eq!(coarse.get_editors(), vec!["Alice Smith"]);
        let alice = coarse.get_editor("Alice Smith").unwrap();
        assert_eq!(alice.additions, Some(14));
        assert_eq!(alice.removals, Some(4));
    }

    #[test]
    fn zero_totals_give_zero_percent() {
        let mut a = IndividualStats::new();
        a.make_editor("x");
        let mut b = IndividualStats::new();
        b.make_editor("y");
        a.merge_in(b);
        assert_eq!(a.get_editor("x").unwrap().percent, Some(0.0));
        assert_eq!(a.get_editor("y").unwrap().percent, Some(0.0));
    }

    #[test]
    fn merge_preserves_unpopulated_counters() {
        let mut a = IndividualStats::new();
        a.make_editor("x").name = Some("X".into());
        let mut b = IndividualStats::new();
        b.make_editor("y").name = Some("Y".into());
        a.merge_in(b);
        assert_eq!(a.get_editor("y").unwrap().additions, None);
        assert_eq!(a.get_editor("y").unwrap().name.as_deref(), Some("Y"));
    }
}
