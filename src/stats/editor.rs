use std::fmt;

/// One editor's contribution record.
///
/// Counters are optional so that "no data collected yet" (metadata only
/// knows the editor exists) stays distinct from "zero edits".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorStats {
    pub additions: Option<u64>,
    pub removals: Option<u64>,
    pub changes: Option<u64>,
    pub name: Option<String>,
    /// Identity token from a second id space, used to reconcile editors during merges.
    pub secondary_id: Option<String>,
    pub percent: Option<f64>,
}

impl EditorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zeroed() -> Self {
        Self {
            additions: Some(0),
            removals: Some(0),
            changes: Some(0),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn add_addition(&mut self, size: u64) {
        self.additions = Some(self.additions.unwrap_or(0).saturating_add(size));
        self.count_change();
    }

    pub fn add_removal(&mut self, size: u64) {
        self.removals = Some(self.removals.unwrap_or(0).saturating_add(size));
        self.count_change();
    }

    fn count_change(&mut self) {
        self.changes = Some(self.changes.unwrap_or(0).saturating_add(1));
    }

    /// Characters touched: additions plus removals.
    pub fn size(&self) -> u64 {
        self.additions.unwrap_or(0).saturating_add(self.removals.unwrap_or(0))
    }

    /// Sums every counter of `other` into `self`. An existing non-empty
    /// name or secondary id wins over the incoming one.
    pub fn merge_in(&mut self, other: &EditorStats) {
        self.name = prefer_present(self.name.take(), &other.name);
        self.secondary_id = prefer_present(self.secondary_id.take(), &other.secondary_id);
        self.additions = sum_counts(self.additions, other.additions);
        self.removals = sum_counts(self.removals, other.removals);
        self.changes = sum_counts(self.changes, other.changes);
    }

    /// Sets `percent` from this editor's share of `total`.
    pub fn update_percent(&mut self, total: &EditorStats) {
        let denominator = total.size();
        self.percent = Some(if denominator == 0 {
            0.0
        } else {
            self.size() as f64 / denominator as f64 * 100.0
        });
    }

    pub fn field(&self, field: EditorField) -> Option<FieldValue> {
        match field {
            EditorField::Name => self.name.clone().map(FieldValue::Text),
            EditorField::Additions => self.additions.map(FieldValue::Count),
            EditorField::Removals => self.removals.map(FieldValue::Count),
            EditorField::Changes => self.changes.map(FieldValue::Count),
            EditorField::Percent => self.percent.map(FieldValue::Percent),
        }
    }

    pub fn display(&self, field: EditorField) -> Option<String> {
        self.field(field).map(|v| v.to_string())
    }
}

fn prefer_present(current: Option<String>, incoming: &Option<String>) -> Option<String> {
    if current.as_deref().is_some_and(|s| !s.is_empty()) {
        current
    } else {
        incoming.clone().or(current)
    }
}

fn sum_counts(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        _ => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
    }
}

/// Columns a renderer can ask an [`EditorStats`] for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorField {
    Name,
    Additions,
    Removals,
    Changes,
    Percent,
}

impl EditorField {
    pub const ALL: [EditorField; 5] = [
        EditorField::Name,
        EditorField::Additions,
        EditorField::Removals,
        EditorField::Changes,
        EditorField::Percent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorField::Name => "Name",
            EditorField::Additions => "Additions",
            EditorField::Removals => "Removals",
            EditorField::Changes => "Changes",
            EditorField::Percent => "Percent",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    Percent(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Count(n) => write!(f, "{n}"),
            FieldValue::Percent(p) => write!(f, "{p:.2}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn each_accepted_edit_counts_once() {
        let mut editor = EditorStats::new();
        editor.add_addition(10);
        editor.add_addition(3);
        editor.add_removal(100);

        assert_eq!(editor.additions, Some(13));
        assert_eq!(editor.removals, Some(100));
        assert_eq!(editor.changes, Some(3));
    }

    #[test]
    fn unpopulated_is_not_zero() {
        let editor = EditorStats::new().with_name("Ada");
        assert_eq!(editor.additions, None);
        assert_eq!(editor.display(EditorField::Additions), None);
        assert_eq!(editor.size(), 0);
    }

    #[test]
    fn merge_sums_and_keeps_existing_name() {
        let mut a = EditorStats::new().with_name("Ada");
        a.add_addition(5);
        let mut b = EditorStats::new().with_name("Other");
        b.secondary_id = Some("#abc".into());
        b.add_removal(2);

        a.merge_in(&b);
        assert_eq!(a.name.as_deref(), Some("Ada"));
        assert_eq!(a.secondary_id.as_deref(), Some("#abc"));
        assert_eq!(a.additions, Some(5));
        assert_eq!(a.removals, Some(2));
        assert_eq!(a.changes, Some(2));
    }

    #[test]
    fn merge_fills_empty_name() {
        let mut a = EditorStats::zeroed().with_name("");
        a.merge_in(&EditorStats::new().with_name("Grace"));
        assert_eq!(a.name.as_deref(), Some("Grace"));
    }

    #[test]
    fn merge_of_two_unpopulated_stays_unpopulated() {
        let mut a = EditorStats::new();
        a.merge_in(&EditorStats::new());
        assert_eq!(a.additions, None);
        assert_eq!(a.changes, None);
    }

    #[test]
    fn percent_of_empty_total_is_zero() {
        let mut editor = EditorStats::zeroed();
        editor.update_percent(&EditorStats::zeroed());
        assert_eq!(editor.percent, Some(0.0));
    }

    #[test]
    fn field_values_render() {
        let mut editor = EditorStats::new().with_name("Ada");
        editor.add_addition(4);
        editor.percent = Some(12.345);
        let rendered: Vec<Option<String>> =
            EditorField::ALL.iter().map(|f| editor.display(*f)).collect();
        assert_eq!(
            rendered,
            vec![
                Some("Ada".to_string()),
                Some("4".to_string()),
                None,
                Some("1".to_string()),
                Some("12.35".to_string()),
            ]
        );
    }

    #[test]
    fn counters_saturate_instead_of_overflowing() {
        let mut editor = EditorStats::new();
        editor.add_addition(u64::MAX);
        editor.add_addition(1);
        editor.add_removal(u64::MAX);
        assert_eq!(editor.additions, Some(u64::MAX));
        assert_eq!(editor.size(), u64::MAX);

        let other = editor.clone();
        editor.merge_in(&other);
        assert_eq!(editor.removals, Some(u64::MAX));
        assert_eq!(editor.changes, Some(6));
    }
}
