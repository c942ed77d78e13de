use crate::stats::{DocStats, EditorField, EditorStats};
use crate::util::millis_to_datetime;

const DELIMITER: char = ',';

/// Renders the general, individuals and timeline sections, separated by a
/// blank line. Unpopulated counters become empty cells.
pub fn render_csv(stats: &DocStats) -> String {
    let mut out = String::new();

    push_row(&mut out, &["id", "name", "link", "creation_date"]);
    push_row(
        &mut out,
        &[
            &stats.general.id,
            &stats.general.name,
            &stats.general.link,
            &stats.general.creation_date,
        ],
    );
    out.push('\n');

    push_row(&mut out, &["editor", "name", "additions", "removals", "changes", "percent"]);
    for (id, editor) in stats.individuals.editors() {
        push_editor_row(&mut out, &[id], editor);
    }
    push_editor_row(&mut out, &["total"], &stats.individuals.total);
    out.push('\n');

    push_row(
        &mut out,
        &[
            "increment", "start", "editor", "name", "additions", "removals", "changes", "percent",
        ],
    );
    for (index, (start, increment)) in stats.timeline.iter_with_start().enumerate() {
        let index = index.to_string();
        let start = millis_to_datetime(start)
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        if increment.is_empty() {
            push_row(&mut out, &[&index, &start, "", "", "", "", "", ""]);
            continue;
        }
        for (id, editor) in increment.editors() {
            push_editor_row(&mut out, &[&index, &start, id], editor);
        }
    }
    out
}

fn push_editor_row(out: &mut String, prefix: &[&str], editor: &EditorStats) {
    let cells: Vec<String> = EditorField::ALL
        .iter()
        .map(|&field| editor.display(field).unwrap_or_default())
        .collect();
    let mut row: Vec<&str> = prefix.to_vec();
    row.extend(cells.iter().map(String::as_str));
    push_row(out, &row);
}

fn push_row(out: &mut String, cells: &[&str]) {
    let escaped: Vec<String> = cells.iter().map(|c| escape(c)).collect();
    out.push_str(&escaped.join(&DELIMITER.to_string()));
    out.push('\n');
}

fn escape(value: &str) -> String {
    if value.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
