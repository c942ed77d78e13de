use crate::error::Result;
use crate::stats::{DocStats, EditorField, EditorStats, IndividualStats};
use crate::util::millis_to_datetime;
use console::style;
use std::fmt::Write;
use std::time::Duration;

const NAME_WIDTH: usize = 24;
const CELL_WIDTH: usize = 14;
const NOT_AVAILABLE: &str = "N/A";

pub fn render_plain(stats: &DocStats) -> Result<String> {
    let mut out = String::new();
    write_all(&mut out, stats)?;
    Ok(out)
}

fn write_all(out: &mut impl Write, stats: &DocStats) -> std::fmt::Result {
    write_general(out, stats)?;
    write_individuals(out, &stats.individuals)?;
    write_timeline(out, stats)
}

fn write_general(out: &mut impl Write, stats: &DocStats) -> std::fmt::Result {
    writeln!(out, "{}", style("General").bold())?;
    writeln!(out, "{}", "─".repeat(50))?;
    let general = &stats.general;
    for (label, value) in [
        ("ID", &general.id),
        ("Name", &general.name),
        ("Link", &general.link),
        ("Created", &general.creation_date),
    ] {
        writeln!(out, "{:<10} {}", label, value)?;
    }
    writeln!(out)
}

fn write_individuals(out: &mut impl Write, individuals: &IndividualStats) -> std::fmt::Result {
    writeln!(out, "{}", style("Individuals").bold())?;
    write!(out, "{:<NAME_WIDTH$}", style("Editor").bold())?;
    for field in EditorField::ALL.iter().skip(1) {
        write!(out, " {:>CELL_WIDTH$}", style(field.label()).bold())?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "─".repeat(NAME_WIDTH + (CELL_WIDTH + 1) * 4))?;

    if individuals.is_empty() {
        writeln!(out, "No editors")?;
    }
    for (id, editor) in individuals.editors() {
        write_editor_row(out, &editor_label(id, editor), editor)?;
    }
    write_editor_row(out, "Total", &individuals.total)?;
    writeln!(out)
}

fn write_editor_row(out: &mut impl Write, label: &str, editor: &EditorStats) -> std::fmt::Result {
    write!(out, "{:<NAME_WIDTH$}", truncate(label, NAME_WIDTH))?;
    for field in EditorField::ALL.iter().skip(1) {
        let value = editor
            .display(*field)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        write!(out, " {:>CELL_WIDTH$}", value)?;
    }
    writeln!(out)
}

/// One row per increment, one column per editor seen anywhere in the document.
fn write_timeline(out: &mut impl Write, stats: &DocStats) -> std::fmt::Result {
    let timeline = &stats.timeline;
    let size = humantime::format_duration(Duration::from_millis(
        u64::try_from(timeline.increment_size()).unwrap_or(0),
    ));
    writeln!(out, "{} ({} increments)", style("Timeline").bold(), size)?;

    if timeline.get_num_increments() == 0 {
        writeln!(out, "No revisions in range")?;
        return Ok(());
    }

    let mut columns: Vec<(&str, String)> = stats
        .individuals
        .editors()
        .map(|(id, editor)| (id, editor_label(id, editor)))
        .collect();
    for increment in timeline.increments() {
        for (id, editor) in increment.editors() {
            if !columns.iter().any(|(known, _)| *known == id) {
                columns.push((id, editor_label(id, editor)));
            }
        }
    }

    write!(out, "{:<17}", style("Start").bold())?;
    for (_, label) in &columns {
        write!(out, " {:>CELL_WIDTH$}", truncate(label, CELL_WIDTH))?;
    }
    writeln!(out, " {:>CELL_WIDTH$}", style("Total").bold())?;
    writeln!(out, "{}", "─".repeat(17 + (CELL_WIDTH + 1) * (columns.len() + 1)))?;

    for (start, increment) in timeline.iter_with_start() {
        let start = millis_to_datetime(start)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| start.to_string());
        write!(out, "{:<17}", start)?;
        for (id, _) in &columns {
            let cell = increment
                .get_editor(id)
                .map(activity_cell)
                .unwrap_or_default();
            write!(out, " {:>CELL_WIDTH$}", cell)?;
        }
        let total = if increment.is_empty() {
            String::new()
        } else {
            increment.len().to_string()
        };
        writeln!(out, " {:>CELL_WIDTH$}", total)?;
    }
    Ok(())
}

/// `+added/-removed` when counts are known, a dot when only activity is.
fn activity_cell(editor: &EditorStats) -> String {
    match (editor.additions, editor.removals) {
        (None, None) => "•".to_string(),
        (additions, removals) => format!(
            "+{}/-{}",
            additions.unwrap_or(0),
            removals.unwrap_or(0)
        ),
    }
}

fn editor_label(id: &str, editor: &EditorStats) -> String {
    match editor.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => id.to_string(),
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
