use crate::error::Result;
use crate::model::{
    DocumentOutput, EditorOutput, IncrementOutput, IndividualsOutput, StatsOutput,
    TimelineOutput, SCHEMA_VERSION,
};
use crate::stats::{DocStats, EditorStats, IndividualStats};
use crate::util::millis_to_datetime;
use chrono::Utc;

pub fn to_output(stats: &DocStats) -> StatsOutput {
    StatsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        document: DocumentOutput {
            id: stats.general.id.clone(),
            name: stats.general.name.clone(),
            link: stats.general.link.clone(),
            creation_date: stats.general.creation_date.clone(),
        },
        individuals: individuals_output(&stats.individuals),
        timeline: TimelineOutput {
            increment_size_ms: stats.timeline.increment_size(),
            timeline_start: millis_to_datetime(stats.timeline.timeline_start),
            increments: increments_output(stats),
        },
    }
}

pub fn render_json(stats: &DocStats) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&to_output(stats))?;
    out.push('\n');
    Ok(out)
}

/// One increment per line.
pub fn render_ndjson(stats: &DocStats) -> Result<String> {
    let mut out = String::new();
    for increment in increments_output(stats) {
        out.push_str(&serde_json::to_string(&increment)?);
        out.push('\n');
    }
    Ok(out)
}

fn increments_output(stats: &DocStats) -> Vec<IncrementOutput> {
    stats
        .timeline
        .iter_with_start()
        .enumerate()
        .map(|(index, (start, increment))| {
            let IndividualsOutput { editors, total } = individuals_output(increment);
            IncrementOutput {
                index,
                start: millis_to_datetime(start),
                editors,
                total,
            }
        })
        .collect()
}

fn individuals_output(individuals: &IndividualStats) -> IndividualsOutput {
    IndividualsOutput {
        editors: individuals
            .editors()
            .map(|(id, editor)| editor_output(id, editor))
            .collect(),
        total: editor_output("total", &individuals.total),
    }
}

fn editor_output(id: &str, editor: &EditorStats) -> EditorOutput {
    EditorOutput {
        id: id.to_string(),
        name: editor.name.clone(),
        additions: editor.additions,
        removals: editor.removals,
        changes: editor.changes,
        percent: editor.percent,
    }
}
