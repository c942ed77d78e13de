//! Renderers for a finished [`DocStats`] tree.

pub mod csv;
pub mod json;
pub mod plain;

use crate::error::Result;
use crate::stats::DocStats;
use clap::ValueEnum;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Csv,
    Json,
    Ndjson,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Plain => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Ndjson => "ndjson",
        }
    }
}

/// Where and how finished stats are written.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// One file per document under this directory; stdout when `None`.
    pub dir: Option<PathBuf>,
}

pub fn render(stats: &DocStats, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => plain::render_plain(stats),
        OutputFormat::Csv => Ok(csv::render_csv(stats)),
        OutputFormat::Json => json::render_json(stats),
        OutputFormat::Ndjson => json::render_ndjson(stats),
    }
}

/// Renders `stats` and writes it out. Returns the file written, if any.
pub fn write_stats(stats: &DocStats, config: &OutputConfig) -> Result<Option<PathBuf>> {
    let rendered = render(stats, config.format)?;
    match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(file_name(stats, config.format));
            // Files never carry terminal styling.
            fs::write(&path, console::strip_ansi_codes(&rendered).as_bytes())?;
            info!(path = %path.display(), "wrote stats");
            Ok(Some(path))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            Ok(None)
        }
    }
}

/// Writes several trees (a folder rollup and its documents).
///
/// Into a directory each tree gets its own file. On stdout JSON trees are
/// wrapped into one array so the stream stays a single document; the other
/// formats are written one after another.
pub fn write_collection(trees: &[&DocStats], config: &OutputConfig) -> Result<Vec<PathBuf>> {
    if config.dir.is_none() && config.format == OutputFormat::Json && trees.len() > 1 {
        let outputs: Vec<_> = trees.iter().map(|stats| json::to_output(stats)).collect();
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", serde_json::to_string_pretty(&outputs)?)?;
        stdout.flush()?;
        return Ok(Vec::new());
    }

    let mut written = Vec::new();
    for stats in trees {
        if let Some(path) = write_stats(stats, config)? {
            written.push(path);
        }
    }
    Ok(written)
}

/// `<name>.<ext>` with path separators and control characters replaced.
/// Falls back to the id when the name is blank.
pub fn file_name(stats: &DocStats, format: OutputFormat) -> String {
    let base = if stats.general.name.trim().is_empty() {
        stats.general.id.as_str()
    } else {
        stats.general.name.trim()
    };
    let sanitized: String = base
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = match sanitized.as_str() {
        "" | "." | ".." => "document".to_string(),
        _ => sanitized,
    };
    format!("{}.{}", sanitized, format.extension())
}
