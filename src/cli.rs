use crate::collect::{self, Collected, InspectConfig};
use crate::output::{self, OutputConfig, OutputFormat};
use crate::source::DirSource;
use crate::stats::DEFAULT_TOLERANCE_FRACTION;
use crate::util::resolve_range;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "docinspect")]
#[command(about = "Per-editor contribution statistics and timelines for shared documents")]
#[command(version)]
pub struct Cli {
    #[arg(help = "Document or folder id")]
    pub id: String,

    #[arg(long, help = "Directory holding exported payloads, one subdirectory per id", default_value = ".")]
    pub data: PathBuf,

    #[arg(short = 't', long = "time", help = "Timeline increment as days:hours:minutes, or a duration like 6h", default_value = "1:0:0")]
    pub time: String,

    #[arg(long, help = "Timeline merge tolerance as a fraction of the increment, in [0, 1)", default_value_t = DEFAULT_TOLERANCE_FRACTION)]
    pub tolerance: f64,

    #[arg(short = 'u', long, help = "Use the detailed diff payload for exact additions and removals")]
    pub detailed: bool,

    #[arg(long, help = "List edits without a known author as their own editor")]
    pub include_unknown: bool,

    #[arg(long, help = "Ignore revisions before this date (RFC3339, YYYY-MM-DD, or natural language)")]
    pub since: Option<String>,

    #[arg(long, help = "Ignore revisions after this date (RFC3339, YYYY-MM-DD, or natural language)")]
    pub until: Option<String>,

    #[arg(short = 'f', long, value_enum, help = "Output format", default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    #[arg(short = 'o', long, help = "Write one file per document into this directory instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(short, long, help = "Log collection details to stderr")]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn inspect_config(&self) -> Result<InspectConfig> {
        let mut config = InspectConfig::new(&self.time)
            .with_context(|| format!("Invalid increment '{}'", self.time))?;
        config.tolerance = self.tolerance;
        config.detailed = self.detailed;
        config.include_unknown = self.include_unknown;
        config.range = resolve_range(self.since.as_deref(), self.until.as_deref())
            .context("Invalid date range")?;
        config.progress = console::Term::stderr().is_term();
        // Rejects an out-of-range tolerance before any data is read.
        config.timeline().context("Invalid timeline settings")?;
        Ok(config)
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            format: self.format,
            dir: self.output.clone(),
        }
    }

    pub fn execute(self) -> Result<()> {
        let config = self.inspect_config()?;
        let output_config = self.output_config();
        debug!(?config, ?output_config, "starting");

        let source = DirSource::open(Some(&self.data))
            .with_context(|| format!("Failed to open data directory {}", self.data.display()))?;
        let collected = collect::try_collect(&source, &self.id, &config)
            .with_context(|| format!("Failed to collect statistics for '{}'", self.id))?;

        if let Collected::Folder { files, .. } = &collected {
            if files.is_empty() {
                eprintln!("Folder '{}' contains no documents", self.id);
            }
        }

        let written = output::write_collection(&collected.all(), &output_config)
            .context("Failed to write statistics")?;
        for path in written {
            eprintln!("Wrote {}", path.display());
        }
        Ok(())
    }
}
