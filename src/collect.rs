use crate::changes::{ChangeData, ParseReport};
use crate::error::{InspectError, Result};
use crate::model::{DateRange, DetailedHistory, DetailedRevision, DocumentMeta, RevisionRecord};
use crate::source::DocumentSource;
use crate::stats::{
    bucket_by_time, DocStats, GeneralStats, RevisionPoint, TimelineStats,
    DEFAULT_TOLERANCE_FRACTION,
};
use crate::util::{parse_increment_size, timestamp_millis};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Knobs for one collection run.
#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub increment_size: i64,
    /// Timeline merge tolerance as a fraction of `increment_size`.
    pub tolerance: f64,
    /// Overlay the fine-grained diff payload when the source has one.
    pub detailed: bool,
    /// List the unknown bucket as an editor instead of only counting it in totals.
    pub include_unknown: bool,
    pub range: DateRange,
    pub progress: bool,
}

impl InspectConfig {
    pub fn new(increment: &str) -> Result<Self> {
        Ok(Self {
            increment_size: parse_increment_size(increment)?,
            tolerance: DEFAULT_TOLERANCE_FRACTION,
            detailed: false,
            include_unknown: false,
            range: DateRange::new(),
            progress: false,
        })
    }

    pub fn timeline(&self) -> Result<TimelineStats> {
        let mut timeline = TimelineStats::with_increment_size(self.increment_size)?;
        timeline.set_overlap_tolerance(self.tolerance)?;
        Ok(timeline)
    }
}

/// Result of collecting an id that may name a file or a folder.
#[derive(Debug, Clone)]
pub enum Collected {
    File(DocStats),
    Folder { rollup: DocStats, files: Vec<DocStats> },
}

impl Collected {
    /// Every stats tree, rollup first.
    pub fn all(&self) -> Vec<&DocStats> {
        match self {
            Collected::File(stats) => vec![stats],
            Collected::Folder { rollup, files } => {
                std::iter::once(rollup).chain(files.iter()).collect()
            }
        }
    }
}

pub fn try_collect<S: DocumentSource + ?Sized>(
    source: &S,
    id: &str,
    config: &InspectConfig,
) -> Result<Collected> {
    let meta = source.metadata(id)?;
    if meta.is_folder() {
        let (rollup, files) = collect_folder(source, &meta, config)?;
        Ok(Collected::Folder { rollup, files })
    } else if meta.is_document() {
        collect_document(source, &meta, config).map(Collected::File)
    } else {
        Err(InspectError::Source(format!(
            "Unknown file type '{}' for {id}",
            meta.mime_type
        )))
    }
}

pub fn collect_document<S: DocumentSource + ?Sized>(
    source: &S,
    meta: &DocumentMeta,
    config: &InspectConfig,
) -> Result<DocStats> {
    debug!(id = %meta.id, "collecting document");
    let mut stats = DocStats::with_timeline(config.timeline()?);
    collect_general(&mut stats, meta)?;

    let points = revision_points(&source.revisions(&meta.id)?, &config.range);
    collect_individuals(&mut stats, &points);
    collect_timeline(&mut stats, &points);

    if config.detailed {
        match source.detailed(&meta.id)? {
            Some(history) => {
                let report = apply_detailed(&mut stats, &history, config);
                if report.has_anomalies() {
                    warn!(
                        id = %meta.id,
                        fallback = report.fallback,
                        ghost = report.ghost,
                        malformed = report.malformed,
                        "diff payload contained irregular entries"
                    );
                }
            }
            None => warn!(id = %meta.id, "no detailed history; keeping revision-list numbers"),
        }
    }
    Ok(stats)
}

/// Collects every document in a folder and merges them into a rollup.
pub fn collect_folder<S: DocumentSource + ?Sized>(
    source: &S,
    meta: &DocumentMeta,
    config: &InspectConfig,
) -> Result<(DocStats, Vec<DocStats>)> {
    let pb = if config.progress {
        let pb = ProgressBar::new(meta.children.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut files = Vec::with_capacity(meta.children.len());
    for child_id in &meta.children {
        pb.set_message(child_id.clone());
        let child = source.metadata(child_id)?;
        if child.is_document() {
            files.push(collect_document(source, &child, config)?);
        } else {
            debug!(id = %child_id, mime = %child.mime_type, "skipping non-document child");
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let rollup = DocStats::rollup(GeneralStats::from_meta(meta), config.timeline()?, &files)?;
    info!(folder = %meta.id, documents = files.len(), "collected folder");
    Ok((rollup, files))
}

pub fn collect_general(stats: &mut DocStats, meta: &DocumentMeta) -> Result<()> {
    stats.general = GeneralStats::from_meta(meta);
    let created = stats.general.creation_millis()?;
    stats.timeline.set_timeline_start(created);
    Ok(())
}

/// Parses, filters and sorts a revision list for bucketing.
///
/// Revisions with unreadable timestamps are skipped with a warning.
pub fn revision_points(records: &[RevisionRecord], range: &DateRange) -> Vec<RevisionPoint> {
    let mut points: Vec<RevisionPoint> = records
        .iter()
        .filter_map(|record| match timestamp_millis(&record.modified_date) {
            Ok(millis) => Some(RevisionPoint {
                modified_millis: millis,
                editor: record.last_modifying_user_name.clone(),
            }),
            Err(e) => {
                warn!(error = %e, "skipping revision");
                None
            }
        })
        .filter(|p| range.contains_millis(p.modified_millis))
        .collect();
    points.sort_by_key(|p| p.modified_millis);
    points
}

/// Lists every editor seen in the revision list. Counters stay unpopulated.
pub fn collect_individuals(stats: &mut DocStats, points: &[RevisionPoint]) {
    for editor in points.iter().filter_map(|p| p.editor.as_deref()) {
        stats.individuals.editor_entry(editor).name = Some(editor.to_string());
    }
}

pub fn collect_timeline(stats: &mut DocStats, points: &[RevisionPoint]) {
    stats.timeline.bucket_revisions(points);
}

/// Replaces lifetime totals and increments with numbers from the diff payload.
pub fn apply_detailed(
    stats: &mut DocStats,
    history: &DetailedHistory,
    config: &InspectConfig,
) -> ParseReport {
    let mut revisions: Vec<&DetailedRevision> = history
        .revisions
        .iter()
        .filter(|r| config.range.contains_millis(r.end_millis))
        .collect();
    revisions.sort_by_key(|r| r.end_millis);

    let total = ChangeData::from_revisions(revisions.iter().copied());
    stats.individuals = total.to_individual_stats(config.include_unknown);

    let buckets = bucket_by_time(
        revisions,
        stats.timeline.timeline_start,
        stats.timeline.increment_size(),
        |r| r.end_millis,
    );
    stats.timeline.clear_increments();
    for bucket in buckets {
        let changes = ChangeData::from_revisions(bucket);
        *stats.timeline.make_increment() = changes.to_individual_stats(config.include_unknown);
    }

    debug!(
        id = %stats.general.id,
        editors = stats.individuals.len(),
        increments = stats.timeline.get_num_increments(),
        "applied detailed history"
    );
    total.report
}
