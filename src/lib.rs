//! Contribution statistics for shared documents.
//!
//! Revision history is reduced to per-editor totals ([`stats::IndividualStats`])
//! and a fixed-increment timeline ([`stats::TimelineStats`]), both mergeable so
//! a folder of documents rolls up into one [`stats::DocStats`].

pub mod changes;
pub mod cli;
pub mod collect;
pub mod error;
pub mod model;
pub mod output;
pub mod source;
pub mod stats;
pub mod util;

pub use error::{InspectError, Result};
