// ddlog - app/patterns.rs
//
// Hands the messages of a fetched batch to a `Clusterer` and prints the
// summary. Used in one-shot mode only; any clustering failure is returned to
// the caller before anything is written.

use crate::core::format::Renderer;
use crate::core::model::LogEntry;
use crate::core::pattern::{Clusterer, PatternSummary};
use crate::util::error::Result;
use std::io::Write;

/// Message text of every entry, in order.
pub fn messages(entries: &[LogEntry]) -> Vec<String> {
    entries.iter().map(|e| e.message().to_string()).collect()
}

/// Cluster the batch at `level` and render the result.
pub fn summarise<C, W>(
    entries: &[LogEntry],
    level: u8,
    clusterer: &C,
    renderer: &mut Renderer,
    out: &mut W,
) -> Result<PatternSummary>
where
    C: Clusterer + ?Sized,
    W: Write,
{
    let messages = messages(entries);
    tracing::info!(messages = messages.len(), level, "Mining patterns");

    let summary = clusterer.cluster(&messages, level)?;
    renderer.write_patterns(&summary, out)?;
    Ok(summary)
}
