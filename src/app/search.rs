// ddlog - app/search.rs
//
// One-shot bulk fetch: follows continuation tokens until the server reports
// no further pages and returns every page concatenated in order.

use crate::core::model::{LogEntry, QueryWindow};
use crate::core::source::LogSource;
use crate::util::constants::MAX_PAGES;
use crate::util::error::ApiError;

/// Fetch every page of `query` over `window`.
///
/// The first failing page aborts the whole fetch; nothing is retried.
pub fn fetch_all<S: LogSource + ?Sized>(
    source: &S,
    query: &str,
    window: &QueryWindow,
) -> Result<Vec<LogEntry>, ApiError> {
    fetch_all_bounded(source, query, window, MAX_PAGES)
}

/// `fetch_all` with an explicit page cap. Reaching the cap logs a warning and
/// returns the pages fetched so far.
pub fn fetch_all_bounded<S: LogSource + ?Sized>(
    source: &S,
    query: &str,
    window: &QueryWindow,
    max_pages: usize,
) -> Result<Vec<LogEntry>, ApiError> {
    let mut page = source.search(query, window, None)?;
    let mut entries = std::mem::take(&mut page.logs);
    let mut pages = 1usize;

    while let Some(token) = page.continuation().map(str::to_string) {
        if pages >= max_pages {
            tracing::warn!(
                pages,
                entries = entries.len(),
                "Page limit reached; results are truncated"
            );
            break;
        }
        page = source.search(query, window, Some(&token))?;
        entries.append(&mut page.logs);
        pages += 1;
        tracing::debug!(pages, entries = entries.len(), "Fetched page");
    }

    tracing::info!(pages, entries = entries.len(), "Search complete");
    Ok(entries)
}
