// ddlog - app/oneshot.rs
//
// Mode selection and the non-tailing run: fetch every page of one window,
// then list the entries, print per-minute stats, or mine patterns.

use crate::app::patterns;
use crate::app::search::fetch_all;
use crate::core::format::Renderer;
use crate::core::model::QueryWindow;
use crate::core::pattern::Clusterer;
use crate::core::source::LogSource;
use crate::core::stats::minute_counts;
use crate::util::error::Result;
use std::io::Write;

/// What an invocation does, resolved from the CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tail,
    Stats,
    Patterns(u8),
    List,
}

impl Mode {
    /// Precedence: tail > stats > patterns > list.
    pub fn select(tail: bool, stats: bool, pattern_level: Option<u8>) -> Self {
        if tail {
            Self::Tail
        } else if stats {
            Self::Stats
        } else if let Some(level) = pattern_level {
            Self::Patterns(level)
        } else {
            Self::List
        }
    }
}

/// Output of a one-shot run.
pub enum Report<'a> {
    List,
    Stats,
    Patterns {
        level: u8,
        clusterer: &'a dyn Clusterer,
    },
}

/// Fetch `window` and write the requested report. Returns the number of
/// entries fetched.
///
/// A failed page aborts before anything is written.
pub fn run_oneshot<S, W>(
    source: &S,
    query: &str,
    window: &QueryWindow,
    report: Report<'_>,
    renderer: &mut Renderer,
    out: &mut W,
) -> Result<usize>
where
    S: LogSource + ?Sized,
    W: Write,
{
    let entries = fetch_all(source, query, window)?;

    match report {
        Report::List => {
            renderer.write_entries(&entries, out)?;
        }
        Report::Stats => {
            renderer.write_stats(&minute_counts(&entries, window), out)?;
        }
        Report::Patterns { level, clusterer } => {
            patterns::summarise(&entries, level, clusterer, renderer, out)?;
        }
    }

    Ok(entries.len())
}
