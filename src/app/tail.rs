// ddlog - app/tail.rs
//
// Live tail: polls the log API over a sliding window and streams entries that
// have not been shown yet.
//
// Architecture:
//   - `TailState` holds everything that changes between cycles (window,
//     last-seen id, retry budget, phase) and is threaded through each cycle,
//     so one cycle can be driven and inspected on its own.
//   - `Tailer` owns the collaborators: a `LogSource`, a `Clock`, the
//     `Renderer`, and the result / diagnostic writers.
//   - Single thread, no cancel flag: the loop ends on retry exhaustion or when
//     the process is killed.
//
// Per cycle:
//   1. Query `[from, to)` (one page; overflow is picked up by later cycles).
//      A window holding more than one page can push the last-seen id off the
//      page, and step 3 then shows that page again.
//   2. On failure, spend one retry. Budget empty -> Terminated. Otherwise show
//      nothing and fall through to the sleep without touching `from`.
//   3. On success, drop entries up to and including the last-seen id (the whole
//      batch when the id is absent), render the rest, remember the last one.
//   4. Sleep the poll interval.
//   5. `from = last_results_at - overlap`, `to = now`. The window keeps moving
//      with the wall clock even when nothing arrives.
//
// The server-side `startAt` cursor is not used here: it has been seen to skip
// and repeat entries, so every cycle overlaps the previous window and
// de-duplicates by id instead.

use crate::core::filter::entries_after;
use crate::core::format::Renderer;
use crate::core::model::QueryWindow;
use crate::core::source::LogSource;
use crate::util::constants::{
    DEFAULT_TAIL_OVERLAP_SECS, DEFAULT_TAIL_POLL_INTERVAL_SECS, DEFAULT_TAIL_RETRY_BUDGET,
};
use crate::util::error::OutputError;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::time::Duration;

// =============================================================================
// Clock
// =============================================================================

/// Wall-clock time and the one intentional suspension point of the loop.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// =============================================================================
// Settings and state
// =============================================================================

/// Tunables of the tail loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSettings {
    /// Sleep between polls.
    pub poll_interval: Duration,
    /// How far before the last shown entry the next window starts.
    pub overlap: chrono::Duration,
    /// Failed polls tolerated per session.
    pub retry_budget: u32,
}

impl TailSettings {
    pub fn new(poll_interval: Duration, overlap_secs: i64, retry_budget: u32) -> Self {
        Self {
            poll_interval,
            overlap: chrono::Duration::seconds(overlap_secs),
            retry_budget,
        }
    }
}

impl Default for TailSettings {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_TAIL_POLL_INTERVAL_SECS),
            DEFAULT_TAIL_OVERLAP_SECS,
            DEFAULT_TAIL_RETRY_BUDGET,
        )
    }
}

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPhase {
    /// Last query succeeded (or none has run yet).
    Polling,
    /// Last query failed; budget remains.
    Backoff,
    /// Budget exhausted. Final.
    Terminated,
}

/// Mutable loop state, owned by one tail session.
#[derive(Debug, Clone, PartialEq)]
pub struct TailState {
    /// Window for the next query.
    pub window: QueryWindow,
    /// Id of the last entry shown.
    pub last_seen_id: Option<String>,
    /// Timestamp of the last entry shown; the start of the lookback until
    /// something is shown.
    pub last_results_at: DateTime<Utc>,
    pub retries_left: u32,
    pub phase: TailPhase,
    pub cycles: u64,
    pub displayed: u64,
    pub failures: u32,
}

impl TailState {
    pub fn new(window: QueryWindow, retry_budget: u32) -> Self {
        Self {
            last_results_at: window.from,
            window,
            last_seen_id: None,
            retries_left: retry_budget,
            phase: TailPhase::Polling,
            cycles: 0,
            displayed: 0,
            failures: 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == TailPhase::Terminated
    }

    /// Move the window for the next cycle.
    pub fn advance(&mut self, now: DateTime<Utc>, overlap: chrono::Duration) {
        self.window = QueryWindow::new(self.last_results_at - overlap, now);
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// This many new entries were rendered.
    Displayed(usize),
    /// The query succeeded but returned nothing unseen.
    NothingNew,
    /// The query failed; `retries_left` attempts remain.
    Failed { retries_left: u32 },
    /// The query failed and the budget is spent.
    Exhausted,
}

/// Totals reported when the loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSummary {
    pub cycles: u64,
    pub displayed: u64,
    pub failures: u32,
}

// =============================================================================
// Tailer
// =============================================================================

/// Drives the tail loop.
///
/// `out` receives rendered entries; `diag` receives the `ERROR` /
/// `retries left` lines shown to the user on failed polls.
pub struct Tailer<S, C, W, D> {
    source: S,
    clock: C,
    renderer: Renderer,
    out: W,
    diag: D,
    query: String,
    settings: TailSettings,
}

impl<S, C, W, D> Tailer<S, C, W, D>
where
    S: LogSource,
    C: Clock,
    W: Write,
    D: Write,
{
    pub fn new(
        source: S,
        clock: C,
        renderer: Renderer,
        out: W,
        diag: D,
        query: impl Into<String>,
        settings: TailSettings,
    ) -> Self {
        Self {
            source,
            clock,
            renderer,
            out,
            diag,
            query: query.into(),
            settings,
        }
    }

    /// Initial state: look back `lookback_minutes` from now.
    pub fn initial_state(&self, lookback_minutes: i64) -> TailState {
        TailState::new(
            QueryWindow::lookback(self.clock.now(), lookback_minutes),
            self.settings.retry_budget,
        )
    }

    /// Run one query-and-display step (steps 1-3). Does not sleep or move
    /// the window.
    pub fn poll_once(&mut self, state: &mut TailState) -> Result<CycleOutcome, OutputError> {
        state.cycles += 1;
        tracing::debug!(
            cycle = state.cycles,
            from = %state.window.from,
            to = %state.window.to,
            last_seen = state.last_seen_id.as_deref().unwrap_or(""),
            "Tail: querying window"
        );

        let response = match self.source.search(&self.query, &state.window, None) {
            Ok(response) => response,
            Err(e) => {
                state.failures += 1;
                state.retries_left = state.retries_left.saturating_sub(1);
                writeln!(self.diag, "ERROR {e}")?;
                tracing::warn!(
                    error = %e,
                    retries_left = state.retries_left,
                    "Tail: query failed"
                );

                if state.retries_left == 0 {
                    state.phase = TailPhase::Terminated;
                    return Ok(CycleOutcome::Exhausted);
                }

                writeln!(self.diag, "retries left {}", state.retries_left)?;
                state.phase = TailPhase::Backoff;
                return Ok(CycleOutcome::Failed {
                    retries_left: state.retries_left,
                });
            }
        };

        state.phase = TailPhase::Polling;

        let fresh = entries_after(&response.logs, state.last_seen_id.as_deref());
        let Some(last) = fresh.last() else {
            tracing::debug!(returned = response.logs.len(), "Tail: nothing new");
            return Ok(CycleOutcome::NothingNew);
        };

        self.renderer.write_entries(fresh, &mut self.out)?;
        state.last_seen_id = Some(last.id.clone());
        state.last_results_at = last.timestamp();
        state.displayed += fresh.len() as u64;

        tracing::debug!(
            returned = response.logs.len(),
            shown = fresh.len(),
            last_seen = %last.id,
            "Tail: new entries"
        );
        Ok(CycleOutcome::Displayed(fresh.len()))
    }

    /// Run cycles until the retry budget is spent.
    ///
    /// Under normal operation this never returns. A write failure on `out` or
    /// `diag` ends the loop with that error.
    pub fn run(mut self, mut state: TailState) -> Result<TailSummary, OutputError> {
        tracing::info!(
            query = %self.query,
            from = %state.window.from,
            poll_secs = self.settings.poll_interval.as_secs(),
            overlap_secs = self.settings.overlap.num_seconds(),
            retry_budget = self.settings.retry_budget,
            "Tail started"
        );

        loop {
            self.poll_once(&mut state)?;
            if state.is_terminated() {
                break;
            }
            self.clock.sleep(self.settings.poll_interval);
            state.advance(self.clock.now(), self.settings.overlap);
        }

        let summary = TailSummary {
            cycles: state.cycles,
            displayed: state.displayed,
            failures: state.failures,
        };
        tracing::info!(
            cycles = summary.cycles,
            displayed = summary.displayed,
            failures = summary.failures,
            "Tail terminated"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::RenderOptions;
    use crate::core::model::{LogEntry, QueryResponse};
    use crate::util::error::ApiError;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    struct ScriptedSource {
        replies: RefCell<VecDeque<Result<QueryResponse, ApiError>>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<QueryResponse, ApiError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
            }
        }
    }

    impl LogSource for ScriptedSource {
        fn search(
            &self,
            _query: &str,
            _window: &QueryWindow,
            _continuation: Option<&str>,
        ) -> Result<QueryResponse, ApiError> {
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(status_error()))
        }
    }

    struct ManualClock {
        now: Cell<DateTime<Utc>>,
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            let step = chrono::Duration::from_std(duration).unwrap();
            self.now.set(self.now.get() + step);
        }
    }

    fn status_error() -> ApiError {
        ApiError::HttpStatus {
            status: 503,
            body: String::new(),
        }
    }

    fn batch(entries: &[(&str, i64)]) -> Result<QueryResponse, ApiError> {
        Ok(QueryResponse::single_page(
            entries
                .iter()
                .map(|(id, secs)| LogEntry::new(*id, t0() + chrono::Duration::seconds(*secs), *id))
                .collect(),
        ))
    }

    fn state() -> TailState {
        TailState::new(QueryWindow::new(t0(), t0() + chrono::Duration::minutes(15)), 5)
    }

    #[test]
    fn test_poll_once_displays_and_records_last_seen() {
        let source = ScriptedSource::new(vec![batch(&[("a", 1), ("b", 2)])]);
        let clock = ManualClock { now: Cell::new(t0()) };
        let (mut out, mut diag) = (Vec::new(), Vec::new());
        let mut tailer = Tailer::new(
            source,
            clock,
            Renderer::new(RenderOptions::default()),
            &mut out,
            &mut diag,
            "q",
            TailSettings::default(),
        );
        let mut st = state();

        assert_eq!(tailer.poll_once(&mut st).unwrap(), CycleOutcome::Displayed(2));
        assert_eq!(st.last_seen_id.as_deref(), Some("b"));
        assert_eq!(st.last_results_at, t0() + chrono::Duration::seconds(2));
        assert_eq!(st.phase, TailPhase::Polling);
        drop(tailer);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_poll_once_skips_already_seen() {
        let source = ScriptedSource::new(vec![batch(&[("a", 1), ("b", 2)])]);
        let clock = ManualClock { now: Cell::new(t0()) };
        let mut out = Vec::new();
        let mut tailer = Tailer::new(
            source,
            clock,
            Renderer::new(RenderOptions::default()),
            &mut out,
            std::io::sink(),
            "q",
            TailSettings::default(),
        );
        let mut st = state();
        st.last_seen_id = Some("b".to_string());

        assert_eq!(tailer.poll_once(&mut st).unwrap(), CycleOutcome::NothingNew);
        assert_eq!(st.last_seen_id.as_deref(), Some("b"));
        drop(tailer);
        assert!(out.is_empty());
    }

    #[test]
    fn test_failure_spends_budget_and_backs_off() {
        let source = ScriptedSource::new(vec![Err(status_error())]);
        let clock = ManualClock { now: Cell::new(t0()) };
        let mut diag = Vec::new();
        let mut tailer = Tailer::new(
            source,
            clock,
            Renderer::new(RenderOptions::default()),
            std::io::sink(),
            &mut diag,
            "q",
            TailSettings::default(),
        );
        let mut st = state();
        let before = st.window;

        assert_eq!(
            tailer.poll_once(&mut st).unwrap(),
            CycleOutcome::Failed { retries_left: 4 }
        );
        assert_eq!(st.phase, TailPhase::Backoff);
        assert_eq!(st.window, before);
        drop(tailer);
        let diag = String::from_utf8(diag).unwrap();
        assert!(diag.starts_with("ERROR Transport error: HTTP 503"), "{diag}");
        assert!(diag.contains("retries left 4"));
    }

    #[test]
    fn test_advance_uses_overlap_and_wall_clock() {
        let mut st = state();
        st.last_results_at = t0() + chrono::Duration::minutes(3);
        let now = t0() + chrono::Duration::minutes(20);
        st.advance(now, chrono::Duration::seconds(5));
        assert_eq!(
            st.window.from,
            t0() + chrono::Duration::minutes(3) - chrono::Duration::seconds(5)
        );
        assert_eq!(st.window.to, now);
    }

    #[test]
    fn test_run_terminates_after_budget() {
        let source = ScriptedSource::new(vec![
            batch(&[("a", 1)]),
            Err(status_error()),
            batch(&[("a", 1), ("b", 2)]),
        ]);
        let clock = ManualClock { now: Cell::new(t0()) };
        let mut out = Vec::new();
        let tailer = Tailer::new(
            source,
            clock,
            Renderer::new(RenderOptions::default()),
            &mut out,
            std::io::sink(),
            "q",
            TailSettings::new(Duration::from_secs(30), 5, 3),
        );
        let start = tailer.initial_state(15);
        let summary = tailer.run(start).unwrap();

        // a; fail (2 left); b; fail; fail -> exhausted
        assert_eq!(
            summary,
            TailSummary {
                cycles: 5,
                displayed: 2,
                failures: 3
            }
        );
        let text = String::from_utf8(out).unwrap();
        let messages: Vec<&str> = text.lines().map(|l| l.rsplit(" : ").next().unwrap()).collect();
        assert_eq!(messages, vec!["a", "b"]);
    }
}
