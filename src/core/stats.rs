// ddlog - core/stats.rs
//
// Per-minute entry counts for the statistics view.
// Core layer: pure logic, no I/O.

use crate::core::model::{LogEntry, QueryWindow};
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of entries that fall in one whole minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteCount {
    pub minute: DateTime<Utc>,
    pub count: usize,
}

/// Statistics for one query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowStats {
    /// Minutes with at least one entry, in chronological order.
    pub minutes: Vec<MinuteCount>,
    /// Size of the whole batch.
    pub total: usize,
}

/// Round a timestamp down to the start of its minute.
pub fn floor_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::minutes(1)).unwrap_or(ts)
}

/// Count entries per minute, keyed by the minute they round down to.
pub fn group_by_minute(entries: &[LogEntry]) -> BTreeMap<DateTime<Utc>, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        *counts.entry(floor_minute(entry.timestamp())).or_insert(0) += 1;
    }
    counts
}

/// Walk every whole minute from `floor(window.from)` while before `window.to`
/// and report the minutes that have entries.
///
/// `total` is always the batch size, even if some entries fall outside the
/// walked minutes.
pub fn minute_counts(entries: &[LogEntry], window: &QueryWindow) -> WindowStats {
    let grouped = group_by_minute(entries);
    let mut minutes = Vec::new();

    let mut minute = floor_minute(window.from);
    while minute < window.to {
        if let Some(&count) = grouped.get(&minute) {
            minutes.push(MinuteCount { minute, count });
        }
        minute += Duration::minutes(1);
    }

    WindowStats {
        minutes,
        total: entries.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn entry_at(id: &str, ts: DateTime<Utc>) -> LogEntry {
        LogEntry::new(id, ts, "m")
    }

    #[test]
    fn test_floor_minute() {
        let ts = t0() + Duration::seconds(59) + Duration::milliseconds(999);
        assert_eq!(floor_minute(ts), t0());
    }

    #[test]
    fn test_three_entries_two_minutes() {
        let window = QueryWindow::new(t0(), t0() + Duration::minutes(15));
        let entries = vec![
            entry_at("a", t0() + Duration::minutes(1)),
            entry_at("b", t0() + Duration::minutes(1) + Duration::seconds(30)),
            entry_at("c", t0() + Duration::minutes(10)),
        ];
        let stats = minute_counts(&entries, &window);
        assert_eq!(
            stats.minutes,
            vec![
                MinuteCount {
                    minute: t0() + Duration::minutes(1),
                    count: 2
                },
                MinuteCount {
                    minute: t0() + Duration::minutes(10),
                    count: 1
                },
            ]
        );
        assert_eq!(stats.total, 3);
    }

    #[test]
    fn test_unaligned_window_start_includes_first_minute() {
        let window = QueryWindow::new(t0() + Duration::seconds(40), t0() + Duration::minutes(2));
        let entries = vec![entry_at("a", t0() + Duration::seconds(50))];
        let stats = minute_counts(&entries, &window);
        assert_eq!(stats.minutes.len(), 1);
        assert_eq!(stats.minutes[0].minute, t0());
    }

    #[test]
    fn test_entries_outside_window_count_toward_total_only() {
        let window = QueryWindow::new(t0(), t0() + Duration::minutes(5));
        let entries = vec![
            entry_at("a", t0() + Duration::minutes(2)),
            entry_at("b", t0() + Duration::minutes(7)),
        ];
        let stats = minute_counts(&entries, &window);
        assert_eq!(stats.minutes.len(), 1);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_sum_of_minutes_equals_total_inside_window() {
        let window = QueryWindow::new(t0(), t0() + Duration::minutes(60));
        let entries: Vec<LogEntry> = (0..50)
            .map(|i| entry_at(&i.to_string(), t0() + Duration::seconds(i * 37)))
            .collect();
        let stats = minute_counts(&entries, &window);
        let sum: usize = stats.minutes.iter().map(|m| m.count).sum();
        assert_eq!(sum, stats.total);
        assert!(stats.minutes.iter().all(|m| m.count > 0));
    }
}
