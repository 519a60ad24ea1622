// ddlog - core/filter.rs
//
// De-duplication of overlapping tail windows.
// Each tail cycle re-queries a window that overlaps the previous one, so the
// returned batch usually starts with entries already shown. They are pruned
// here by identifier rather than by trusting the server's `startAt` cursor.
// Core layer: pure logic, no I/O.

use crate::core::model::LogEntry;

/// Return the entries that come after `last_seen` in `entries`.
///
/// - `last_seen == None`: the whole batch is new.
/// - `last_seen` found at position k: entries `k+1..` in received order.
/// - `last_seen` not found: the whole batch, unchanged. Showing an entry twice
///   is preferred over silently dropping a batch.
///
/// Matching is on identifier only.
pub fn entries_after<'a>(entries: &'a [LogEntry], last_seen: Option<&str>) -> &'a [LogEntry] {
    let Some(last_seen) = last_seen else {
        return entries;
    };

    match entries.iter().position(|e| e.id == last_seen) {
        Some(idx) => &entries[idx + 1..],
        None => {
            tracing::debug!(
                last_seen,
                batch = entries.len(),
                "Last seen id not in batch; treating whole batch as new"
            );
            entries
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_entry(id: &str, second: u32) -> LogEntry {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, second).unwrap();
        LogEntry::new(id, ts, format!("message {id}"))
    }

    fn ids(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_no_last_seen_returns_all() {
        let batch = vec![make_entry("a", 1), make_entry("b", 2)];
        assert_eq!(ids(entries_after(&batch, None)), vec!["a", "b"]);
    }

    #[test]
    fn test_returns_entries_after_match() {
        let batch = vec![
            make_entry("a", 1),
            make_entry("b", 2),
            make_entry("c", 3),
            make_entry("d", 4),
        ];
        assert_eq!(ids(entries_after(&batch, Some("b"))), vec!["c", "d"]);
    }

    #[test]
    fn test_every_position() {
        let batch: Vec<LogEntry> = (0..6).map(|i| make_entry(&format!("e{i}"), i)).collect();
        for k in 0..batch.len() {
            let out = entries_after(&batch, Some(&batch[k].id));
            assert_eq!(out, &batch[k + 1..]);
        }
    }

    #[test]
    fn test_match_on_last_entry_returns_empty() {
        let batch = vec![make_entry("a", 1), make_entry("b", 2)];
        assert!(entries_after(&batch, Some("b")).is_empty());
    }

    #[test]
    fn test_unknown_last_seen_fails_open() {
        let batch = vec![make_entry("a", 1), make_entry("b", 2)];
        assert_eq!(ids(entries_after(&batch, Some("zzz"))), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(entries_after(&[], Some("a")).is_empty());
    }
}
