// ddlog - core/format.rs
//
// Rendering of log entries and statistics to any `Write` sink.
//
// Text lines look like
//   2024-03-01 10:00:01.25 UTC : connection reset
//   2024-03-01 10:00:01.25 UTC : 2024-03-01 21:00:01.25 +11:00 : connection reset
// the second form when local time is enabled. JSON output is one object per
// line; CSV output writes its header once per renderer.

use crate::core::model::LogEntry;
use crate::core::pattern::PatternSummary;
use crate::core::stats::WindowStats;
use crate::util::constants;
use crate::util::error::OutputError;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

// =============================================================================
// Options
// =============================================================================

/// Output encoding selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown output format '{other}' (expected text, json or csv)"
            )),
        }
    }
}

/// Rendering options. `delimiter` and `local_time` only affect text output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub delimiter: bool,
    pub local_time: bool,
}

// =============================================================================
// Time strings
// =============================================================================

/// `YYYY-MM-DD HH:MM:SS[.ffffff]` with trailing fractional zeros trimmed.
pub fn precise_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let base = ts.format(constants::DISPLAY_TIME_FORMAT).to_string();
    let micros = ts.timestamp_subsec_micros() % 1_000_000;
    if micros == 0 {
        return base;
    }
    let frac = format!("{micros:06}");
    format!("{base}.{}", frac.trim_end_matches('0'))
}

/// Timestamp with its zone, optionally followed by the same instant in the
/// machine's local zone.
///
/// chrono's `Local` carries no zone abbreviation, so the local clock is
/// labelled with its numeric UTC offset (`+11:00`) rather than a name.
pub fn display_time(ts: DateTime<Utc>, local_time: bool) -> String {
    let utc = format!("{} {}", precise_time(&ts), ts.format("%Z"));
    if !local_time {
        return utc;
    }
    let local = ts.with_timezone(&Local);
    format!("{utc} : {} {}", precise_time(&local), local.format("%Z"))
}

// =============================================================================
// Renderer
// =============================================================================

/// Writes entries and statistics in the configured format.
///
/// Holds the only piece of rendering state: whether the CSV header has been
/// emitted, so a tail session prints it once across many batches.
#[derive(Debug)]
pub struct Renderer {
    options: RenderOptions,
    csv_header_written: bool,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            csv_header_written: false,
        }
    }

    /// One text line for an entry, without the trailing newline.
    pub fn entry_line(&self, entry: &LogEntry) -> String {
        format!(
            "{} : {}",
            display_time(entry.timestamp(), self.options.local_time),
            entry.message()
        )
    }

    /// Write `entries` in order and flush. Returns the number written.
    pub fn write_entries<W: Write>(
        &mut self,
        entries: &[LogEntry],
        out: &mut W,
    ) -> Result<usize, OutputError> {
        match self.options.format {
            OutputFormat::Text => {
                for entry in entries {
                    writeln!(out, "{}", self.entry_line(entry))?;
                    if self.options.delimiter {
                        writeln!(out, "{}", constants::ENTRY_DELIMITER)?;
                    }
                }
            }
            OutputFormat::Json => {
                for entry in entries {
                    serde_json::to_writer(&mut *out, entry)
                        .map_err(|source| OutputError::Json { source })?;
                    writeln!(out)?;
                }
            }
            OutputFormat::Csv => self.write_csv_entries(entries, out)?,
        }
        out.flush()?;
        Ok(entries.len())
    }

    fn write_csv_entries<W: Write>(
        &mut self,
        entries: &[LogEntry],
        out: &mut W,
    ) -> Result<(), OutputError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut *out);

        if !self.csv_header_written {
            writer
                .write_record(["id", "timestamp", "host", "service", "message"])
                .map_err(|source| OutputError::Csv { source })?;
            self.csv_header_written = true;
        }

        for entry in entries {
            let ts = entry.timestamp().to_rfc3339();
            writer
                .write_record([
                    entry.id.as_str(),
                    ts.as_str(),
                    entry.content.host.as_str(),
                    entry.content.service.as_str(),
                    entry.message(),
                ])
                .map_err(|source| OutputError::Csv { source })?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the per-minute view followed by the total.
    pub fn write_stats<W: Write>(
        &mut self,
        stats: &WindowStats,
        out: &mut W,
    ) -> Result<(), OutputError> {
        match self.options.format {
            OutputFormat::Text => {
                for m in &stats.minutes {
                    writeln!(
                        out,
                        "{} : {}",
                        display_time(m.minute, self.options.local_time),
                        m.count
                    )?;
                }
                writeln!(out, "Result count {}", stats.total)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, stats)
                    .map_err(|source| OutputError::Json { source })?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(&mut *out);
                writer
                    .write_record(["minute", "count"])
                    .map_err(|source| OutputError::Csv { source })?;
                for m in &stats.minutes {
                    writer
                        .write_record([m.minute.to_rfc3339(), m.count.to_string()])
                        .map_err(|source| OutputError::Csv { source })?;
                }
                writer
                    .write_record(["total".to_string(), stats.total.to_string()])
                    .map_err(|source| OutputError::Csv { source })?;
                writer.flush()?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Write a clustering summary: `<count> <pattern>` lines in text mode.
    pub fn write_patterns<W: Write>(
        &mut self,
        summary: &PatternSummary,
        out: &mut W,
    ) -> Result<(), OutputError> {
        match self.options.format {
            OutputFormat::Text => write!(out, "{summary}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, summary)
                    .map_err(|source| OutputError::Json { source })?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(&mut *out);
                writer
                    .write_record(["count", "pattern"])
                    .map_err(|source| OutputError::Csv { source })?;
                for cluster in &summary.clusters {
                    writer
                        .write_record([cluster.count.to_string(), cluster.pattern_text()])
                        .map_err(|source| OutputError::Csv { source })?;
                }
                writer.flush()?;
            }
        }
        out.flush()?;
        Ok(())
    }
}
