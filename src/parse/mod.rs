//! Dual-mode parsing of tool output into typed records.
//!
//! The wrapped tools are not a stable API: newer subcommands emit JSON,
//! older ones emit decorated terminal text (box-drawing characters, bullet
//! lists). Every parser here probes for JSON first and falls back to
//! anchored pattern matching, so both formats land in the same records.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{AdapterError, Result};
use crate::records::{Breakdown, TimeEntry, TimerStatus, TodaySummary};

/// `Total Time: 2.5 hours` inside the summary box
static TOTAL_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Total Time:\s*([0-9.]+)\s*hours").expect("invalid TOTAL_TIME_RE"));

/// Per-entry breakdown rows of the shape `• Client/Project: 1.5h`
static BREAKDOWN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"•\s*([^:]+):\s*([0-9.]+)h").expect("invalid BREAKDOWN_RE"));

fn probe_json(raw: &str) -> Option<Value> {
    serde_json::from_str(raw.trim()).ok()
}

/// Parse a timestamp in any of the formats the tools have been seen to emit.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Naive local timestamps like 2024-03-14T09:30:00.123456
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Parse `status --json` output.
///
/// A literal `null` (or empty output) means no timer is running and maps to
/// `None`, never to an error.
pub fn parse_status(raw: &str) -> Result<Option<TimerStatus>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let value = probe_json(raw)
        .ok_or_else(|| AdapterError::malformed("status output is not JSON", raw))?;

    let obj = match value {
        Value::Null => return Ok(None),
        Value::Object(_) => value,
        other => {
            return Err(AdapterError::malformed(
                format!("expected a status object, got {other}"),
                raw,
            ))
        }
    };

    let is_running = obj
        .get("is_running")
        .and_then(Value::as_bool)
        .ok_or_else(|| AdapterError::malformed("status is missing is_running", raw))?;

    Ok(Some(TimerStatus {
        is_running,
        client: str_field(&obj, "client"),
        project: str_field(&obj, "project"),
        description: str_field(&obj, "description"),
        start_time: str_field(&obj, "start_time").and_then(|s| parse_timestamp(&s)),
        duration_minutes: obj.get("duration_minutes").and_then(Value::as_i64),
    }))
}

/// Parse `list --json` output into an ordered entry list.
///
/// Ordering is whatever the tool emits (most-recent-first, unverified).
pub fn parse_entries(raw: &str) -> Result<Vec<TimeEntry>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value = probe_json(raw)
        .ok_or_else(|| AdapterError::malformed("entry list output is not JSON", raw))?;

    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(AdapterError::malformed(
                format!("expected an entry array, got {other}"),
                raw,
            ))
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        entries.push(parse_entry(&item, raw)?);
    }
    Ok(entries)
}

fn parse_entry(item: &Value, raw: &str) -> Result<TimeEntry> {
    let id = item
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AdapterError::malformed("entry is missing id", raw))?;
    let client = str_field(item, "client")
        .ok_or_else(|| AdapterError::malformed("entry is missing client", raw))?;
    let project = str_field(item, "project")
        .ok_or_else(|| AdapterError::malformed("entry is missing project", raw))?;
    let is_running = item
        .get("is_running")
        .and_then(Value::as_bool)
        .ok_or_else(|| AdapterError::malformed("entry is missing is_running", raw))?;
    let start_time = str_field(item, "start_time")
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or_else(|| AdapterError::malformed("entry has no parseable start_time", raw))?;

    // end_time stays unset while running; an unknown format is tolerated
    // rather than failing the whole list
    let end_time = str_field(item, "end_time")
        .filter(|s| !s.is_empty())
        .as_deref()
        .and_then(parse_timestamp);

    Ok(TimeEntry {
        id,
        client,
        project,
        description: str_field(item, "description").unwrap_or_default(),
        start_time,
        end_time,
        duration_minutes: item
            .get("duration_minutes")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        is_running,
    })
}

/// Parse `today` output in either format.
///
/// JSON mode reads the structured summary object; text mode anchors on the
/// `Total Time:` line and the bullet breakdown rows. Zero breakdown rows
/// with a matched total is a valid summary, not an error.
pub fn parse_summary(raw: &str) -> Result<TodaySummary> {
    match probe_json(raw) {
        Some(Value::Null) => Ok(TodaySummary {
            raw_output: raw.to_string(),
            ..TodaySummary::default()
        }),
        Some(Value::Object(obj)) => parse_summary_json(&obj, raw),
        Some(other) => Err(AdapterError::malformed(
            format!("expected a summary object, got {other}"),
            raw,
        )),
        None => parse_summary_text(raw),
    }
}

fn parse_summary_json(obj: &serde_json::Map<String, Value>, raw: &str) -> Result<TodaySummary> {
    let total_hours = obj
        .get("total_hours")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let total_minutes = obj
        .get("total_minutes")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| (total_hours * 60.0).round() as i64);

    let breakdown: Vec<Breakdown> = obj
        .get("breakdown")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let client = item.get("client").and_then(Value::as_str)?;
                    let project = item.get("project").and_then(Value::as_str)?;
                    let minutes = item.get("duration_minutes").and_then(Value::as_f64)?;
                    Some(Breakdown {
                        client_project: format!("{client} - {project}"),
                        hours: minutes / 60.0,
                        minutes: minutes.round() as i64,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let entry_count = obj
        .get("entry_count")
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;

    Ok(TodaySummary {
        total_hours,
        total_minutes,
        entry_count,
        breakdown,
        raw_output: raw.to_string(),
    })
}

fn parse_summary_text(raw: &str) -> Result<TodaySummary> {
    let total = TOTAL_TIME_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<f64>().ok());

    let breakdown: Vec<Breakdown> = BREAKDOWN_RE
        .captures_iter(raw)
        .filter_map(|c| {
            let hours: f64 = c[2].parse().ok()?;
            Some(Breakdown {
                client_project: c[1].trim().to_string(),
                hours,
                minutes: (hours * 60.0).round() as i64,
            })
        })
        .collect();

    if total.is_none() && breakdown.is_empty() {
        return Err(AdapterError::malformed(
            "summary output is neither JSON nor a recognized text summary",
            raw,
        ));
    }

    // The text format does not report a total when only rows matched
    let total_hours = total.unwrap_or_else(|| breakdown.iter().map(|b| b.hours).sum());

    Ok(TodaySummary {
        total_hours,
        total_minutes: (total_hours * 60.0).round() as i64,
        entry_count: breakdown.len(),
        breakdown,
        raw_output: raw.to_string(),
    })
}
