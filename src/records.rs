//! Typed value records returned by the adapter facades.
//!
//! All records are created fresh per adapter call; the adapter holds no
//! state between calls. The wrapped tool remains the system of record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};

/// Live state of at most one running timer.
///
/// Absence of a running timer is a valid state (`is_running == false` with
/// the other fields unset), never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

/// One tracked interval. `end_time` is unset while the entry is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub client: String,
    pub project: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    pub is_running: bool,
}

/// Aggregate of today's tracked time.
///
/// `raw_output` keeps the tool's verbatim output for diagnosability since
/// parsing is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodaySummary {
    pub total_hours: f64,
    pub total_minutes: i64,
    pub entry_count: usize,
    pub breakdown: Vec<Breakdown>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_output: String,
}

/// One aggregate row per distinct client/project pair seen today.
///
/// `minutes` and `hours` may disagree by rounding when the source tool
/// reports them independently; callers must tolerate that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub client_project: String,
    pub hours: f64,
    pub minutes: i64,
}

/// One invoice line item as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub hours: f64,
    pub rate: f64,
}

impl InvoiceLineItem {
    /// Reject invalid items before any subprocess is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(AdapterError::Validation(
                "line item description must not be empty".to_string(),
            ));
        }
        if self.hours <= 0.0 {
            return Err(AdapterError::Validation(format!(
                "line item hours must be positive, got {}",
                self.hours
            )));
        }
        if self.rate <= 0.0 {
            return Err(AdapterError::Validation(format!(
                "line item rate must be positive, got {}",
                self.rate
            )));
        }
        Ok(())
    }
}

/// Outcome of a successful invoice generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResult {
    pub status: InvoiceStatus,
    pub message: String,
    pub pdf_path: PathBuf,
    pub filename: String,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_output: String,
}

/// Invoice generation status. Failures are reported as errors, so the only
/// inhabited variant is `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Success,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_timer_status_serializes_without_unset_fields() {
        let status = TimerStatus {
            is_running: false,
            client: None,
            project: None,
            description: None,
            start_time: None,
            duration_minutes: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({ "is_running": false }));
    }

    #[test]
    fn test_line_item_validation() {
        let valid = InvoiceLineItem {
            description: "Consulting".to_string(),
            hours: 2.5,
            rate: 75.0,
        };
        assert!(valid.validate().is_ok());

        let cases = [
            InvoiceLineItem {
                description: String::new(),
                ..valid.clone()
            },
            InvoiceLineItem {
                hours: 0.0,
                ..valid.clone()
            },
            InvoiceLineItem {
                hours: -1.0,
                ..valid.clone()
            },
            InvoiceLineItem {
                rate: 0.0,
                ..valid.clone()
            },
            InvoiceLineItem {
                rate: -50.0,
                ..valid.clone()
            },
        ];
        for item in cases {
            assert!(
                matches!(item.validate(), Err(AdapterError::Validation(_))),
                "expected rejection for {item:?}"
            );
        }
    }

    #[test]
    fn test_invoice_status_wire_format() {
        let json = serde_json::to_string(&InvoiceStatus::Success).unwrap();
        assert_eq!(json, r#""success""#);
    }
}
