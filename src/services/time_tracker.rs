use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::invoker::{classify, Outcome, ToolOutput, ToolRunner};
use crate::parse;
use crate::records::{TimeEntry, TimerStatus, TodaySummary};

/// Facade over the time-tracking CLI (`python -m tt.cli …`).
pub struct TimeTrackerAdapter {
    python: PathBuf,
    tool_dir: PathBuf,
    timeout: Option<Duration>,
    runner: Arc<dyn ToolRunner>,
}

impl TimeTrackerAdapter {
    pub fn new(settings: &Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            python: settings.python_path.clone(),
            tool_dir: settings.time_tracker_path.clone(),
            timeout: settings.command_timeout(),
            runner,
        }
    }

    async fn invoke(&self, args: &[&str]) -> Result<ToolOutput> {
        let full: Vec<String> = ["-m", "tt.cli"]
            .iter()
            .chain(args)
            .map(|s| s.to_string())
            .collect();
        self.runner
            .run(&self.python, &full, &self.tool_dir, self.timeout)
            .await
    }

    /// Start a timer for `client`/`project`.
    ///
    /// After the mutation the live status is re-queried so the returned
    /// entry reflects what the tool actually recorded, not what was
    /// submitted. The tool does not report the row id, so `id` is 0.
    pub async fn start_timer(
        &self,
        client: &str,
        project: &str,
        description: &str,
    ) -> Result<TimeEntry> {
        if client.trim().is_empty() {
            return Err(AdapterError::Validation("client must not be empty".into()));
        }
        if project.trim().is_empty() {
            return Err(AdapterError::Validation("project must not be empty".into()));
        }

        tracing::info!(client, project, "starting timer");
        let mut args = vec!["start", client, project];
        if !description.is_empty() {
            args.push("--desc");
            args.push(description);
        }
        let output = self.invoke(&args).await?;
        if classify(&output) == Outcome::Failure {
            return Err(AdapterError::invocation(
                format!("start exited with code {}", output.exit_code),
                output.combined,
            ));
        }

        match self.status().await? {
            Some(status) if status.is_running => Ok(TimeEntry {
                id: 0,
                client: status.client.unwrap_or_else(|| client.to_string()),
                project: status.project.unwrap_or_else(|| project.to_string()),
                description: status.description.unwrap_or_else(|| description.to_string()),
                start_time: status.start_time.unwrap_or_else(Utc::now),
                end_time: None,
                duration_minutes: status.duration_minutes.unwrap_or(0),
                is_running: true,
            }),
            _ => {
                tracing::warn!("start acknowledged but status re-query shows nothing running");
                Ok(TimeEntry {
                    id: 0,
                    client: client.to_string(),
                    project: project.to_string(),
                    description: description.to_string(),
                    start_time: Utc::now(),
                    end_time: None,
                    duration_minutes: 0,
                    is_running: true,
                })
            }
        }
    }

    /// Stop the running timer.
    ///
    /// Returns the just-closed entry, re-queried from the tool's entry list.
    /// `None` means no timer was running, which is not an error.
    pub async fn stop_timer(&self) -> Result<Option<TimeEntry>> {
        tracing::info!("stopping timer");
        let output = self.invoke(&["stop"]).await?;
        match classify(&output) {
            Outcome::EmptyState => return Ok(None),
            Outcome::Failure => {
                return Err(AdapterError::invocation(
                    format!("stop exited with code {}", output.exit_code),
                    output.combined,
                ))
            }
            Outcome::Success => {}
        }

        let recent = self.recent_entries(NonZeroUsize::new(1)).await?;
        let stopped = recent.into_iter().next();
        if stopped.is_none() {
            tracing::warn!("stop succeeded but the entry list is empty");
        }
        Ok(stopped)
    }

    /// Current timer state. `None` means no timer is running.
    pub async fn status(&self) -> Result<Option<TimerStatus>> {
        let output = self.invoke(&["status", "--json"]).await?;
        match classify(&output) {
            Outcome::EmptyState => Ok(None),
            Outcome::Failure => Err(AdapterError::invocation(
                format!("status exited with code {}", output.exit_code),
                output.combined,
            )),
            Outcome::Success => parse::parse_status(&output.combined),
        }
    }

    /// Recent entries in the order the tool emits them (most-recent-first,
    /// unverified). `limit` of `None` applies no truncation.
    pub async fn recent_entries(&self, limit: Option<NonZeroUsize>) -> Result<Vec<TimeEntry>> {
        let output = self.invoke(&["list", "--json"]).await?;
        match classify(&output) {
            Outcome::EmptyState => Ok(Vec::new()),
            Outcome::Failure => Err(AdapterError::invocation(
                format!("list exited with code {}", output.exit_code),
                output.combined,
            )),
            Outcome::Success => {
                let mut entries = parse::parse_entries(&output.combined)?;
                if let Some(limit) = limit {
                    entries.truncate(limit.get());
                }
                Ok(entries)
            }
        }
    }

    /// Today's aggregate, in whichever format the tool emits. The raw
    /// output always rides along for diagnosability.
    pub async fn today_summary(&self) -> Result<TodaySummary> {
        let output = self.invoke(&["today", "--json"]).await?;
        match classify(&output) {
            Outcome::EmptyState => Ok(TodaySummary {
                raw_output: output.combined,
                ..TodaySummary::default()
            }),
            Outcome::Failure => Err(AdapterError::invocation(
                format!("today exited with code {}", output.exit_code),
                output.combined,
            )),
            Outcome::Success => parse::parse_summary(&output.combined),
        }
    }
}
