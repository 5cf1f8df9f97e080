use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AdapterError;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP bridge for the freelance CLI tools")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Kill wrapped tool invocations after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Application settings (from config file, env vars, and CLI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Installation directory of the time-tracking CLI
    #[serde(default = "default_time_tracker_path")]
    pub time_tracker_path: PathBuf,

    /// Installation directory of the invoice generator CLI
    #[serde(default = "default_invoice_gen_path")]
    pub invoice_gen_path: PathBuf,

    /// Database file used by the time tracker. Never touched directly;
    /// recorded here so the wrapped tool can be pointed at it.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Python interpreter used to run both tools
    #[serde(default = "default_python_path")]
    pub python_path: PathBuf,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional timeout for wrapped tool invocations, in seconds.
    /// Unset means wait indefinitely.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,

    /// Entry count returned by /api/time/entries when no limit is given
    #[serde(default = "default_entry_limit")]
    pub default_entry_limit: usize,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn tools_root() -> PathBuf {
    // The bridge conventionally lives next to the two tool checkouts.
    std::env::current_dir()
        .ok()
        .and_then(|d| d.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_time_tracker_path() -> PathBuf {
    tools_root().join("kb-tt-cli")
}

fn default_invoice_gen_path() -> PathBuf {
    tools_root().join("kb-invoice-gen-cli")
}

fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kb-tt-cli/time_tracker.db")
}

fn default_python_path() -> PathBuf {
    PathBuf::from("python3")
}

fn default_port() -> u16 {
    8080
}

fn default_entry_limit() -> usize {
    10
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .map(str::to_string)
    .to_vec()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_tracker_path: default_time_tracker_path(),
            invoice_gen_path: default_invoice_gen_path(),
            database_path: default_database_path(),
            python_path: default_python_path(),
            port: default_port(),
            command_timeout_secs: None,
            default_entry_limit: default_entry_limit(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {p:?}"))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {p:?}"));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("freelance-bridge/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/freelance-bridge/config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {path:?}"))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {path:?}"));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Apply environment variable overrides (env takes precedence over file)
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("TIME_TRACKER_PATH") {
            if !v.is_empty() {
                self.time_tracker_path = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("INVOICE_GEN_PATH") {
            if !v.is_empty() {
                self.invoice_gen_path = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("DATABASE_PATH") {
            if !v.is_empty() {
                self.database_path = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("PYTHON_EXEC_PATH") {
            if !v.is_empty() {
                self.python_path = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
    }

    /// Merge CLI arguments into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(timeout) = cli.timeout {
            self.command_timeout_secs = Some(timeout);
        }
    }

    /// Fail fast before any subprocess is spawned if a configured tool
    /// location does not exist.
    ///
    /// The interpreter is only checked when given as a concrete path; a bare
    /// program name is resolved through PATH by the OS at spawn time.
    pub fn ensure_paths(&self) -> crate::error::Result<()> {
        if !self.time_tracker_path.is_dir() {
            return Err(AdapterError::PathNotFound(self.time_tracker_path.clone()));
        }
        if !self.invoice_gen_path.is_dir() {
            return Err(AdapterError::PathNotFound(self.invoice_gen_path.clone()));
        }
        if self.python_path.components().count() > 1 && !self.python_path.is_file() {
            return Err(AdapterError::PathNotFound(self.python_path.clone()));
        }
        Ok(())
    }

    /// Directory where the invoice generator writes its PDFs
    pub fn invoice_output_dir(&self) -> PathBuf {
        self.invoice_gen_path.join("output")
    }

    /// Configured invocation timeout, if any
    pub fn command_timeout(&self) -> Option<std::time::Duration> {
        self.command_timeout_secs
            .map(std::time::Duration::from_secs)
    }
}
