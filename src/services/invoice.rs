use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::Settings;
use crate::error::{AdapterError, Result};
use crate::invoker::{classify, Outcome, ToolRunner};
use crate::records::{InvoiceLineItem, InvoiceResult, InvoiceStatus};

/// Facade over the invoice generator CLI (`python -m src.main …`).
pub struct InvoiceAdapter {
    python: PathBuf,
    tool_dir: PathBuf,
    output_dir: PathBuf,
    timeout: Option<Duration>,
    runner: Arc<dyn ToolRunner>,
}

impl InvoiceAdapter {
    /// The wrapped CLI accepts one line item per invocation. Extra items
    /// are not billed; the result message says so explicitly.
    pub const MAX_LINE_ITEMS: usize = 1;

    pub fn new(settings: &Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            python: settings.python_path.clone(),
            tool_dir: settings.invoice_gen_path.clone(),
            output_dir: settings.invoice_output_dir(),
            timeout: settings.command_timeout(),
            runner,
        }
    }

    /// Generate an invoice PDF.
    ///
    /// Validates all inputs before any subprocess is spawned, clears stale
    /// PDFs from the output directory, runs the tool, and independently
    /// verifies that an artifact was actually produced (a zero exit code
    /// alone is not proof).
    pub async fn generate_invoice(
        &self,
        client_name: &str,
        client_email: &str,
        line_items: &[InvoiceLineItem],
        notes: Option<&str>,
        date: Option<&str>,
    ) -> Result<InvoiceResult> {
        if client_name.trim().is_empty() {
            return Err(AdapterError::Validation(
                "client_name must not be empty".into(),
            ));
        }
        if client_email.trim().is_empty() {
            return Err(AdapterError::Validation(
                "client_email must not be empty".into(),
            ));
        }
        if line_items.is_empty() {
            return Err(AdapterError::Validation(
                "at least one line item is required".into(),
            ));
        }
        for item in line_items {
            item.validate()?;
        }

        let item = &line_items[0];
        let skipped = line_items.len() - Self::MAX_LINE_ITEMS;
        if skipped > 0 {
            tracing::warn!(
                submitted = line_items.len(),
                billed = Self::MAX_LINE_ITEMS,
                "invoice tool accepts a single line item, extra items not billed"
            );
        }

        // Stale artifacts must be gone before the run so the scan below
        // cannot adopt a PDF from an earlier invocation.
        self.remove_stale_pdfs();

        let mut args: Vec<String> = [
            "-m",
            "src.main",
            "-c",
            client_name,
            "-e",
            client_email,
            "-d",
            item.description.as_str(),
        ]
        .map(str::to_string)
        .to_vec();
        args.push("-h".into());
        args.push(format!("{:.2}", item.hours));
        args.push("-r".into());
        args.push(format!("{:.2}", item.rate));
        // Always pass notes so the CLI never falls into an interactive prompt
        args.push("--notes".into());
        args.push(notes.filter(|n| !n.is_empty()).unwrap_or("Generated via API").into());
        if let Some(date) = date.filter(|d| !d.is_empty()) {
            args.push("--date".into());
            args.push(date.into());
        }

        tracing::info!(client = client_name, "generating invoice");
        let output = self
            .runner
            .run(&self.python, &args, &self.tool_dir, self.timeout)
            .await?;

        if classify(&output) == Outcome::Failure {
            let message = if output.combined.contains("Aborted!") {
                "invoice tool aborted waiting for interactive input".to_string()
            } else {
                format!("invoice generation exited with code {}", output.exit_code)
            };
            return Err(AdapterError::invocation(message, output.combined));
        }

        let pdf_path = self.locate_artifact()?;
        let artifact_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "invoice.pdf".to_string());

        let message = if skipped > 0 {
            format!(
                "Invoice generated successfully ({} of {} line items billed; \
                 the invoice tool accepts a single item per invocation)",
                Self::MAX_LINE_ITEMS,
                line_items.len()
            )
        } else {
            "Invoice generated successfully".to_string()
        };

        Ok(InvoiceResult {
            status: InvoiceStatus::Success,
            message,
            download_url: format!("/files/{artifact_name}"),
            filename: display_filename(client_name),
            pdf_path,
            raw_output: output.combined,
        })
    }

    /// Delete leftover PDFs from earlier runs. A failed delete is logged
    /// and skipped; it must not abort the overall call.
    fn remove_stale_pdfs(&self) {
        let Ok(dir) = std::fs::read_dir(&self.output_dir) else {
            return;
        };
        for entry in dir.flatten() {
            let path = entry.path();
            if is_pdf(&path) {
                if let Err(err) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), %err, "failed to remove stale PDF");
                }
            }
        }
    }

    /// Find the produced PDF: the conventional `invoice.pdf` first, then
    /// any PDF in the output directory.
    fn locate_artifact(&self) -> Result<PathBuf> {
        let conventional = self.output_dir.join("invoice.pdf");
        if conventional.is_file() {
            return Ok(conventional);
        }

        if let Ok(dir) = std::fs::read_dir(&self.output_dir) {
            let mut pdfs: Vec<PathBuf> = dir
                .flatten()
                .map(|e| e.path())
                .filter(|p| is_pdf(p))
                .collect();
            pdfs.sort();
            if let Some(found) = pdfs.into_iter().next() {
                tracing::debug!(path = %found.display(), "adopted non-conventional artifact");
                return Ok(found);
            }
        }

        Err(AdapterError::ArtifactNotProduced(self.output_dir.clone()))
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Display filename for the caller, e.g. `invoice_Acme_Corp_20240314_102030.pdf`
fn display_filename(client_name: &str) -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("invoice_{client_name}_{stamp}.pdf")
        .replace(' ', "_")
        .replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;

    fn item() -> InvoiceLineItem {
        InvoiceLineItem {
            description: "Consulting".to_string(),
            hours: 2.5,
            rate: 75.0,
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        runner: Arc<ScriptedRunner>,
        adapter: InvoiceAdapter,
        output_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("output");
        std::fs::create_dir_all(&output_dir).unwrap();

        let settings = Settings {
            invoice_gen_path: dir.path().to_path_buf(),
            python_path: PathBuf::from("python3"),
            ..Settings::default()
        };
        let runner = Arc::new(ScriptedRunner::new());
        let adapter = InvoiceAdapter::new(&settings, runner.clone());
        Fixture {
            _dir: dir,
            runner,
            adapter,
            output_dir,
        }
    }

    #[tokio::test]
    async fn test_empty_line_items_rejected_before_any_invocation() {
        let f = fixture();
        let err = f
            .adapter
            .generate_invoice("Acme", "acme@example.com", &[], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Validation(_)));
        assert_eq!(f.runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_line_item_rejected_before_any_invocation() {
        let f = fixture();
        let bad = InvoiceLineItem {
            hours: -1.0,
            ..item()
        };
        let err = f
            .adapter
            .generate_invoice("Acme", "acme@example.com", &[bad], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Validation(_)));
        assert_eq!(f.runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generates_invoice_and_cleans_stale_pdfs() {
        let f = fixture();
        let stale = f.output_dir.join("stale.pdf");
        std::fs::write(&stale, b"old").unwrap();

        let artifact = f.output_dir.join("invoice.pdf");
        let artifact_for_hook = artifact.clone();
        f.runner.on_run(move |_| {
            std::fs::write(&artifact_for_hook, b"%PDF-1.4").unwrap();
        });
        f.runner.push_output(0, "Invoice written to output/invoice.pdf");

        let result = f
            .adapter
            .generate_invoice("Acme Corp", "acme@example.com", &[item()], Some("thanks"), None)
            .await
            .unwrap();

        assert!(!stale.exists(), "stale PDF should be removed before the run");
        assert_eq!(result.status, InvoiceStatus::Success);
        assert_eq!(result.pdf_path, artifact);
        assert_eq!(result.download_url, "/files/invoice.pdf");
        assert!(result.filename.starts_with("invoice_Acme_Corp_"));
        assert!(result.raw_output.contains("Invoice written"));

        let call = &f.runner.calls()[0];
        assert!(call.args.windows(2).any(|w| w == ["-c", "Acme Corp"]));
        assert!(call.args.windows(2).any(|w| w == ["-h", "2.50"]));
        assert!(call.args.windows(2).any(|w| w == ["--notes", "thanks"]));
    }

    #[tokio::test]
    async fn test_default_notes_prevent_interactive_prompt() {
        let f = fixture();
        let artifact = f.output_dir.join("invoice.pdf");
        f.runner.on_run(move |_| {
            std::fs::write(&artifact, b"%PDF-1.4").unwrap();
        });
        f.runner.push_output(0, "ok");

        f.adapter
            .generate_invoice("Acme", "acme@example.com", &[item()], None, None)
            .await
            .unwrap();

        let call = &f.runner.calls()[0];
        assert!(call
            .args
            .windows(2)
            .any(|w| w == ["--notes", "Generated via API"]));
    }

    #[tokio::test]
    async fn test_adopts_any_pdf_when_conventional_name_is_absent() {
        let f = fixture();
        let artifact = f.output_dir.join("acme_2024.pdf");
        f.runner.on_run(move |_| {
            std::fs::write(&artifact, b"%PDF-1.4").unwrap();
        });
        f.runner.push_output(0, "done");

        let result = f
            .adapter
            .generate_invoice("Acme", "acme@example.com", &[item()], None, None)
            .await
            .unwrap();
        assert_eq!(result.download_url, "/files/acme_2024.pdf");
    }

    #[tokio::test]
    async fn test_zero_exit_without_artifact_fails() {
        let f = fixture();
        f.runner.push_output(0, "looks fine");

        let err = f
            .adapter
            .generate_invoice("Acme", "acme@example.com", &[item()], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::ArtifactNotProduced(_)));
    }

    #[tokio::test]
    async fn test_aborted_output_is_reported_as_interactive_prompt() {
        let f = fixture();
        f.runner.push_output(1, "Notes []: Aborted!");

        let err = f
            .adapter
            .generate_invoice("Acme", "acme@example.com", &[item()], None, None)
            .await
            .unwrap_err();
        match err {
            AdapterError::ToolInvocation { message, output } => {
                assert!(message.contains("interactive"));
                assert!(output.contains("Aborted!"));
            }
            other => panic!("expected ToolInvocation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_line_items_are_signaled_not_silent() {
        let f = fixture();
        let artifact = f.output_dir.join("invoice.pdf");
        f.runner.on_run(move |_| {
            std::fs::write(&artifact, b"%PDF-1.4").unwrap();
        });
        f.runner.push_output(0, "ok");

        let second = InvoiceLineItem {
            description: "Extra work".to_string(),
            hours: 1.0,
            rate: 60.0,
        };
        let result = f
            .adapter
            .generate_invoice("Acme", "acme@example.com", &[item(), second], None, None)
            .await
            .unwrap();

        assert!(result.message.contains("1 of 2 line items billed"));
        // Only the first item's description is forwarded
        let call = &f.runner.calls()[0];
        assert!(call.args.windows(2).any(|w| w == ["-d", "Consulting"]));
        assert!(!call.args.contains(&"Extra work".to_string()));
    }
}
