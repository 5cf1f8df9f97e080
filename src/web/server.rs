//! Web server implementation using axum

use anyhow::Result;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::Settings;
use crate::invoker::ToolRunner;
use crate::services::{InvoiceAdapter, TimeTrackerAdapter};

use super::api::{self, ApiState};

/// HTTP server fronting the two CLI adapters.
pub struct WebServer {
    settings: Settings,
    state: Arc<ApiState>,
}

impl WebServer {
    /// Create a new web server over the given runner.
    pub fn new(settings: Settings, runner: Arc<dyn ToolRunner>) -> Self {
        let state = Arc::new(ApiState {
            tracker: TimeTrackerAdapter::new(&settings, runner.clone()),
            invoices: InvoiceAdapter::new(&settings, runner),
            default_entry_limit: settings.default_entry_limit,
        });
        Self { settings, state }
    }

    /// Build the full application router.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(
                self.settings
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                HeaderName::from_static("content-type"),
                HeaderName::from_static("accept"),
                HeaderName::from_static("authorization"),
            ])
            .allow_credentials(true);

        let api_routes = Router::new()
            .route("/health", get(api::api_health))
            .route("/time/start", post(api::start_timer))
            .route("/time/stop", post(api::stop_timer))
            .route("/time/current", get(api::timer_status))
            .route("/time/entries", get(api::time_entries))
            .route("/time/today", get(api::today_summary))
            .route("/invoice/generate", post(api::generate_invoice))
            .route("/invoice/preview", get(api::preview_invoice))
            .with_state(self.state.clone());

        Router::new()
            .route("/health", get(api::health))
            .nest("/api", api_routes)
            // Generated PDFs are downloadable directly
            .nest_service(
                "/files",
                ServeDir::new(self.settings.invoice_output_dir()),
            )
            .layer(cors)
    }

    /// Run the web server until shutdown.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.settings.port));
        let app = self.router();

        tracing::info!("server starting on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
