//! HTTP boundary: thin request/response wrappers over the adapters.

pub mod api;
mod server;

pub use api::ApiState;
pub use server::WebServer;
