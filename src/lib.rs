//! HTTP bridge in front of the freelance time-tracking and invoice CLI
//! tools.
//!
//! The core is the adapter layer: it invokes the underlying executables,
//! classifies their output (success, benign empty state, or failure), and
//! normalizes whatever they print — structured JSON or decorated terminal
//! text — into stable typed records. The HTTP surface on top is a thin
//! translation of those records into `{success, data, error}` envelopes.

pub mod config;
pub mod error;
pub mod invoker;
pub mod parse;
pub mod records;
pub mod services;
pub mod web;
