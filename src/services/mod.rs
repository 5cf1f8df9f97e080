//! Adapter facades over the wrapped CLI tools.
//!
//! Each call is synchronous and self-contained: one subprocess, one
//! classification, one parse. No caching, no retries, no shared state.

mod invoice;
mod time_tracker;

pub use invoice::InvoiceAdapter;
pub use time_tracker::TimeTrackerAdapter;
