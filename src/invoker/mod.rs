//! Subprocess invocation and result triage for the wrapped CLI tools.

mod outcome;
mod runner;

pub use outcome::{classify, Outcome};
pub use runner::{ProcessRunner, ToolOutput, ToolRunner};

#[cfg(test)]
pub(crate) use runner::testing;
