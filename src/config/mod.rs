mod settings;

pub use settings::{Cli, Settings};
