//! CLI argument parsing and command dispatch.

mod args;
mod handlers;

pub use args::{Cli, Commands, LogLevel};
pub use handlers::{dispatch_command, load_config};
