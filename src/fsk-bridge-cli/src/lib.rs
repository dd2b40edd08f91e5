//! Command line host for the FSK filesystem bridge.
//!
//! # Architecture
//!
//! - `cli/` - Command-line argument parsing and dispatch
//! - `logging` - tracing subscriber setup
//! - `site` - the demo site served by the in-process runtime
//! - `*_cmd.rs` - Individual command implementations

pub mod attach_cmd;
pub mod cli;
pub mod demo_cmd;
pub mod logging;
pub mod site;
