// server/src/cli/mod.rs

pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, ServeArgs};
pub use handlers::{start_cli, run_command};
