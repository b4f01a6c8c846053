//! CLI module for segquorum
//!
//! Provides command-line inspection of:
//! - decode: a membership content string
//! - form: the segment form of a membership and its static flags
//! - check-write: the generic write quorum
//! - history: the latest persisted membership of a segment

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_write, decode, form, history, membership_json, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
