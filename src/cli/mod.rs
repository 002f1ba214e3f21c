//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use crate::domain::errors::{RunError, SupervisorError};

/// Report a command failure and exit.
///
/// A daemon that exited with a status code hands that code on to our caller;
/// every other failure exits with 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
            "upgrade_attempted": err
                .downcast_ref::<SupervisorError>()
                .is_some_and(SupervisorError::upgrade_attempted),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(exit_code(&err))
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SupervisorError>() {
        Some(SupervisorError::Run(RunError::Exited { status })) => status.code().unwrap_or(1),
        _ => 1,
    }
}
