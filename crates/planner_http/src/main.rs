//! planner-server entry point.
//!
//! # Responsibility
//! - Read configuration from the environment, bootstrap logging and
//!   serve the task API over a fresh in-memory store.

use log::info;
use planner_http::{serve_api, shared_service, HttpServerConfig};
use std::net::SocketAddr;
use std::process::ExitCode;

const DEFAULT_BIND: &str = "127.0.0.1:8701";

fn main() -> ExitCode {
    let bind_raw = std::env::var("PLANNER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let bind: SocketAddr = match bind_raw.parse() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("invalid PLANNER_BIND `{bind_raw}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    let level = std::env::var("PLANNER_LOG_LEVEL")
        .unwrap_or_else(|_| planner_core::default_log_level().to_string());
    let log_dir = std::env::var("PLANNER_LOG_DIR").unwrap_or_else(|_| {
        std::env::temp_dir()
            .join("planner-logs")
            .to_string_lossy()
            .into_owned()
    });
    if let Err(err) = planner_core::init_logging(&level, &log_dir) {
        eprintln!("logging init failed: {err}");
        return ExitCode::FAILURE;
    }

    let service = shared_service();
    info!("event=server_start module=http status=ok bind={bind}");
    println!("planner-server listening on http://{bind}");

    match serve_api(HttpServerConfig { bind }, service) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("server error: {err}");
            ExitCode::FAILURE
        }
    }
}
