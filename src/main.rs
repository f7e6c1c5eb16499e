// Orrery - Headless runner for the sandbox sky simulation
// Prints a JSON run summary on success; exits non-zero on failure.

use std::process::ExitCode;

fn main() -> ExitCode {
    match orrery_lib::run() {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(err) => log::warn!("could not encode run summary: {err}"),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("[{}] {err}", err.code());
            ExitCode::FAILURE
        }
    }
}
