/// safe-eval runner
///
/// Reads `scope.json` and `user_code.py` from the data directory, runs the
/// script once and prints a single JSON result on stdout.
use std::process::ExitCode;

use safe_eval_core::cli;

fn main() -> ExitCode {
    match cli::run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
