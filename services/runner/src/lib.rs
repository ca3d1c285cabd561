mod cli;
mod console;

use std::process::ExitCode;

use property_alerts::error::AppError;

pub fn run() -> Result<ExitCode, AppError> {
    cli::run()
}
