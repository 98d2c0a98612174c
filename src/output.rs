//! JSON and text output for CLI commands.

use serde::Serialize;

use assethub_core::OperationResult;
use assethub_core::error::AppError;
use assethub_core::result::AppResult;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Print a serializable value in the selected format.
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{item:#?}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Print an operation result. Error and conflict results fail the command.
pub fn print_result(result: &OperationResult, format: OutputFormat) -> AppResult<()> {
    print_item(result, format);
    if result.is_error() {
        return Err(AppError::validation(
            result.error_message().unwrap_or("Operation failed").to_string(),
        ));
    }
    if let Some(prompt) = result.prompt() {
        return Err(AppError::conflict(format!(
            "{prompt} Re-run with --on-conflict to decide."
        )));
    }
    Ok(())
}
