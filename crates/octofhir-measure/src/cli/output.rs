//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_measure_diagnostics::{Diagnostic, Severity};
use octofhir_measure_eval::OUTCOME_PARAMETER;
use octofhir_measure_model::{OperationOutcome, Parameters};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    JsonPretty,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "json-pretty" => Ok(Self::JsonPretty),
            other => anyhow::bail!("Unknown output format '{}': expected json or pretty", other),
        }
    }
}

/// Where and how command results are written
#[derive(Debug, Clone, Default)]
pub struct OutputTarget {
    pub format: OutputFormat,
    /// Output file (default: stdout)
    pub file: Option<PathBuf>,
}

impl OutputTarget {
    /// Serialize a result as JSON and write it out
    pub fn emit<T: Serialize>(&self, result: &T) -> Result<()> {
        let value = serde_json::to_value(result).context("Failed to serialize result")?;
        print_output(&value, self.format, self.file.as_deref())
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(io::stderr().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    let mut message = format!("{} {}", "Error:".red().bold(), error);
    for cause in error.chain().skip(1) {
        message.push_str(&format!("\n  {} {}", "caused by:".dimmed(), cause));
    }
    message
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Format a diagnostic with its code
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".cyan().bold(),
    };
    let mut line = format!(
        "{}[{}]: {}",
        label,
        diagnostic.code.to_string().cyan(),
        diagnostic.message
    );
    if let Some(resource) = &diagnostic.resource {
        line.push_str(&format!(" ({})", resource));
    }
    line
}

/// Print the warnings of an operation's `outcome` parameter to stderr
pub fn print_outcome(parameters: &Parameters) {
    let Some(outcome) = parameters
        .get(OUTCOME_PARAMETER)
        .and_then(|p| p.resource.as_ref())
        .and_then(|r| r.to_typed::<OperationOutcome>().ok())
    else {
        return;
    };
    for issue in &outcome.issue {
        let details = issue.details.as_ref();
        let code = details.and_then(|d| d.first_code()).unwrap_or("-");
        let text = details.and_then(|d| d.text.as_deref()).unwrap_or(&issue.code);
        let mut line = format!("[{}] {}", code, text);
        for expression in &issue.expression {
            line.push_str(&format!(" ({})", expression));
        }
        eprintln!("{}", format_warning(&line));
    }
}

/// Format JSON value for output
pub fn format_json(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value),
    }
    .context("Failed to serialize JSON")
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Print output in the specified format
pub fn print_output(value: &Value, format: OutputFormat, output_file: Option<&Path>) -> Result<()> {
    write_output(&format_json(value, format)?, output_file)
}
