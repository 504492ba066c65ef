//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use estimator_lib::TierName;
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Render rows as a rounded table
pub fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a USD amount with thousands separators, e.g. `$4,961.52`
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Format cores with up to two decimals, trimming trailing zeros
pub fn format_cores(cores: f64) -> String {
    let formatted = format!("{:.2}", cores);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Color a size tier by how large it is
pub fn color_size(size: TierName) -> String {
    let label = size.as_str();
    match size {
        TierName::S => label.green().to_string(),
        TierName::M => label.cyan().to_string(),
        TierName::L => label.yellow().to_string(),
        TierName::XL => label.magenta().bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(413.46), "$413.46");
        assert_eq!(format_currency(4961.52), "$4,961.52");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-5.5), "-$5.50");
    }

    #[test]
    fn test_format_cores() {
        assert_eq!(format_cores(0.3), "0.3");
        assert_eq!(format_cores(64.0), "64");
        assert_eq!(format_cores(0.0), "0");
        assert_eq!(format_cores(1.256), "1.26");
    }
}
