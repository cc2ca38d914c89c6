//! CLI Output Formatting.
//!
//! Handles output formatting for different formats (text, JSON, table).

use console::style;
use serde::Serialize;

use super::CommandOutput;
use crate::core::types::{DataSourceStatus, PriceReading};
use crate::utils::format::{format_change, format_price};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// Pretty JSON format
    JsonPretty,
    /// Table format
    Table,
}

impl OutputFormat {
    /// Check if this is a JSON format
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "table" | "tbl" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Plain-text table attached to a command result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column headers
    pub headers: Vec<String>,
    /// Rows, one cell per header
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given headers
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Table of price readings
    pub fn readings<'a>(readings: impl IntoIterator<Item = &'a PriceReading>) -> Self {
        let mut table = Self::new(&["Pair", "Price", "24h", "Volume", "Status", "Confidence", "Sources"]);
        for reading in readings {
            table.push(reading_row(reading));
        }
        table
    }

    /// Table of provider health results
    pub fn sources(statuses: &[DataSourceStatus]) -> Self {
        let mut table = Self::new(&["Source", "Status", "Latency", "Reliability"]);
        for status in statuses {
            table.push(vec![
                status.name.clone(),
                status.status.to_string(),
                status.latency.clone(),
                format!("{:.1}%", status.reliability),
            ]);
        }
        table
    }

    /// Table of named metric values
    pub fn metrics(values: &[(&str, u64)]) -> Self {
        let mut table = Self::new(&["Metric", "Value"]);
        for (name, value) in values {
            table.push(vec![name.to_string(), value.to_string()]);
        }
        table
    }

    /// Column widths (widest cell or header)
    pub fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }
        widths
    }
}

/// One display row for a reading
pub fn reading_row(reading: &PriceReading) -> Vec<String> {
    vec![
        reading.pair.clone(),
        format_price(reading.price),
        format_change(reading.change_24h),
        reading.volume.clone(),
        reading.status.to_string(),
        format!("{:.1}%", reading.confidence),
        reading.sources.to_string(),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMATTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Output formatter for CLI
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    /// Output format
    format: OutputFormat,
    /// Color enabled
    color: bool,
}

impl OutputFormatter {
    /// Create new formatter
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: console::colors_enabled(),
        }
    }

    /// Disable color
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Get format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print a command result
    pub fn render(&self, output: &CommandOutput) {
        if self.format.is_json() {
            match &output.data {
                Some(data) => self.print_json(data),
                None => self.print_json(&serde_json::json!({
                    "status": if output.success { "success" } else { "error" },
                    "message": output.message,
                })),
            }
            return;
        }

        if output.success {
            self.success(&output.message);
        } else {
            self.error(&output.message);
        }

        match (&output.table, &output.data) {
            (Some(table), _) => self.table(table),
            (None, Some(data)) if self.format == OutputFormat::Text => self.print_text(data, 1),
            _ => {}
        }

        for warning in &output.warnings {
            self.warning(warning);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.color {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("OK: {}", message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        if self.format.is_json() {
            self.print_json(&serde_json::json!({ "status": "error", "message": message }));
        } else if self.color {
            eprintln!("{} {}", style("✗").red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.color {
            println!("{} {}", style("⚠").yellow(), message);
        } else {
            println!("WARNING: {}", message);
        }
    }

    /// Print table
    pub fn table(&self, table: &Table) {
        if table.headers.is_empty() {
            return;
        }

        let widths = table.widths();
        let pad = |cells: &[String]| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    format!("{:width$}", cell, width = width)
                })
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let header = pad(&table.headers);
        if self.color {
            println!("{}", style(header).bold());
        } else {
            println!("{}", header);
        }

        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        println!("{}", separator.join("-+-"));

        for row in &table.rows {
            let line = pad(row);
            if self.color {
                println!("{}", self.colorize_row(row, line));
            } else {
                println!("{}", line);
            }
        }
    }

    /// Tint a row by the status word it contains
    fn colorize_row(&self, row: &[String], line: String) -> String {
        let has = |word: &str| row.iter().any(|cell| cell == word);

        if has("active") || has("online") {
            style(line).green().to_string()
        } else if has("degraded") {
            style(line).yellow().to_string()
        } else if has("offline") {
            style(line).red().to_string()
        } else {
            line
        }
    }

    /// Print JSON data
    fn print_json<T: Serialize>(&self, data: &T) {
        let output = if matches!(self.format, OutputFormat::JsonPretty) {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };

        if let Ok(json) = output {
            println!("{}", json);
        }
    }

    /// Print text formatted data
    fn print_text(&self, json: &serde_json::Value, indent: usize) {
        let prefix = "  ".repeat(indent);

        match json {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    let key = if self.color {
                        style(key).bold().to_string()
                    } else {
                        key.clone()
                    };
                    match value {
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            println!("{}{}:", prefix, key);
                            self.print_text(value, indent + 1);
                        }
                        _ => println!("{}{}: {}", prefix, key, format_value(value)),
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    println!("{}[{}]:", prefix, i);
                    self.print_text(item, indent + 1);
                }
            }
            _ => println!("{}{}", prefix, format_value(json)),
        }
    }
}

/// Format a JSON value for text output
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".into(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SourceStatus, TradingPair};

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json-pretty".parse::<OutputFormat>().unwrap(), OutputFormat::JsonPretty);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert!(OutputFormat::Json.is_json());
        assert!(!OutputFormat::Table.is_json());
    }

    #[test]
    fn test_formatter_creation() {
        let formatter = OutputFormatter::new(OutputFormat::Json).without_color();
        assert_eq!(formatter.format(), OutputFormat::Json);
    }

    #[test]
    fn test_reading_row() {
        let pair: TradingPair = "KAS/USD".parse().unwrap();
        let reading = PriceReading::new(&pair, 0.1234)
            .unwrap()
            .with_change_24h(-2.5)
            .with_volume("$2.1M")
            .with_confidence(99.5)
            .with_sources(4);

        assert_eq!(
            reading_row(&reading),
            vec!["KAS/USD", "$0.123400", "-2.50%", "$2.1M", "active", "99.5%", "4"]
        );
    }

    #[test]
    fn test_sources_table() {
        let table = Table::sources(&[DataSourceStatus {
            name: "CoinMarketCap".into(),
            status: SourceStatus::Offline,
            latency: "N/A".into(),
            reliability: 0.0,
        }]);

        assert_eq!(table.rows, vec![vec!["CoinMarketCap", "offline", "N/A", "0.0%"]]);
        assert_eq!(table.widths(), vec![13, 7, 7, 11]);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&serde_json::Value::Null), "null");
        assert_eq!(format_value(&serde_json::json!(true)), "true");
        assert_eq!(format_value(&serde_json::json!(42)), "42");
        assert_eq!(format_value(&serde_json::json!("hello")), "hello");
    }
}
