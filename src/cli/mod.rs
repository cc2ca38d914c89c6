//! Kasportal oracle command line interface.
//!
//! Operator tools for querying prices, provider health and statistics.

pub mod commands;
pub mod output;

pub use commands::*;
pub use output::*;

use async_trait::async_trait;

use crate::oracle::service::OracleService;

// ═══════════════════════════════════════════════════════════════════════════════
// CLI APPLICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Application state
#[derive(Debug)]
pub struct CliApp {
    /// Oracle service
    service: OracleService,
    /// Output formatter
    output: OutputFormatter,
    /// Verbose mode
    verbose: bool,
}

impl CliApp {
    /// Create new CLI application
    pub fn new(service: OracleService) -> Self {
        Self {
            service,
            output: OutputFormatter::default(),
            verbose: false,
        }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output = OutputFormatter::new(format);
        self
    }

    /// Get the oracle service
    pub fn service(&self) -> &OracleService {
        &self.service
    }

    /// Get output formatter
    pub fn output(&self) -> &OutputFormatter {
        &self.output
    }

    /// Check if verbose
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Execute a command
    pub async fn execute(&self, command: Command) -> CliResult<CommandOutput> {
        if self.verbose {
            tracing::debug!(?command, "executing");
        }

        match command {
            Command::Price(cmd) => cmd.execute(self).await,
            Command::Prices(cmd) => cmd.execute(self).await,
            Command::Sources(cmd) => cmd.execute(self).await,
            Command::Stats(cmd) => cmd.execute(self).await,
            Command::Aggregate(cmd) => cmd.execute(self).await,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLI RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration error
    Config(String),
    /// Command execution error
    Execution(String),
    /// Invalid argument
    InvalidArgument(String),
    /// Nothing to show
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Execution(msg) => write!(f, "Execution error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<crate::error::Error> for CliError {
    fn from(err: crate::error::Error) -> Self {
        match &err {
            crate::error::Error::Config(msg) => CliError::Config(msg.clone()),
            crate::error::Error::InvalidSymbol { .. } => CliError::InvalidArgument(err.to_string()),
            _ => CliError::Execution(err.to_string()),
        }
    }
}

/// CLI Result type
pub type CliResult<T> = std::result::Result<T, CliError>;

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Command execution output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Success status
    pub success: bool,
    /// Output message
    pub message: String,
    /// Structured data (JSON serializable)
    pub data: Option<serde_json::Value>,
    /// Tabular view of the data
    pub table: Option<Table>,
    /// Warnings
    pub warnings: Vec<String>,
}

impl CommandOutput {
    /// Create success output
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            table: None,
            warnings: Vec::new(),
        }
    }

    /// Create success with data
    pub fn success_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::success(message)
        }
    }

    /// Create error output
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(message)
        }
    }

    /// Attach a table
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Add warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for executable commands
#[async_trait]
pub trait Executable {
    /// Execute the command
    async fn execute(&self, app: &CliApp) -> CliResult<CommandOutput>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
