//! Error types for the Kasportal price oracle.
//!
//! Errors stay inside the oracle core: adapters surface them as `Err`,
//! and the service boundary turns them into `None`, a stale reading or
//! a boolean. Only constructors and configuration loading hand an
//! `Error` back to the caller.

use thiserror::Error;

/// Result type alias for oracle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Symbol Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Symbol could not be parsed as `BASE/QUOTE`
    #[error("Invalid symbol {symbol}: {reason}")]
    InvalidSymbol {
        /// Raw symbol as supplied
        symbol: String,
        /// Reason for rejection
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Upstream Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Requested URL
        url: String,
        /// Status code
        status: u16,
    },

    /// Request exceeded the configured timeout
    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout {
        /// Requested URL
        url: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// Connection or transport failure
    #[error("Request to {url} failed: {reason}")]
    Request {
        /// Requested URL
        url: String,
        /// Transport error description
        reason: String,
    },

    /// Upstream body did not have the expected shape
    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse {
        /// Provider name
        provider: String,
        /// What was wrong
        reason: String,
    },

    /// Price was zero, negative or not a number
    #[error("Invalid price {price} for {pair}")]
    InvalidPrice {
        /// Canonical pair
        pair: String,
        /// Offending value
        price: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if another source (or a later retry) may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Http { .. }
                | Error::Timeout { .. }
                | Error::Request { .. }
                | Error::MalformedResponse { .. }
                | Error::InvalidPrice { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Symbol errors: 1xxx
            Error::InvalidSymbol { .. } => 1001,

            // Upstream errors: 2xxx
            Error::Http { .. } => 2001,
            Error::Timeout { .. } => 2002,
            Error::Request { .. } => 2003,
            Error::MalformedResponse { .. } => 2004,
            Error::InvalidPrice { .. } => 2005,

            // Configuration errors: 3xxx
            Error::Config(_) => 3001,
            Error::Io(_) => 3002,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let codes = vec![
            Error::InvalidSymbol { symbol: "".into(), reason: "".into() }.code(),
            Error::Http { url: "".into(), status: 500 }.code(),
            Error::Timeout { url: "".into(), timeout_ms: 0 }.code(),
            Error::Request { url: "".into(), reason: "".into() }.code(),
            Error::MalformedResponse { provider: "".into(), reason: "".into() }.code(),
            Error::InvalidPrice { pair: "".into(), price: "".into() }.code(),
            Error::Config("".into()).code(),
            Error::Io("".into()).code(),
            Error::Internal("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::Timeout {
            url: "https://api.binance.com/api/v3/ping".into(),
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("5000ms"));
        assert!(err.to_string().contains("binance"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Http { url: "x".into(), status: 503 }.is_recoverable());
        assert!(Error::InvalidPrice { pair: "BTC/USD".into(), price: "0".into() }.is_recoverable());
        assert!(!Error::Config("bad".into()).is_recoverable());
    }
}
