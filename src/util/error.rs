// ddlog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation: every variant keeps its cause so the
// full chain can be logged.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ddlog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum DdlogError {
    /// Configuration discovery, loading or validation failed.
    Config(ConfigError),

    /// A request to the log API failed.
    Api(ApiError),

    /// The pattern-mining routine failed.
    Pattern(PatternError),

    /// Writing results to the output stream failed.
    Output(OutputError),

    /// The tail loop used up its retry budget.
    TailExhausted { attempts: u32 },
}

impl fmt::Display for DdlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Pattern(e) => write!(f, "Pattern error: {e}"),
            Self::Output(e) => write!(f, "Output error: {e}"),
            Self::TailExhausted { attempts } => {
                write!(f, "Tail stopped after {attempts} failed queries")
            }
        }
    }
}

impl std::error::Error for DdlogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Pattern(e) => Some(e),
            Self::Output(e) => Some(e),
            Self::TailExhausted { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// No config file exists at any of the searched locations.
    NotFound { searched: Vec<PathBuf> },

    /// JSON parsing failed.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A required key is missing or empty.
    MissingField { path: PathBuf, field: &'static str },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { searched } => {
                let paths: Vec<String> =
                    searched.iter().map(|p| p.display().to_string()).collect();
                write!(f, "No config file found (searched: {})", paths.join(", "))
            }
            Self::JsonParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::MissingField { path, field } => write!(
                f,
                "Config '{}' is missing required key '{field}'",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for DdlogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Errors from a single log API request. Never retried at this layer.
#[derive(Debug)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    Transport { source: reqwest::Error },

    /// The server answered with a non-2xx status.
    HttpStatus { status: u16, body: String },

    /// The response body does not match the expected schema.
    Decode { source: serde_json::Error },
}

impl ApiError {
    /// True for failures of the HTTP exchange itself (network or status),
    /// false for a well-delivered body that could not be decoded.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { source } => write!(f, "Transport error: {source}"),
            Self::HttpStatus { status, body } => {
                if body.is_empty() {
                    write!(f, "Transport error: HTTP {status}")
                } else {
                    write!(f, "Transport error: HTTP {status}: {body}")
                }
            }
            Self::Decode { source } => write!(f, "Decode error: {source}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport { source } => Some(source),
            Self::Decode { source } => Some(source),
            Self::HttpStatus { .. } => None,
        }
    }
}

impl From<ApiError> for DdlogError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// Errors raised by the pattern-mining routine.
#[derive(Debug)]
pub enum PatternError {
    /// Requested granularity is outside 0..=max.
    InvalidLevel { level: u8, max: u8 },

    /// A variable regex is invalid.
    InvalidVariable {
        name: String,
        pattern: String,
        source: regex::Error,
    },

    /// A variable regex exceeds the maximum allowed length.
    VariableTooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLevel { level, max } => {
                write!(f, "Pattern level {level} is out of range (0-{max})")
            }
            Self::InvalidVariable {
                name,
                pattern,
                source,
            } => write!(f, "Invalid regex for variable '{name}' ('{pattern}'): {source}"),
            Self::VariableTooLong {
                name,
                length,
                max_length,
            } => write!(
                f,
                "Regex for variable '{name}' is {length} chars, exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidVariable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PatternError> for DdlogError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// Output errors
// ---------------------------------------------------------------------------

/// Errors writing rendered results.
#[derive(Debug)]
pub enum OutputError {
    /// I/O error writing to the output stream.
    Io { source: io::Error },

    /// CSV serialisation error.
    Csv { source: csv::Error },

    /// JSON serialisation error.
    Json { source: serde_json::Error },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { source } => write!(f, "write failed: {source}"),
            Self::Csv { source } => write!(f, "CSV output failed: {source}"),
            Self::Json { source } => write!(f, "JSON output failed: {source}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Csv { source } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

impl From<OutputError> for DdlogError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

/// Convenience type alias for ddlog results.
pub type Result<T> = std::result::Result<T, DdlogError>;
