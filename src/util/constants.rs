// ddlog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ddlog";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Remote API
// =============================================================================

/// Default Datadog site used to build the query endpoint.
pub const DEFAULT_SITE: &str = "datadoghq.com";

/// Path of the log list endpoint, appended to `https://api.<site>`.
pub const LOG_QUERY_PATH: &str = "/api/v1/logs-queries/list";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "DD-API-KEY";

/// Header carrying the application key.
pub const APP_KEY_HEADER: &str = "DD-APPLICATION-KEY";

/// Page size requested from the API. This is the maximum the endpoint accepts.
pub const PAGE_SIZE: u32 = 1_000;

/// Sort order requested from the API. Ascending keeps the tail chronological.
pub const SORT_ORDER: &str = "asc";

/// Timestamp layout for the request's `time.from` / `time.to` bounds.
pub const API_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Upper bound on pages followed during one bulk fetch. A server that never
/// clears `nextLogId` would otherwise loop forever.
pub const MAX_PAGES: usize = 1_000;

/// Maximum number of response-body bytes kept in an HTTP status error.
pub const MAX_ERROR_BODY_PREVIEW: usize = 512;

/// Minimum user-configurable request timeout (seconds).
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum user-configurable request timeout (seconds).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// Tail loop
// =============================================================================

/// Sleep between tail polls (seconds).
pub const DEFAULT_TAIL_POLL_INTERVAL_SECS: u64 = 30;

/// Minimum user-configurable poll interval (seconds).
pub const MIN_TAIL_POLL_INTERVAL_SECS: u64 = 1;

/// Maximum user-configurable poll interval (seconds).
pub const MAX_TAIL_POLL_INTERVAL_SECS: u64 = 3_600;

/// Backward overlap applied to each new window, so entries that arrive late at
/// the remote system are still picked up (seconds).
pub const DEFAULT_TAIL_OVERLAP_SECS: i64 = 5;

/// Minimum user-configurable overlap (seconds).
pub const MIN_TAIL_OVERLAP_SECS: i64 = 0;

/// Maximum user-configurable overlap (seconds).
pub const MAX_TAIL_OVERLAP_SECS: i64 = 300;

/// Failed polls tolerated per tail session before giving up.
pub const DEFAULT_TAIL_RETRY_BUDGET: u32 = 5;

/// Minimum user-configurable retry budget.
pub const MIN_TAIL_RETRY_BUDGET: u32 = 1;

/// Maximum user-configurable retry budget.
pub const MAX_TAIL_RETRY_BUDGET: u32 = 1_000;

// =============================================================================
// Query defaults (CLI)
// =============================================================================

/// Default environment tag.
pub const DEFAULT_ENVIRONMENT: &str = "prod";

/// Default comma-separated status levels.
pub const DEFAULT_LEVELS: &str = "error";

/// Default lookback in minutes.
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 15;

/// Longest accepted lookback: 30 days.
pub const MAX_LOOKBACK_MINUTES: i64 = 30 * 24 * 60;

// =============================================================================
// Output
// =============================================================================

/// Line printed between entries when delimiting is enabled.
pub const ENTRY_DELIMITER: &str =
    "-----------------------------------------------------------------";

/// Date/time layout for displayed timestamps; fractional seconds are appended
/// separately with trailing zeros trimmed.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Pattern mining
// =============================================================================

/// Highest clustering granularity accepted.
pub const MAX_PATTERN_LEVEL: u8 = 3;

/// Maximum clustering distance per level (index = level).
pub const PATTERN_MAX_DISTANCES: [f64; 4] = [0.01, 0.1, 0.3, 0.9];

/// Token substituted for runs of differing tokens in a merged pattern.
pub const PATTERN_WILDCARD: &str = "*";

/// Variable regexes applied to each token before clustering, as
/// `(placeholder name, pattern)`. Overridable from config.
pub const DEFAULT_PATTERN_VARIABLES: &[(&str, &str)] = &[
    ("hex", r"^0x[0-9a-fA-F]+$"),
    ("ip", r"^\d{1,3}(\.\d{1,3}){3}(:\d+)?$"),
    ("num", r"^-?\d+(\.\d+)?$"),
    (
        "uuid",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    ),
];

/// Maximum length of a user-supplied variable regex.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Logging
// =============================================================================

/// Default log level. Diagnostics go to stderr; results go to stdout, so the
/// default stays quiet.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name, looked up in the working directory first.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory under the user's home holding the fallback config file.
pub const HOME_CONFIG_DIR_NAME: &str = ".ddlog";
