// ddlog - platform/config.rs
//
// config.json discovery, loading and startup validation.
//
// Search order:
//   1. --config <path> (when given, the only candidate)
//   2. ./config.json
//   3. ~/.ddlog/config.json
//
// The first existing file wins. A missing file everywhere, an unreadable or
// unparseable file, or missing keys are fatal. Optional settings that are out
// of range produce warnings and fall back to defaults.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::BaseDirs;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Raw shape of config.json
// =============================================================================

/// Raw deserialisable shape of config.json.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawConfig {
    /// Datadog API key.
    #[serde(alias = "DatadogAPIKey", alias = "api_key")]
    pub api_key: Option<String>,
    /// Datadog application key.
    #[serde(alias = "DatadogAppKey", alias = "app_key")]
    pub app_key: Option<String>,
    /// Datadog site, e.g. `datadoghq.eu`.
    pub site: Option<String>,
    /// Full endpoint URL; overrides `site`.
    pub endpoint: Option<String>,
    /// Per-request timeout. Absent = transport default.
    pub request_timeout_secs: Option<u64>,
    /// `"tail"` section.
    pub tail: TailSection,
    /// `"logging"` section.
    pub logging: LoggingSection,
    /// `"patterns"` section.
    pub patterns: PatternsSection,
}

/// `"tail"` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TailSection {
    pub poll_interval_secs: Option<u64>,
    pub overlap_secs: Option<i64>,
    pub retry_budget: Option<u32>,
}

/// `"logging"` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// `"patterns"` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PatternsSection {
    /// Placeholder name -> token regex. Replaces the built-in set when present.
    pub variables: Option<BTreeMap<String, String>>,
}

// =============================================================================
// Validated config
// =============================================================================

/// Validated application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// File the config was loaded from.
    pub path: PathBuf,

    // -- Credentials --
    pub api_key: String,
    pub app_key: String,

    // -- Transport --
    /// Full URL of the log query endpoint.
    pub endpoint: String,
    /// Per-request timeout; `None` keeps the transport default.
    pub request_timeout: Option<Duration>,

    // -- Tail --
    pub tail_poll_interval: Duration,
    pub tail_overlap_secs: i64,
    pub tail_retry_budget: u32,

    // -- Logging --
    pub log_level: Option<String>,

    // -- Patterns --
    /// `(name, regex)` pairs for the pattern miner.
    pub pattern_variables: Vec<(String, String)>,
}

// Keys stay out of Debug output so they cannot leak into logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("path", &self.path)
            .field("api_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("tail_poll_interval", &self.tail_poll_interval)
            .field("tail_overlap_secs", &self.tail_overlap_secs)
            .field("tail_retry_budget", &self.tail_retry_budget)
            .field("log_level", &self.log_level)
            .field("pattern_variables", &self.pattern_variables)
            .finish()
    }
}

/// Endpoint URL for a Datadog site.
pub fn endpoint_for_site(site: &str) -> String {
    format!("https://api.{site}{}", constants::LOG_QUERY_PATH)
}

fn default_pattern_variables() -> Vec<(String, String)> {
    constants::DEFAULT_PATTERN_VARIABLES
        .iter()
        .map(|(n, p)| (n.to_string(), p.to_string()))
        .collect()
}

// =============================================================================
// Discovery and loading
// =============================================================================

/// Config file candidates in search order.
pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut paths = vec![PathBuf::from(constants::CONFIG_FILE_NAME)];
    if let Some(dirs) = BaseDirs::new() {
        paths.push(
            dirs.home_dir()
                .join(constants::HOME_CONFIG_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME),
        );
    }
    paths
}

/// Warning for a default search that could not include the home directory.
pub fn home_dir_warning(explicit: Option<&Path>, candidates: &[PathBuf]) -> Option<String> {
    (explicit.is_none() && candidates.len() < 2).then(|| {
        format!(
            "Could not determine home directory; only ./{} was searched.",
            constants::CONFIG_FILE_NAME
        )
    })
}

/// Locate, read and validate the config.
///
/// Returns the config and a list of non-fatal warnings. Runs before logging
/// is initialised, so everything worth reporting goes into the warnings.
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let candidates = candidate_paths(explicit);
    let (config, mut warnings) = load_first(&candidates)?;
    warnings.extend(home_dir_warning(explicit, &candidates));
    Ok((config, warnings))
}

/// Load the first existing file among `candidates`.
pub fn load_first(candidates: &[PathBuf]) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let path = candidates
        .iter()
        .find(|p| p.is_file())
        .ok_or_else(|| ConfigError::NotFound {
            searched: candidates.to_vec(),
        })?;

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    parse_config(&content, path)
}

/// Parse and validate config JSON. `path` is used for error context only.
pub fn parse_config(content: &str, path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw: RawConfig =
        serde_json::from_str(content).map_err(|source| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    let api_key = required(raw.api_key, path, "apiKey")?;
    let app_key = required(raw.app_key, path, "appKey")?;

    let mut warnings: Vec<String> = Vec::new();

    // -- Transport: endpoint / site --
    let site = raw
        .site
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(constants::DEFAULT_SITE);
    let mut endpoint = endpoint_for_site(site);
    if let Some(ref url) = raw.endpoint {
        if url.starts_with("https://") || url.starts_with("http://") {
            endpoint = url.clone();
        } else {
            warnings.push(format!(
                "endpoint = \"{url}\" is not an http(s) URL. Using {endpoint}."
            ));
        }
    }

    // -- Transport: request_timeout_secs --
    let mut request_timeout = None;
    if let Some(secs) = raw.request_timeout_secs {
        if (constants::MIN_REQUEST_TIMEOUT_SECS..=constants::MAX_REQUEST_TIMEOUT_SECS)
            .contains(&secs)
        {
            request_timeout = Some(Duration::from_secs(secs));
        } else {
            warnings.push(format!(
                "requestTimeoutSecs = {secs} is out of range ({}-{}). Using transport default.",
                constants::MIN_REQUEST_TIMEOUT_SECS,
                constants::MAX_REQUEST_TIMEOUT_SECS,
            ));
        }
    }

    // -- Tail: poll_interval_secs --
    let mut tail_poll_interval = Duration::from_secs(constants::DEFAULT_TAIL_POLL_INTERVAL_SECS);
    if let Some(secs) = raw.tail.poll_interval_secs {
        if (constants::MIN_TAIL_POLL_INTERVAL_SECS..=constants::MAX_TAIL_POLL_INTERVAL_SECS)
            .contains(&secs)
        {
            tail_poll_interval = Duration::from_secs(secs);
        } else {
            warnings.push(format!(
                "[tail] pollIntervalSecs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_POLL_INTERVAL_SECS,
                constants::MAX_TAIL_POLL_INTERVAL_SECS,
                constants::DEFAULT_TAIL_POLL_INTERVAL_SECS,
            ));
        }
    }

    // -- Tail: overlap_secs --
    let mut tail_overlap_secs = constants::DEFAULT_TAIL_OVERLAP_SECS;
    if let Some(secs) = raw.tail.overlap_secs {
        if (constants::MIN_TAIL_OVERLAP_SECS..=constants::MAX_TAIL_OVERLAP_SECS).contains(&secs) {
            tail_overlap_secs = secs;
        } else {
            warnings.push(format!(
                "[tail] overlapSecs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_OVERLAP_SECS,
                constants::MAX_TAIL_OVERLAP_SECS,
                constants::DEFAULT_TAIL_OVERLAP_SECS,
            ));
        }
    }

    // -- Tail: retry_budget --
    let mut tail_retry_budget = constants::DEFAULT_TAIL_RETRY_BUDGET;
    if let Some(budget) = raw.tail.retry_budget {
        if (constants::MIN_TAIL_RETRY_BUDGET..=constants::MAX_TAIL_RETRY_BUDGET).contains(&budget) {
            tail_retry_budget = budget;
        } else {
            warnings.push(format!(
                "[tail] retryBudget = {budget} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_RETRY_BUDGET,
                constants::MAX_TAIL_RETRY_BUDGET,
                constants::DEFAULT_TAIL_RETRY_BUDGET,
            ));
        }
    }

    // -- Logging: level --
    let mut log_level = None;
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    // -- Patterns: variables --
    let pattern_variables = match raw.patterns.variables {
        Some(vars) => vars.into_iter().collect(),
        None => default_pattern_variables(),
    };

    let config = AppConfig {
        path: path.to_path_buf(),
        api_key,
        app_key,
        endpoint,
        request_timeout,
        tail_poll_interval,
        tail_overlap_secs,
        tail_retry_budget,
        log_level,
        pattern_variables,
    };

    Ok((config, warnings))
}

fn required(value: Option<String>, path: &Path, field: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            path: path.to_path_buf(),
            field,
        })
}
