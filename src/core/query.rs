// ddlog - core/query.rs
//
// Builds the query string sent to the log API from CLI inputs.
// The remote query language is treated as opaque text: nothing is escaped,
// so a stray quote in the free-text fragment reaches the API verbatim.

/// Inputs to the query builder.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Environment tag, e.g. `prod`.
    pub environment: String,
    /// Comma-separated status levels, e.g. `error,warn`.
    pub levels: String,
    /// Free-text fragment appended as a quoted clause when non-blank.
    pub text: String,
    /// Disable all filtering. Takes priority over every other field.
    pub all: bool,
}

impl QuerySpec {
    pub fn build(&self) -> String {
        build_query(&self.environment, &self.levels, &self.text, self.all)
    }
}

/// Build `@environment:<env> status:(<levels>)[ "<text>"]`, or an empty query
/// when `all` is set.
pub fn build_query(environment: &str, levels: &str, text: &str, all: bool) -> String {
    if all {
        return String::new();
    }

    let status = levels.split(',').collect::<Vec<_>>().join(" OR ");
    let mut query = format!("@environment:{environment} status:({status})");

    if !text.trim().is_empty() {
        query.push_str(&format!(" \"{text}\""));
    }

    query
}
