// ddlog - core/pattern.rs
//
// Log pattern mining behind the `Clusterer` trait.
//
// `LogMine` is the default implementation: messages are tokenised on
// whitespace, variable-looking tokens (numbers, hex, ids) are replaced by
// `<name>` placeholders, and the token lists are grouped by repeated one-pass
// clustering. Level 0 groups near-identical messages; every further level
// re-clusters the previous level's patterns with a looser distance bound.
// Core layer: pure logic, no I/O.

use crate::util::constants::{
    DEFAULT_PATTERN_VARIABLES, MAX_PATTERN_LEVEL, MAX_REGEX_PATTERN_LENGTH,
    PATTERN_MAX_DISTANCES, PATTERN_WILDCARD,
};
use crate::util::error::PatternError;
use regex::Regex;
use serde::Serialize;
use std::fmt;

// =============================================================================
// Public interface
// =============================================================================

/// Groups similar messages into patterns.
pub trait Clusterer {
    /// Cluster `messages` at granularity `level` (0 = strictest).
    fn cluster(&self, messages: &[String], level: u8) -> Result<PatternSummary, PatternError>;
}

/// One pattern and how many messages it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCluster {
    pub count: usize,
    pub pattern: Vec<String>,
}

impl PatternCluster {
    pub fn pattern_text(&self) -> String {
        self.pattern.join(" ")
    }
}

/// Clustering result, most frequent pattern first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternSummary {
    pub level: u8,
    pub clusters: Vec<PatternCluster>,
}

impl PatternSummary {
    /// Number of messages covered by all clusters.
    pub fn total(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }
}

impl fmt::Display for PatternSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cluster in &self.clusters {
            writeln!(f, "{:>8} {}", cluster.count, cluster.pattern_text())?;
        }
        Ok(())
    }
}

// =============================================================================
// LogMine
// =============================================================================

/// A placeholder substituted for tokens matching `regex`.
#[derive(Debug, Clone)]
struct Variable {
    placeholder: String,
    regex: Regex,
}

/// Default `Clusterer`.
#[derive(Debug, Clone)]
pub struct LogMine {
    variables: Vec<Variable>,
}

impl LogMine {
    /// Build with `(name, regex)` variables, checked in the given order.
    pub fn new<N, P>(variables: &[(N, P)]) -> Result<Self, PatternError>
    where
        N: AsRef<str>,
        P: AsRef<str>,
    {
        let mut compiled = Vec::with_capacity(variables.len());
        for (name, pattern) in variables {
            let (name, pattern) = (name.as_ref(), pattern.as_ref());
            if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
                return Err(PatternError::VariableTooLong {
                    name: name.to_string(),
                    length: pattern.len(),
                    max_length: MAX_REGEX_PATTERN_LENGTH,
                });
            }
            let regex = Regex::new(pattern).map_err(|source| PatternError::InvalidVariable {
                name: name.to_string(),
                pattern: pattern.to_string(),
                source,
            })?;
            compiled.push(Variable {
                placeholder: format!("<{name}>"),
                regex,
            });
        }
        Ok(Self {
            variables: compiled,
        })
    }

    /// Build with the built-in number / hex / ip / uuid variables.
    pub fn with_default_variables() -> Result<Self, PatternError> {
        Self::new(DEFAULT_PATTERN_VARIABLES)
    }

    fn tokenize(&self, message: &str) -> Vec<String> {
        message
            .split_whitespace()
            .map(|token| {
                self.variables
                    .iter()
                    .find(|v| v.regex.is_match(token))
                    .map(|v| v.placeholder.clone())
                    .unwrap_or_else(|| token.to_string())
            })
            .collect()
    }
}

impl Clusterer for LogMine {
    fn cluster(&self, messages: &[String], level: u8) -> Result<PatternSummary, PatternError> {
        if level > MAX_PATTERN_LEVEL {
            return Err(PatternError::InvalidLevel {
                level,
                max: MAX_PATTERN_LEVEL,
            });
        }

        let mut groups: Vec<Group> = messages
            .iter()
            .map(|m| Group::single(self.tokenize(m)))
            .collect();

        for max_distance in &PATTERN_MAX_DISTANCES[..=level as usize] {
            let before = groups.len();
            groups = one_pass(groups, *max_distance);
            tracing::debug!(
                max_distance,
                before,
                after = groups.len(),
                "Clustering pass complete"
            );
        }

        let mut clusters: Vec<PatternCluster> = groups
            .into_iter()
            .map(|g| PatternCluster {
                count: g.count,
                pattern: g.pattern,
            })
            .collect();
        // Stable: equal counts keep first-seen order.
        clusters.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(PatternSummary { level, clusters })
    }
}

// =============================================================================
// Clustering internals
// =============================================================================

#[derive(Debug, Clone)]
struct Group {
    /// First member; distances are measured against it.
    representative: Vec<String>,
    pattern: Vec<String>,
    count: usize,
}

impl Group {
    fn single(tokens: Vec<String>) -> Self {
        Self {
            representative: tokens.clone(),
            pattern: tokens,
            count: 1,
        }
    }
}

/// Assign each input to the first existing group within `max_distance`, or
/// start a new group. Inputs are the previous level's patterns.
fn one_pass(items: Vec<Group>, max_distance: f64) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|g| distance(&g.representative, &item.pattern) <= max_distance)
        {
            Some(group) => {
                group.pattern = merge(&group.pattern, &item.pattern);
                group.count += item.count;
            }
            None => groups.push(Group {
                representative: item.pattern.clone(),
                pattern: item.pattern,
                count: item.count,
            }),
        }
    }
    groups
}

fn tokens_match(a: &str, b: &str) -> bool {
    a == b || a == PATTERN_WILDCARD || b == PATTERN_WILDCARD
}

/// Positional distance in `[0, 1]`: one minus the share of aligned positions
/// that match, over the longer length.
fn distance(a: &[String], b: &[String]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 0.0;
    }
    let matches = a
        .iter()
        .zip(b)
        .filter(|(x, y)| tokens_match(x, y))
        .count();
    1.0 - matches as f64 / max_len as f64
}

/// Align two token lists on their longest common subsequence. Common tokens
/// are kept; every run of unaligned tokens becomes a single wildcard.
fn merge(a: &[String], b: &[String]) -> Vec<String> {
    let (n, m) = (a.len(), b.len());
    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(n.max(m));
    let push_wildcard = |out: &mut Vec<String>| {
        if out.last().map(String::as_str) != Some(PATTERN_WILDCARD) {
            out.push(PATTERN_WILDCARD.to_string());
        }
    };

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            if a[i] == PATTERN_WILDCARD {
                push_wildcard(&mut out);
            } else {
                out.push(a[i].clone());
            }
            i += 1;
            j += 1;
        } else {
            push_wildcard(&mut out);
            if lcs[i + 1][j] >= lcs[i][j + 1] {
                i += 1;
            } else {
                j += 1;
            }
        }
    }
    if i < n || j < m {
        push_wildcard(&mut out);
    }
    out
}
