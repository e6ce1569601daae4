use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the searoute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of library errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The rule set, class list, profile or router options are invalid.
    Configuration,
    /// A caller-supplied coordinate or network could not be used.
    Input,
    /// A required artifact is missing, unreadable or corrupt.
    Resource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Input => "input",
            ErrorKind::Resource => "resource",
        };
        f.write_str(value)
    }
}

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a profile set is requested for zero vessel classes.
    #[error("vessel class list is empty")]
    EmptyClassList,

    /// Raised when a vessel class is not declared by the passage rule set.
    #[error("unknown vessel class: {name}{}", format_suggestions(.suggestions))]
    UnknownVesselClass {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a query names a routing profile that was never built.
    #[error(
        "unknown profile '{name}'; available profiles: {}{}",
        .available.join(", "),
        format_suggestions(.suggestions)
    )]
    UnknownProfile {
        name: String,
        available: Vec<String>,
        suggestions: Vec<String>,
    },

    /// Raised when the passage rule configuration is structurally invalid.
    #[error("invalid passage rule configuration: {message}")]
    InvalidRuleConfig { message: String },

    /// Raised when a router option is out of range.
    #[error("invalid router option {option}: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    /// Raised when a coordinate could not be parsed or is not finite.
    #[error("malformed coordinate: {input}")]
    MalformedCoordinate { input: String },

    /// Raised when a route endpoint cannot be snapped onto the network.
    #[error("cannot snap point {input} to the network (the network has no vertices)")]
    UnsnappablePoint { input: String },

    /// Raised when the coordinate index is queried before it was built.
    #[error("coordinate index queried before it was built")]
    IndexNotBuilt,

    /// Raised when a network document is not a usable feature collection.
    #[error("invalid network: {message}")]
    InvalidNetwork { message: String },

    /// Raised when loading a compiled routing graph from a file fails.
    #[error("failed to load routing graph from {path}: {message}")]
    GraphArtifactLoad { path: PathBuf, message: String },

    /// Raised when serializing a compiled routing graph fails.
    #[error("failed to serialize routing graph: {message}")]
    GraphArtifactSerialize { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for GeoJSON parsing errors.
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
}

impl Error {
    /// Classify the error into the configuration/input/resource taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyClassList
            | Error::UnknownVesselClass { .. }
            | Error::UnknownProfile { .. }
            | Error::InvalidRuleConfig { .. }
            | Error::InvalidOption { .. } => ErrorKind::Configuration,
            Error::MalformedCoordinate { .. }
            | Error::UnsnappablePoint { .. }
            | Error::IndexNotBuilt
            | Error::InvalidNetwork { .. } => ErrorKind::Input,
            Error::GraphArtifactLoad { .. }
            | Error::GraphArtifactSerialize { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::GeoJson(_) => ErrorKind::Resource,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Return up to `limit` candidates that closely resemble `name`.
///
/// Candidates are ranked by normalized Levenshtein similarity; anything below
/// 0.5 is discarded.
pub(crate) fn fuzzy_matches<'a, I>(name: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = name.to_lowercase();
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = strsim::normalized_levenshtein(&needle, &candidate.to_lowercase());
            (score, candidate)
        })
        .filter(|(score, _)| *score >= 0.5)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
