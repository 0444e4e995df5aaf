//! Metric and registry errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a metric registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry directory does not exist or cannot be read.
    #[error("metrics directory '{path}': {source}")]
    Directory {
        /// Offending path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A spec file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A spec file is not valid YAML or fails schema validation.
    #[error("invalid metric spec '{path}': {message}")]
    InvalidSpec {
        /// Offending file.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// A parser rule names an unknown kind.
    #[error("unknown parser rule '{rule}' in metric '{metric}'")]
    UnknownParser {
        /// The rule as written.
        rule: String,
        /// Metric carrying it.
        metric: String,
    },

    /// A prompt template fails syntax validation.
    #[error("bad template in metric '{metric}': {source}")]
    Template {
        /// Metric carrying the template.
        metric: String,
        /// Underlying template error.
        source: TemplateError,
    },

    /// Two files declare the same metric name. Fatal for the whole load.
    #[error("duplicate metric name '{name}' in '{first}' and '{second}'")]
    DuplicateName {
        /// The shadowed name.
        name: String,
        /// First file declaring it.
        first: PathBuf,
        /// Second file declaring it.
        second: PathBuf,
    },

    /// A template references a placeholder no dataset column can satisfy.
    #[error("metric '{metric}' references unresolvable placeholder '{placeholder}'")]
    UnresolvablePlaceholder {
        /// Metric carrying the template.
        metric: String,
        /// The placeholder name.
        placeholder: String,
    },
}

/// Template syntax errors, caught at registry load time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{` without a matching `}`.
    #[error("unbalanced '{{' at byte {0}")]
    UnbalancedOpen(usize),

    /// A `}` without a matching `{`.
    #[error("unbalanced '}}' at byte {0}")]
    UnbalancedClose(usize),

    /// `{}` with no placeholder name.
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    /// A placeholder name containing invalid characters.
    #[error("invalid placeholder name '{0}'")]
    InvalidName(String),
}

/// A placeholder could not be resolved at render time.
///
/// Isolated to the (row, metric) pair; never aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("placeholder '{placeholder}' not resolvable for row '{row_id}'")]
pub struct RenderError {
    /// The unresolvable placeholder.
    pub placeholder: String,
    /// The row being rendered.
    pub row_id: String,
}

/// Grader text did not yield a usable number.
///
/// The corresponding record field is left absent; zero is a valid score and
/// is never used as a fallback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The configured pattern rule did not match.
    #[error("pattern '{0}' did not match grader text")]
    PatternMiss(String),

    /// A pattern matched but its capture is not a number.
    #[error("capture '{0}' is not a number")]
    BadCapture(String),

    /// No standalone number in the accepted range was found.
    #[error("no number in [0,{max}] found in grader text")]
    NoNumber {
        /// Upper bound of the accepted range.
        max: u32,
    },
}

/// Result alias for registry operations.
pub type MetricsResult<T> = Result<T, RegistryError>;
