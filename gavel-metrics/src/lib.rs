//! # gavel-metrics
//!
//! Declarative metric definitions for the gavel evaluation harness:
//!
//! - [`MetricSpec`]: one YAML-declared rubric (prompt templates + parser rule)
//! - [`MetricRegistry`]: loads and indexes a directory of specs
//! - [`PromptTemplate`]: validated `{placeholder}` format strings
//! - [`parse`]: score / revision / confidence extraction from grader text
//!
//! A registry is loaded once at startup and is read-only afterwards;
//! concurrent evaluation tasks share it freely.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod parse;
pub mod registry;
pub mod spec;
pub mod template;

pub use error::{MetricsResult, ParseError, RegistryError, RenderError, TemplateError};
pub use parse::{parse_confidence, parse_revision, parse_score, Revision};
pub use registry::{LoadFailure, MetricRegistry};
pub use spec::{MetricSpec, ScoreRule};
pub use template::{PromptTemplate, RenderContext};
