//! Dataset rows under evaluation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One dataset record: an identified question/answer pair with optional
/// context and precomputed numeric covariates.
///
/// Rows are immutable once loaded; the orchestrator only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRow {
    /// Row identifier, unique within a dataset.
    pub id: String,
    /// The question posed to the model under evaluation.
    pub question: String,
    /// The model answer being graded.
    pub answer: String,
    /// Optional supporting context.
    #[serde(default)]
    pub context: Option<String>,
    /// Precomputed numeric covariates (e.g. `dp_diff`, `calib_gap`)
    /// referenced by metric templates.
    #[serde(default)]
    pub covariates: IndexMap<String, f64>,
}

impl EvalRow {
    /// Create a row with the required fields.
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            context: None,
            covariates: IndexMap::new(),
        }
    }

    /// Set the context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a covariate.
    #[must_use]
    pub fn with_covariate(mut self, name: impl Into<String>, value: f64) -> Self {
        self.covariates.insert(name.into(), value);
        self
    }

    /// Resolve a named template placeholder against this row.
    ///
    /// Row fields win over covariates of the same name. Returns `None` for
    /// unknown names and for `context` when the row carries none.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "question" => Some(Cow::Borrowed(self.question.as_str())),
            "answer" => Some(Cow::Borrowed(self.answer.as_str())),
            "context" => self.context.as_deref().map(Cow::Borrowed),
            _ => self
                .covariates
                .get(name)
                .map(|v| Cow::Owned(format_covariate(*v))),
        }
    }

    /// Names that resolve on this row: builtin fields plus covariates.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = vec!["id", "question", "answer"];
        if self.context.is_some() {
            names.push("context");
        }
        names.extend(self.covariates.keys().map(String::as_str));
        names
    }
}

/// Format a covariate for prompt interpolation (no trailing `.0` noise).
fn format_covariate(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
