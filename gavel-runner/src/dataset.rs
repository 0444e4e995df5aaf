//! Dataset loading.
//!
//! Rows arrive as CSV (column-per-field, extra numeric columns become
//! covariates) or JSON (an array of row objects with an explicit
//! `covariates` map).

use crate::error::{RunnerError, RunnerResult};
use gavel_core::EvalRow;
use std::path::Path;
use tracing::debug;

/// An in-memory collection of evaluation rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Optional display name (defaults to the source file name).
    pub name: Option<String>,
    rows: Vec<EvalRow>,
}

impl Dataset {
    /// Wrap already-built rows.
    pub fn new(rows: Vec<EvalRow>) -> Self {
        Self { name: None, rows }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Load rows from a CSV file.
    ///
    /// Requires `id`, `question` and `answer` columns; `context` is
    /// optional. Any other column whose values parse as numbers becomes a
    /// per-row covariate; non-numeric cells are skipped for that row.
    pub fn from_csv(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| RunnerError::dataset(path, e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| RunnerError::dataset(path, e.to_string()))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let id_col = column("id")
            .ok_or_else(|| RunnerError::dataset(path, "missing required column 'id'"))?;
        let question_col = column("question")
            .ok_or_else(|| RunnerError::dataset(path, "missing required column 'question'"))?;
        let answer_col = column("answer")
            .ok_or_else(|| RunnerError::dataset(path, "missing required column 'answer'"))?;
        let context_col = column("context");

        let reserved = [Some(id_col), Some(question_col), Some(answer_col), context_col];
        let extra_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !reserved.contains(&Some(*i)))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| RunnerError::dataset(path, e.to_string()))?;
            let cell = |i: usize| record.get(i).unwrap_or("").to_string();

            let mut row = EvalRow::new(cell(id_col), cell(question_col), cell(answer_col));
            if let Some(i) = context_col {
                let context = cell(i);
                if !context.is_empty() {
                    row = row.with_context(context);
                }
            }
            for (i, name) in &extra_cols {
                if let Ok(value) = cell(*i).trim().parse::<f64>() {
                    row = row.with_covariate(name.clone(), value);
                }
            }
            rows.push(row);
        }

        debug!(path = %path.display(), rows = rows.len(), "loaded csv dataset");
        Ok(Self::new(rows).with_name(display_name(path)))
    }

    /// Load rows from a JSON array file.
    pub fn from_json(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RunnerError::dataset(path, e.to_string()))?;
        let rows = Self::rows_from_json_str(&content)
            .map_err(|e| RunnerError::dataset(path, e.to_string()))?;

        debug!(path = %path.display(), rows = rows.len(), "loaded json dataset");
        Ok(Self::new(rows).with_name(display_name(path)))
    }

    /// Parse rows from JSON text.
    pub fn rows_from_json_str(content: &str) -> Result<Vec<EvalRow>, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// The rows, in load order.
    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows (quick mode).
    pub fn take(&self, n: usize) -> Self {
        Self {
            name: self.name.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Union of covariate column names across all rows, in first-appearance
    /// order. Used to pre-flight metric templates against the dataset.
    pub fn covariate_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for name in row.covariates.keys() {
                if !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
        }
        columns
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
