//! Prompt templates with named placeholders.
//!
//! Templates use `{name}` placeholders resolved against a row plus
//! phase-specific extras at render time; `{{` and `}}` escape literal
//! braces. Syntax is validated when a spec is loaded, so rendering can only
//! fail on an unresolvable placeholder.

use crate::error::{RenderError, TemplateError};
use gavel_core::EvalRow;
use std::borrow::Cow;
use std::collections::HashMap;

/// A parsed format string with a known placeholder set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    raw: String,
    segments: Vec<Segment>,
    placeholders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

impl PromptTemplate {
    /// Parse and validate a template.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TemplateError> {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut placeholders = Vec::new();
        let mut literal = String::new();

        let bytes = raw.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    literal.push('{');
                    i += 2;
                }
                b'}' if bytes.get(i + 1) == Some(&b'}') => {
                    literal.push('}');
                    i += 2;
                }
                b'{' => {
                    let close = raw[i + 1..]
                        .find('}')
                        .map(|off| i + 1 + off)
                        .ok_or(TemplateError::UnbalancedOpen(i))?;
                    let name = &raw[i + 1..close];
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(i));
                    }
                    if !is_valid_name(name) {
                        return Err(TemplateError::InvalidName(name.to_string()));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                    if !placeholders.iter().any(|p| p == name) {
                        placeholders.push(name.to_string());
                    }
                    i = close + 1;
                }
                b'}' => return Err(TemplateError::UnbalancedClose(i)),
                _ => {
                    // advance over the full UTF-8 character
                    let ch = raw[i..].chars().next().unwrap_or('\u{fffd}');
                    literal.push(ch);
                    i += ch.len_utf8();
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw,
            segments,
            placeholders,
        })
    }

    /// The template text as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Distinct placeholder names, in first-appearance order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Render against a context.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = ctx.resolve(name).ok_or_else(|| RenderError {
                        placeholder: name.clone(),
                        row_id: ctx.row.id.clone(),
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolution scope for a render: a row plus phase extras.
///
/// Extras win over row fields, so a reflection pass can inject `score`
/// without colliding with dataset columns.
#[derive(Debug)]
pub struct RenderContext<'a> {
    row: &'a EvalRow,
    extras: HashMap<&'static str, String>,
}

impl<'a> RenderContext<'a> {
    /// Context over a bare row.
    pub fn new(row: &'a EvalRow) -> Self {
        Self {
            row,
            extras: HashMap::new(),
        }
    }

    /// Add a phase extra (e.g. the prior score for reflection prompts).
    #[must_use]
    pub fn with_extra(mut self, name: &'static str, value: impl ToString) -> Self {
        self.extras.insert(name, value.to_string());
        self
    }

    fn resolve(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = self.extras.get(name) {
            return Some(Cow::Borrowed(value.as_str()));
        }
        self.row.field(name)
    }
}
