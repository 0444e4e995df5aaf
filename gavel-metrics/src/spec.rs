//! Metric specifications.

use crate::error::{RegistryError, TemplateError};
use crate::template::PromptTemplate;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// How a score is extracted from grader text.
#[derive(Debug, Clone)]
pub enum ScoreRule {
    /// Canonical extractor: first standalone number in [0,10].
    Number,
    /// Regex with one capture group holding the score.
    Pattern(Regex),
}

impl ScoreRule {
    /// Compile a pattern rule, requiring a capture group.
    pub fn pattern(pattern: &str) -> Result<Self, String> {
        let re = Regex::new(pattern).map_err(|e| e.to_string())?;
        if re.captures_len() < 2 {
            return Err(format!("pattern '{pattern}' has no capture group"));
        }
        Ok(Self::Pattern(re))
    }

    /// Parse the rule syntax used in spec files: `number` or `regex:<pattern>`.
    pub fn from_rule_str(rule: &str) -> Option<Result<Self, String>> {
        let rule = rule.trim();
        if rule == "number" {
            Some(Ok(Self::Number))
        } else {
            rule.strip_prefix("regex:").map(Self::pattern)
        }
    }
}

/// The on-disk YAML schema, one metric per file. All fields required.
#[derive(Debug, Clone, Deserialize)]
struct RawMetricSpec {
    name: String,
    description: String,
    prompt_template: String,
    parser: String,
    rai_category: String,
    reflection_prompt: String,
    confidence_prompt: String,
}

/// An immutable metric definition.
///
/// Loaded from YAML, validated once, then shared read-only for the run.
#[derive(Debug, Clone)]
pub struct MetricSpec {
    /// Unique metric name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Responsible-AI classification tag, used only for reporting.
    pub rai_category: String,
    /// Scoring prompt.
    pub prompt: PromptTemplate,
    /// Score extraction rule.
    pub parser: ScoreRule,
    /// Self-reflection prompt; `None` disables the phase for this metric.
    pub reflection: Option<PromptTemplate>,
    /// Confidence prompt; `None` disables the phase for this metric.
    pub confidence: Option<PromptTemplate>,
}

impl MetricSpec {
    /// Parse and validate a spec from YAML text.
    ///
    /// `path` is only used in error messages.
    pub fn from_yaml_str(yaml: &str, path: &Path) -> Result<Self, RegistryError> {
        let raw: RawMetricSpec =
            serde_yaml::from_str(yaml).map_err(|e| RegistryError::InvalidSpec {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_raw(raw, path)
    }

    /// Load a spec from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    fn from_raw(raw: RawMetricSpec, path: &Path) -> Result<Self, RegistryError> {
        if raw.name.trim().is_empty() {
            return Err(RegistryError::InvalidSpec {
                path: path.to_path_buf(),
                message: "metric name must not be empty".to_string(),
            });
        }

        let parser = ScoreRule::from_rule_str(&raw.parser)
            .ok_or_else(|| RegistryError::UnknownParser {
                rule: raw.parser.clone(),
                metric: raw.name.clone(),
            })?
            .map_err(|message| RegistryError::InvalidSpec {
                path: path.to_path_buf(),
                message,
            })?;

        let template = |text: &str| -> Result<PromptTemplate, RegistryError> {
            PromptTemplate::parse(text).map_err(|source| RegistryError::Template {
                metric: raw.name.clone(),
                source,
            })
        };

        let prompt = template(&raw.prompt_template)?;
        // Empty reflection/confidence prompts disable those phases.
        let reflection = optional_template(&raw.reflection_prompt, &template)?;
        let confidence = optional_template(&raw.confidence_prompt, &template)?;

        Ok(Self {
            name: raw.name,
            description: raw.description,
            rai_category: raw.rai_category,
            prompt,
            parser,
            reflection,
            confidence,
        })
    }

    /// All placeholders used by any of this metric's templates, minus the
    /// phase extras the orchestrator always supplies.
    pub fn required_placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for tpl in self.templates() {
            // `score` is injected by the reflection/confidence phases
            for name in tpl.placeholders() {
                if name != "score" && !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    fn templates(&self) -> impl Iterator<Item = &PromptTemplate> {
        std::iter::once(&self.prompt)
            .chain(self.reflection.as_ref())
            .chain(self.confidence.as_ref())
    }
}

fn optional_template<F>(text: &str, parse: &F) -> Result<Option<PromptTemplate>, RegistryError>
where
    F: Fn(&str) -> Result<PromptTemplate, RegistryError>,
{
    if text.trim().is_empty() {
        Ok(None)
    } else {
        parse(text).map(Some)
    }
}
