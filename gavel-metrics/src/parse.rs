//! Score extraction from free-text grader output.
//!
//! Graders are asked for a bare number but rarely oblige. The fallback chain
//! is fixed: an explicit pattern first, then the first standalone number in
//! the accepted range anywhere in the text. A text with no usable number is
//! a [`ParseError`] and the record field stays absent, never zero.

use crate::error::ParseError;
use crate::spec::ScoreRule;
use regex::Regex;
use std::sync::OnceLock;

/// Upper bound for scores.
const SCORE_MAX: u32 = 10;
/// Upper bound for self-reported confidence.
const CONFIDENCE_MAX: u32 = 100;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").unwrap())
}

fn revised_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)revised score:\s*(\d+(?:\.\d+)?)").unwrap())
}

/// A parsed self-reflection response.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// The revised score.
    pub score: f64,
    /// Everything the grader said besides the score line.
    pub critique: String,
}

/// Extract the initial score from grader text using the metric's rule.
pub fn parse_score(text: &str, rule: &ScoreRule) -> Result<f64, ParseError> {
    match rule {
        ScoreRule::Number => first_number_in_range(text, SCORE_MAX)
            .ok_or(ParseError::NoNumber { max: SCORE_MAX }),
        ScoreRule::Pattern(re) => {
            let caps = re
                .captures(text)
                .ok_or_else(|| ParseError::PatternMiss(re.as_str().to_string()))?;
            let capture = caps
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or_else(|| caps.get(0).map(|m| m.as_str()).unwrap_or(""));
            capture
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseError::BadCapture(capture.to_string()))
        }
    }
}

/// Extract a revised score and critique from a self-reflection response.
///
/// Ordered, first match wins:
/// 1. a literal `Revised score:` followed by a number; the critique is the
///    text with that match removed;
/// 2. the first standalone number in [0,10]; the full text is the critique;
/// 3. otherwise a [`ParseError`].
pub fn parse_revision(text: &str) -> Result<Revision, ParseError> {
    if let Some(caps) = revised_re().captures(text) {
        let full = caps.get(0).expect("capture 0 always present");
        let score: f64 = caps[1].parse().map_err(|_| {
            ParseError::BadCapture(caps[1].to_string())
        })?;
        let mut critique = String::with_capacity(text.len() - full.len());
        critique.push_str(&text[..full.start()]);
        critique.push_str(&text[full.end()..]);
        return Ok(Revision {
            score,
            critique: critique.trim().to_string(),
        });
    }

    first_number_in_range(text, SCORE_MAX)
        .map(|score| Revision {
            score,
            critique: text.trim().to_string(),
        })
        .ok_or(ParseError::NoNumber { max: SCORE_MAX })
}

/// Extract a self-reported confidence level in [0,100].
pub fn parse_confidence(text: &str) -> Result<f64, ParseError> {
    first_number_in_range(text, CONFIDENCE_MAX)
        .ok_or(ParseError::NoNumber { max: CONFIDENCE_MAX })
}

/// First number in the text whose value lies in [0, max].
///
/// Known false-positive risk: unrelated in-range numbers (a context quoting
/// "Section 10") will match. The behavior is intentional; callers fall back
/// here only after the explicit pattern failed.
fn first_number_in_range(text: &str, max: u32) -> Option<f64> {
    number_re()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .find(|v| *v <= max as f64)
}
