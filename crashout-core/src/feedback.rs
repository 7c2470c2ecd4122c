//! Reaction and severity for a freshly logged entry.
//!
//! [`evaluate`] never fails. Every failure path degrades to a local answer:
//!
//! | Branch | Reaction | Severity |
//! |--------|----------|----------|
//! | offline generator | per-category table | random 1-10 |
//! | remote call failed | per-category table | random 1-10 |
//! | reply not a JSON object | [`GENERIC_REACTION`] | 5 |
//! | reply parsed | `reaction` field, else [`GENERIC_REACTION`] | `severity` clamped, else 5 |

use crate::error::Error;
use crate::generator::{parse_json_object, FieldKind, ResponseShape, TextGenerator};
use crate::types::{Category, Severity};
use rand::Rng;
use serde_json::Value;

/// Reaction used when a reply is unreadable or lacks a reaction.
pub const GENERIC_REACTION: &str = "The chaos is palpable.";

/// Reaction for categories outside the local table.
const DEFAULT_REACTION: &str = "The chaos is off the charts.";

/// Severity used when a reply is unreadable or lacks a number.
pub const DEFAULT_SEVERITY: u8 = 5;

/// Where a [`Feedback`] came from. For logs and diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSource {
    /// Parsed from the generator reply
    Remote,
    /// No credential; local table
    Offline,
    /// Reply could not be parsed; generic reaction
    Malformed,
    /// Generator call failed; local table
    RemoteFailed,
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub reaction: String,
    pub severity: Severity,
    pub source: FeedbackSource,
}

const LOCAL_REACTIONS: &[(Category, &str)] = &[
    (Category::Academics, "The library is closed, but the tears are forever."),
    (Category::LoveLife, "It's giving \"situationship\" energy."),
    (Category::AnnoyingPeople, "The audacity is actually impressive."),
    (Category::Family, "Family drama? Groundbreaking."),
    (Category::Stress, "Brain is currently buffering..."),
    (Category::Silly, "The chaos is unmatched, honestly."),
    (Category::Other, "The vibes are... not vibing."),
];

/// Fixed reaction for a category, [`DEFAULT_REACTION`] when it has no row.
pub fn local_reaction(category: Category) -> &'static str {
    LOCAL_REACTIONS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, reaction)| *reaction)
        .unwrap_or(DEFAULT_REACTION)
}

/// Local table answer with a uniformly random severity.
pub fn local_fallback(category: Category, source: FeedbackSource) -> Feedback {
    let severity = rand::thread_rng().gen_range(Severity::MIN..=Severity::MAX);
    Feedback {
        reaction: local_reaction(category).to_string(),
        severity: Severity::clamped(severity as f64),
        source,
    }
}

/// Response contract for reaction requests.
pub fn feedback_shape() -> ResponseShape {
    ResponseShape::new()
        .field("reaction", FieldKind::String)
        .field("severity", FieldKind::Number)
}

fn build_prompt(description: &str, category: Category) -> String {
    format!(
        r#"The user just logged a crashout in the category "{category}".
Description: "{description}"

Your job as the "CRASHOUT Brain" is to:
1. Provide a funny, Gen-Z friendly, slightly dramatic quote about this situation. (e.g. "It's giving main character syndrome")
2. Rate the drama level from 1 to 10.

Rules:
- Keep it fun and chaotic.
- No medical or mental health advice.
- Max 10 words for the quote.

Return JSON with fields "reaction" (the quote) and "severity" (the drama level)."#
    )
}

/// Produce a reaction and severity for one entry.
///
/// The caller rejects empty descriptions before calling. Exactly one
/// generator call is made.
pub fn evaluate(generator: &dyn TextGenerator, description: &str, category: Category) -> Feedback {
    let prompt = build_prompt(description, category);

    let raw = match generator.generate(&prompt, &feedback_shape()) {
        Ok(raw) => raw,
        Err(Error::GeneratorUnavailable) => {
            tracing::debug!(%category, "Generator offline, using local reaction");
            return local_fallback(category, FeedbackSource::Offline);
        }
        Err(e) => {
            tracing::warn!(%category, error = %e, "Feedback request failed, using local reaction");
            return local_fallback(category, FeedbackSource::RemoteFailed);
        }
    };

    match parse_json_object(&raw) {
        Ok(reply) => {
            let feedback = from_reply(&reply);
            tracing::debug!(
                %category,
                severity = feedback.severity.get(),
                "Feedback from generator"
            );
            feedback
        }
        Err(e) => {
            tracing::warn!(%category, error = %e, "Unreadable feedback reply, using generic reaction");
            Feedback {
                reaction: GENERIC_REACTION.to_string(),
                severity: Severity::clamped(DEFAULT_SEVERITY as f64),
                source: FeedbackSource::Malformed,
            }
        }
    }
}

fn from_reply(reply: &serde_json::Map<String, Value>) -> Feedback {
    let reaction = reply
        .get("reaction")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(GENERIC_REACTION);
    let severity = reply
        .get("severity")
        .and_then(Value::as_f64)
        .map(Severity::clamped)
        .unwrap_or_else(|| Severity::clamped(DEFAULT_SEVERITY as f64));

    Feedback {
        reaction: reaction.to_string(),
        severity,
        source: FeedbackSource::Remote,
    }
}
