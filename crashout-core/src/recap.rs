//! Recap - the "Wrapped" for a journal
//!
//! Aggregates the full history (counts per category and weekday) and asks the
//! generator for a short narrative around those numbers. Recomputed from
//! scratch on every call; nothing is cached.

use chrono::{Datelike, Local, TimeZone, Weekday};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::generator::{parse_json_object, FieldKind, ResponseShape, TextGenerator};
use crate::types::{Category, Entry};

/// Top category when the history is empty.
pub const DEFAULT_TOP_CATEGORY: Category = Category::Other;
/// Second category when fewer than two distinct categories were logged.
pub const DEFAULT_SECOND_CATEGORY: Category = Category::Silly;
/// Most active day when the history is empty.
pub const UNKNOWN_DAY: &str = "Unknown Day";

/// Chaos score used when the generator omits one.
pub const DEFAULT_CHAOS_SCORE: u8 = 88;
/// Chaos score of the local fallback recap.
pub const FALLBACK_CHAOS_SCORE: u8 = 99;
pub const FALLBACK_HEADLINE: &str = "You really did that, huh?";
pub const FALLBACK_CLOSING_LINE: &str = "Your aura is actually terrifying right now.";

/// Deterministic part of a recap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecapAggregates {
    pub total: usize,
    pub top_category: Category,
    pub second_category: Category,
    pub most_active_day: String,
}

/// Full recap: aggregates plus narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecapSummary {
    pub total: usize,
    pub top_category: Category,
    pub second_category: Category,
    pub most_active_day: String,
    /// 0-100
    pub chaos_score: u8,
    pub headline: String,
    pub stat_lines: Vec<String>,
    pub closing_line: String,
}

impl RecapSummary {
    fn from_parts(aggregates: RecapAggregates, narrative: Narrative) -> Self {
        Self {
            total: aggregates.total,
            top_category: aggregates.top_category,
            second_category: aggregates.second_category,
            most_active_day: aggregates.most_active_day,
            chaos_score: narrative.chaos_score,
            headline: narrative.headline,
            stat_lines: narrative.stat_lines,
            closing_line: narrative.closing_line,
        }
    }
}

struct Narrative {
    chaos_score: u8,
    headline: String,
    stat_lines: Vec<String>,
    closing_line: String,
}

impl Narrative {
    fn fallback(total: usize) -> Self {
        Self {
            chaos_score: FALLBACK_CHAOS_SCORE,
            headline: FALLBACK_HEADLINE.to_string(),
            stat_lines: vec![format!("{total} total moments of pure chaos.")],
            closing_line: FALLBACK_CLOSING_LINE.to_string(),
        }
    }
}

/// Get the weekday label used for aggregation.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Count occurrences keeping first-encounter order, then rank by count.
///
/// The sort is stable, so equal counts stay in the order first seen.
fn rank_by_frequency<K: PartialEq>(keys: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Aggregate in the local timezone.
pub fn aggregate(history: &[Entry]) -> RecapAggregates {
    aggregate_in(history, &Local)
}

/// Aggregate with weekdays computed in `tz`.
pub fn aggregate_in<Tz: TimeZone>(history: &[Entry], tz: &Tz) -> RecapAggregates {
    let categories = rank_by_frequency(history.iter().map(|e| e.category));
    let top_category = categories
        .first()
        .map(|(c, _)| *c)
        .unwrap_or(DEFAULT_TOP_CATEGORY);
    let second_category = categories
        .get(1)
        .map(|(c, _)| *c)
        .unwrap_or(DEFAULT_SECOND_CATEGORY);

    let days = rank_by_frequency(history.iter().filter_map(|e| {
        tz.timestamp_millis_opt(e.timestamp)
            .single()
            .map(|dt| day_name(dt.weekday()))
    }));
    let most_active_day = days
        .first()
        .map(|(d, _)| d.to_string())
        .unwrap_or_else(|| UNKNOWN_DAY.to_string());

    RecapAggregates {
        total: history.len(),
        top_category,
        second_category,
        most_active_day,
    }
}

/// Response contract for recap narratives.
pub fn recap_shape() -> ResponseShape {
    ResponseShape::new()
        .field("headline", FieldKind::String)
        .field("stat_lines", FieldKind::StringList)
        .field("closing_line", FieldKind::String)
        .field("chaos_score", FieldKind::Number)
}

fn build_prompt(aggregates: &RecapAggregates) -> String {
    format!(
        r#"Generate a CRASHOUT Wrapped summary for this user data:
- Total crashouts: {}
- Top category: {}
- Second top category: {}
- Most active crashout day: {}

Rules:
- Tone: Fun, slightly dramatic, short sentences, Gen-Z style.
- Format as JSON with: headline, stat_lines, closing_line, and chaos_score (0-100)."#,
        aggregates.total,
        aggregates.top_category,
        aggregates.second_category,
        aggregates.most_active_day
    )
}

fn narrative_from_reply(reply: &serde_json::Map<String, Value>) -> Result<Narrative, Error> {
    let text = |name: &str| -> Result<String, Error> {
        reply
            .get(name)
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| Error::MalformedResponse(format!("missing string field `{name}`")))
    };

    let stat_lines = reply
        .get("stat_lines")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MalformedResponse("missing array field `stat_lines`".to_string()))?
        .iter()
        .filter_map(Value::as_str)
        .map(ToString::to_string)
        .collect();

    let chaos_score = reply
        .get("chaos_score")
        .and_then(Value::as_f64)
        .filter(|n| !n.is_nan())
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(DEFAULT_CHAOS_SCORE);

    Ok(Narrative {
        chaos_score,
        headline: text("headline")?,
        stat_lines,
        closing_line: text("closing_line")?,
    })
}

/// Build a recap for the whole history, in the local timezone.
pub fn summarize(generator: &dyn TextGenerator, history: &[Entry]) -> RecapSummary {
    narrate(generator, aggregate(history))
}

/// Build a recap with weekdays computed in `tz`.
///
/// Makes exactly one generator call. Any failure yields the fixed fallback
/// narrative; the aggregates are the same either way.
pub fn summarize_in<Tz: TimeZone>(
    generator: &dyn TextGenerator,
    history: &[Entry],
    tz: &Tz,
) -> RecapSummary {
    narrate(generator, aggregate_in(history, tz))
}

fn narrate(generator: &dyn TextGenerator, aggregates: RecapAggregates) -> RecapSummary {
    let prompt = build_prompt(&aggregates);

    let narrative = generator
        .generate(&prompt, &recap_shape())
        .and_then(|raw| parse_json_object(&raw))
        .and_then(|reply| narrative_from_reply(&reply));

    let narrative = match narrative {
        Ok(narrative) => narrative,
        Err(Error::GeneratorUnavailable) => {
            tracing::debug!(total = aggregates.total, "Generator offline, using fallback recap");
            Narrative::fallback(aggregates.total)
        }
        Err(e @ Error::MalformedResponse(_)) => {
            tracing::warn!(error = %e, "Unreadable recap reply, using fallback recap");
            Narrative::fallback(aggregates.total)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Recap request failed, using fallback recap");
            Narrative::fallback(aggregates.total)
        }
    };

    RecapSummary::from_parts(aggregates, narrative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::OfflineGenerator;
    use crate::types::Severity;
    use chrono::Utc;

    /// Answers every call with the same scripted outcome.
    struct ScriptedGenerator(std::result::Result<&'static str, &'static str>);

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, _prompt: &str, _shape: &ResponseShape) -> crate::error::Result<String> {
            self.0
                .map(ToString::to_string)
                .map_err(|e| Error::Generator(e.to_string()))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    // 2024-01-01 was a Monday.
    const MONDAY_NOON_MS: i64 = 1_704_110_400_000;
    const DAY_MS: i64 = 86_400_000;

    fn entry(category: Category, timestamp: i64) -> Entry {
        Entry {
            id: format!("{}-{}", category.slug(), timestamp),
            timestamp,
            description: "something happened".to_string(),
            caption: "caption".to_string(),
            category,
            severity: Severity::clamped(5.0),
            reaction: "reaction".to_string(),
        }
    }

    #[test]
    fn test_empty_history_defaults() {
        let aggregates = aggregate_in(&[], &Utc);
        assert_eq!(aggregates.total, 0);
        assert_eq!(aggregates.top_category, Category::Other);
        assert_eq!(aggregates.second_category, Category::Silly);
        assert_eq!(aggregates.second_category.label(), "Silly / Random");
        assert_eq!(aggregates.most_active_day, "Unknown Day");
    }

    #[test]
    fn test_top_category_by_count() {
        let history = vec![
            entry(Category::Family, MONDAY_NOON_MS),
            entry(Category::Academics, MONDAY_NOON_MS + DAY_MS),
            entry(Category::Academics, MONDAY_NOON_MS + 2 * DAY_MS),
        ];
        let aggregates = aggregate_in(&history, &Utc);
        assert_eq!(aggregates.total, 3);
        assert_eq!(aggregates.top_category, Category::Academics);
        assert_eq!(aggregates.second_category, Category::Family);
    }

    #[test]
    fn test_single_category_uses_second_default() {
        let history = vec![entry(Category::Family, MONDAY_NOON_MS)];
        let aggregates = aggregate_in(&history, &Utc);
        assert_eq!(aggregates.top_category, Category::Family);
        assert_eq!(aggregates.second_category, Category::Silly);
        assert_eq!(aggregates.most_active_day, "Monday");
    }

    #[test]
    fn test_ties_resolve_by_first_encounter() {
        let history = vec![
            entry(Category::Stress, MONDAY_NOON_MS + DAY_MS),
            entry(Category::Academics, MONDAY_NOON_MS),
            entry(Category::Academics, MONDAY_NOON_MS + DAY_MS),
            entry(Category::Stress, MONDAY_NOON_MS),
        ];
        let aggregates = aggregate_in(&history, &Utc);
        assert_eq!(aggregates.top_category, Category::Stress);
        assert_eq!(aggregates.second_category, Category::Academics);
        // Tuesday seen first, both days twice.
        assert_eq!(aggregates.most_active_day, "Tuesday");
    }

    #[test]
    fn test_fallback_recap() {
        let history = vec![
            entry(Category::Other, MONDAY_NOON_MS),
            entry(Category::Other, MONDAY_NOON_MS),
        ];
        let recap = summarize_in(&OfflineGenerator, &history, &Utc);
        assert_eq!(recap.chaos_score, 99);
        assert_eq!(recap.headline, "You really did that, huh?");
        assert_eq!(recap.stat_lines, vec!["2 total moments of pure chaos."]);
        assert_eq!(recap.closing_line, FALLBACK_CLOSING_LINE);
    }

    #[test]
    fn test_offline_recap_is_idempotent() {
        let history = vec![entry(Category::Family, MONDAY_NOON_MS)];
        let first = summarize_in(&OfflineGenerator, &history, &Utc);
        let second = summarize_in(&OfflineGenerator, &history, &Utc);
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_call_uses_fallback() {
        let history = vec![entry(Category::Stress, MONDAY_NOON_MS)];
        let recap = summarize_in(&ScriptedGenerator(Err("503 unavailable")), &history, &Utc);
        assert_eq!(recap.chaos_score, FALLBACK_CHAOS_SCORE);
        assert_eq!(recap.headline, FALLBACK_HEADLINE);
        assert_eq!(recap.stat_lines, vec!["1 total moments of pure chaos."]);
        assert_eq!(recap.closing_line, FALLBACK_CLOSING_LINE);
        assert_eq!(recap.top_category, Category::Stress);
        assert_eq!(recap.most_active_day, "Monday");
    }

    #[test]
    fn test_reply_missing_text_field_uses_fallback() {
        let generator = ScriptedGenerator(Ok(
            r#"{"stat_lines":["one"],"closing_line":"bye","chaos_score":40}"#,
        ));
        let recap = summarize_in(&generator, &[], &Utc);
        assert_eq!(recap.chaos_score, FALLBACK_CHAOS_SCORE);
        assert_eq!(recap.headline, FALLBACK_HEADLINE);
        assert_eq!(recap.stat_lines, vec!["0 total moments of pure chaos."]);
    }

    #[test]
    fn test_reply_without_score_defaults() {
        let generator = ScriptedGenerator(Ok(
            r#"{"headline":"Lore drop","stat_lines":["a","b"],"closing_line":"bye"}"#,
        ));
        let recap = summarize_in(&generator, &[], &Utc);
        assert_eq!(recap.chaos_score, DEFAULT_CHAOS_SCORE);
        assert_eq!(recap.headline, "Lore drop");
        assert_eq!(recap.stat_lines, vec!["a", "b"]);
        assert_eq!(recap.closing_line, "bye");
    }

    #[test]
    fn test_reply_score_is_clamped() {
        let generator = ScriptedGenerator(Ok(
            r#"{"headline":"h","stat_lines":[],"closing_line":"c","chaos_score":180.4}"#,
        ));
        assert_eq!(summarize_in(&generator, &[], &Utc).chaos_score, 100);
    }

    #[test]
    fn test_local_summary_matches_local_aggregates() {
        let history = vec![entry(Category::Family, MONDAY_NOON_MS)];
        let recap = summarize(&OfflineGenerator, &history);
        let aggregates = aggregate(&history);
        assert_eq!(recap.total, aggregates.total);
        assert_eq!(recap.most_active_day, aggregates.most_active_day);
    }

    #[test]
    fn test_day_name() {
        assert_eq!(day_name(Weekday::Sun), "Sunday");
        assert_eq!(day_name(Weekday::Wed), "Wednesday");
    }
}
