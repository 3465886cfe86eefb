// Typed narrative results and tolerant parsing of model output.
//
// The model is asked to answer with bare JSON, but it sometimes wraps the
// object in a Markdown fence or a sentence of prose, and it drifts between
// snake_case and camelCase keys. Parsing extracts the outermost JSON value,
// unwraps the expected top-level key, then lets serde check the shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ResultError {
    #[error("response did not contain a JSON object")]
    NoJson,

    #[error("response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response JSON had an unexpected shape: {0}")]
    Shape(String),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysisResult {
    pub score: f64,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMatch {
    #[serde(rename = "match", alias = "fixture")]
    pub fixture: String,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedStanding {
    pub rank: u32,
    #[serde(alias = "teamName")]
    pub team_name: String,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckAnalysis {
    #[serde(alias = "teamName")]
    pub team_name: String,
    #[serde(alias = "luckScore")]
    pub luck_score: f64,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpAnalysisResult {
    #[serde(alias = "predictedWinner")]
    pub predicted_winner: String,
    #[serde(alias = "team1Name")]
    pub team1_name: String,
    #[serde(alias = "team2Name")]
    pub team2_name: String,
    #[serde(alias = "team1PredictedScore")]
    pub team1_predicted_score: f64,
    #[serde(alias = "team2PredictedScore")]
    pub team2_predicted_score: f64,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertStrategy {
    #[serde(alias = "sourceName")]
    pub source_name: String,
    #[serde(alias = "keyTakeaways", default)]
    pub key_takeaways: Vec<String>,
    #[serde(alias = "strategySummary")]
    pub strategy_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    #[serde(alias = "url")]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoutResult {
    #[serde(default)]
    pub strategies: Vec<ExpertStrategy>,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

/// Slice out the outermost JSON object or array in `text`, skipping any
/// code fence or surrounding prose.
///
/// Every `{` or `[` is tried as a start; the longest span that parses as a
/// complete value wins, so bracketed prose such as Markdown links is
/// skipped. When nothing parses, the span from the first opener to its last
/// closer is returned so the caller reports the JSON error.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut covered = 0;
    for (start, _) in text.match_indices(['{', '[']) {
        if start < covered {
            continue;
        }
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(_)) = values.next() {
            let end = start + values.byte_offset();
            covered = end;
            if best.map_or(true, |b| end - start > b.len()) {
                best = Some(&text[start..end]);
            }
        }
    }
    best.or_else(|| opener_to_closer(text))
}

fn opener_to_closer(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn parse_value(text: &str) -> Result<Value, ResultError> {
    let json = extract_json(text).ok_or(ResultError::NoJson)?;
    Ok(serde_json::from_str(json)?)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ResultError> {
    serde_json::from_value(value).map_err(|e| ResultError::Shape(e.to_string()))
}

/// Pull a list out from under one of `keys`, or accept a bare array.
fn unwrap_list(value: Value, keys: &[&str]) -> Result<Value, ResultError> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => keys
            .iter()
            .find_map(|k| map.remove(*k))
            .ok_or_else(|| ResultError::Shape(format!("expected one of the keys {keys:?}"))),
        other => Err(ResultError::Shape(format!(
            "expected an object or array, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn check_finite(field: &str, n: f64) -> Result<(), ResultError> {
    if n.is_finite() {
        Ok(())
    } else {
        Err(ResultError::Shape(format!("`{field}` is not a finite number")))
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

pub fn parse_team_strength(text: &str) -> Result<AiAnalysisResult, ResultError> {
    let result: AiAnalysisResult = from_value(parse_value(text)?)?;
    check_finite("score", result.score)?;
    Ok(result)
}

pub fn parse_key_matches(text: &str) -> Result<Vec<KeyMatch>, ResultError> {
    from_value(unwrap_list(parse_value(text)?, &["key_matches", "keyMatches"])?)
}

/// Predictions ordered by rank.
pub fn parse_predictions(text: &str) -> Result<Vec<PredictedStanding>, ResultError> {
    let mut standings: Vec<PredictedStanding> = from_value(unwrap_list(
        parse_value(text)?,
        &["predicted_standings", "predictedStandings"],
    )?)?;
    standings.sort_by_key(|s| s.rank);
    Ok(standings)
}

/// Luck scores, luckiest first.
pub fn parse_luck(text: &str) -> Result<Vec<LuckAnalysis>, ResultError> {
    let mut luck: Vec<LuckAnalysis> = from_value(unwrap_list(
        parse_value(text)?,
        &["luck_analysis", "luckAnalysis"],
    )?)?;
    for l in &luck {
        check_finite("luck_score", l.luck_score)?;
    }
    luck.sort_by(|a, b| b.luck_score.total_cmp(&a.luck_score));
    Ok(luck)
}

pub fn parse_pvp(text: &str) -> Result<PvpAnalysisResult, ResultError> {
    let result: PvpAnalysisResult = from_value(parse_value(text)?)?;
    check_finite("team1_predicted_score", result.team1_predicted_score)?;
    check_finite("team2_predicted_score", result.team2_predicted_score)?;
    Ok(result)
}

/// Scout strategies with sources merged from search citations and the JSON
/// body, deduplicated by URI in first-seen order.
pub fn parse_scout(text: &str, citations: &[GroundingSource]) -> Result<ScoutResult, ResultError> {
    let parsed: ScoutResult = from_value(parse_value(text)?)?;
    let mut sources: Vec<GroundingSource> = Vec::new();
    for source in citations.iter().cloned().chain(parsed.sources) {
        if source.uri.is_empty() || sources.iter().any(|s| s.uri == source.uri) {
            continue;
        }
        sources.push(source);
    }
    Ok(ScoutResult {
        strategies: parsed.strategies,
        sources,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
