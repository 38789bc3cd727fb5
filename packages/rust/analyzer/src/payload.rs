//! Raw analyzer payloads, before normalization.
//!
//! The analyzer has shipped two response shapes. Both carry the same
//! session-level summary; they differ in how issues are described:
//!
//! ```text
//! flat: { "detectedIssues": ["acne", "dark spots"], "severity": "moderate", ... }
//! rich: { "issues": [{ "issueName": "Pustules", "severity": "high",
//!                      "affectedArea": "cheek", "possibleCauses": [..],
//!                      "recommendedSolutions": [..] }], ... }
//! ```
//!
//! The variant is chosen by looking at the issue list itself, never by
//! trusting a version field.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use skinscan_shared::{DailyRoutines, NormalizeError, ProductCategory};

type Result<T> = std::result::Result<T, NormalizeError>;

/// Keys that may hold the issue list, in lookup order.
const ISSUE_KEYS: &[&str] = &["issues", "detectedIssues"];

/// A payload whose shape has been identified.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Issues are plain text labels; severity is session-wide.
    Flat(FlatPayload),
    /// Issues are objects with their own severity, area, causes, and solutions.
    Rich(RichPayload),
}

#[derive(Debug, Clone)]
pub struct FlatPayload {
    pub summary: PayloadSummary,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RichPayload {
    pub summary: PayloadSummary,
    pub issues: Vec<DetailedIssue>,
}

/// Fields shared by both shapes.
#[derive(Debug, Clone, Default)]
pub struct PayloadSummary {
    pub skin_type: Option<String>,
    pub overall_assessment: Option<String>,
    /// Raw session-level severity text, not yet coerced.
    pub severity_overall: Option<String>,
    /// Analyzer-reported issue count.
    pub detection_count: Option<usize>,
    pub skincare_recommendations: Vec<String>,
    pub product_recommendations: BTreeMap<ProductCategory, String>,
    pub daily_routines: Option<DailyRoutines>,
}

/// One issue in the rich shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedIssue {
    #[serde(alias = "title", alias = "name")]
    pub issue_name: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub affected_area: Option<String>,
    #[serde(default)]
    pub possible_causes: Vec<String>,
    #[serde(default, alias = "treatments")]
    pub recommended_solutions: Vec<String>,
}

impl RawPayload {
    /// Identify the payload shape and pull out its fields.
    pub fn parse(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(NormalizeError::malformed("payload is not a JSON object"));
        };

        let summary = PayloadSummary::from_map(&map)?;
        let issues = ISSUE_KEYS
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()));

        match issues {
            None => Ok(Self::Flat(FlatPayload {
                summary,
                issues: Vec::new(),
            })),
            Some(Value::String(joined)) => Ok(Self::Flat(FlatPayload {
                summary,
                issues: split_labels(joined),
            })),
            Some(Value::Array(items)) if items.iter().any(Value::is_object) => {
                let issues = items
                    .iter()
                    .cloned()
                    .map(serde_json::from_value::<DetailedIssue>)
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| NormalizeError::malformed(format!("invalid issue object: {e}")))?;
                Ok(Self::Rich(RichPayload { summary, issues }))
            }
            Some(Value::Array(items)) => {
                let issues = items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            NormalizeError::malformed("issue labels must be strings")
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Flat(FlatPayload { summary, issues }))
            }
            Some(_) => Err(NormalizeError::malformed(
                "issue list must be an array or a string",
            )),
        }
    }

    pub fn summary(&self) -> &PayloadSummary {
        match self {
            Self::Flat(p) => &p.summary,
            Self::Rich(p) => &p.summary,
        }
    }
}

impl PayloadSummary {
    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            skin_type: text(map, &["skinType"])?,
            overall_assessment: text(map, &["overallAssessment", "conditionAssessment"])?,
            severity_overall: text(map, &["severityOverall", "overallSeverity", "severity"])?,
            detection_count: count(map, "detectionCounts")?,
            skincare_recommendations: text_list(map, "skincareRecommendations")?
                .unwrap_or_default(),
            product_recommendations: products(map)?,
            daily_routines: routines(map)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// First present, non-null key among `keys`; must be a string.
fn text(map: &Map<String, Value>, keys: &[&str]) -> Result<Option<String>> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|k| map.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
    else {
        return Ok(None);
    };

    value
        .as_str()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| NormalizeError::malformed(format!("`{key}` must be a string")))
}

fn text_list(map: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => string_array(value, key).map(Some),
    }
}

fn string_array(value: &Value, key: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| NormalizeError::malformed(format!("`{key}` must be an array")))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| NormalizeError::malformed(format!("`{key}` must hold strings")))
        })
        .collect()
}

/// Accepts a JSON integer, an integral float, or a numeric string.
fn count(map: &Map<String, Value>, key: &str) -> Result<Option<usize>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u64)
            })
            .map(|n| Some(n as usize))
            .ok_or_else(|| NormalizeError::malformed(format!("`{key}` must be a non-negative integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| NormalizeError::malformed(format!("`{key}` is not a number: {s:?}"))),
        Some(_) => Err(NormalizeError::malformed(format!("`{key}` must be a number"))),
    }
}

fn products(map: &Map<String, Value>) -> Result<BTreeMap<ProductCategory, String>> {
    let mut out = BTreeMap::new();
    let obj = match map.get("productRecommendations") {
        None | Some(Value::Null) => return Ok(out),
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            return Err(NormalizeError::malformed(
                "`productRecommendations` must be an object",
            ));
        }
    };

    for category in ProductCategory::ALL {
        match obj.get(category.as_str()) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                out.insert(category, s.clone());
            }
            Some(Value::String(_)) | Some(Value::Null) | None => {}
            Some(other) => {
                debug!(category = category.as_str(), value = %other, "ignoring non-text product recommendation");
            }
        }
    }
    Ok(out)
}

fn routines(map: &Map<String, Value>) -> Result<Option<DailyRoutines>> {
    let obj = match map.get("dailyRoutines") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(NormalizeError::malformed("`dailyRoutines` must be an object")),
    };

    let morning = text_list(obj, "morning")?.unwrap_or_default();
    let night = match text_list(obj, "night")? {
        Some(steps) => steps,
        None => text_list(obj, "evening")?.unwrap_or_default(),
    };

    Ok(Some(DailyRoutines { morning, night }))
}

/// Some flat payloads send the issue list as one comma-separated string.
fn split_labels(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_issue_list_is_flat() {
        let raw = RawPayload::parse(json!({
            "skinType": "oily",
            "detectedIssues": ["acne", "blackheads"],
            "severity": "moderate"
        }))
        .unwrap();

        match raw {
            RawPayload::Flat(p) => {
                assert_eq!(p.issues, vec!["acne", "blackheads"]);
                assert_eq!(p.summary.severity_overall.as_deref(), Some("moderate"));
            }
            RawPayload::Rich(_) => panic!("expected flat payload"),
        }
    }

    #[test]
    fn object_issue_list_is_rich() {
        let raw = RawPayload::parse(json!({
            "issues": [{
                "issueName": "Pustules",
                "severity": "high",
                "affectedArea": "cheek",
                "possibleCauses": ["bacteria"],
                "recommendedSolutions": ["benzoyl peroxide"]
            }]
        }))
        .unwrap();

        match raw {
            RawPayload::Rich(p) => {
                assert_eq!(p.issues.len(), 1);
                assert_eq!(p.issues[0].issue_name, "Pustules");
                assert_eq!(p.issues[0].affected_area.as_deref(), Some("cheek"));
                assert_eq!(p.issues[0].recommended_solutions, vec!["benzoyl peroxide"]);
            }
            RawPayload::Flat(_) => panic!("expected rich payload"),
        }
    }

    #[test]
    fn comma_separated_issue_string_is_split() {
        let raw = RawPayload::parse(json!({ "detectedIssues": "acne, dark spot ,, wrinkle" })).unwrap();
        let RawPayload::Flat(p) = raw else {
            panic!("expected flat payload");
        };
        assert_eq!(p.issues, vec!["acne", "dark spot", "wrinkle"]);
    }

    #[test]
    fn missing_issue_list_is_empty_flat() {
        let raw = RawPayload::parse(json!({ "skinType": "dry" })).unwrap();
        let RawPayload::Flat(p) = raw else {
            panic!("expected flat payload");
        };
        assert!(p.issues.is_empty());
    }

    #[test]
    fn summary_aliases_resolve() {
        let raw = RawPayload::parse(json!({
            "conditionAssessment": "Healthy barrier.",
            "overallSeverity": "low",
            "severity": "high",
            "detectionCounts": "2",
            "dailyRoutines": { "morning": ["cleanse"], "evening": ["retinol"] }
        }))
        .unwrap();

        let summary = raw.summary();
        assert_eq!(summary.overall_assessment.as_deref(), Some("Healthy barrier."));
        assert_eq!(summary.severity_overall.as_deref(), Some("low"));
        assert_eq!(summary.detection_count, Some(2));
        let routines = summary.daily_routines.as_ref().unwrap();
        assert_eq!(routines.morning, vec!["cleanse"]);
        assert_eq!(routines.night, vec!["retinol"]);
    }

    #[test]
    fn blank_and_unknown_products_are_dropped() {
        let raw = RawPayload::parse(json!({
            "productRecommendations": {
                "cleanser": "Gentle foam",
                "treatment": "  ",
                "toner": "Rose water",
                "sunscreen": { "name": "SPF50" }
            }
        }))
        .unwrap();

        let products = &raw.summary().product_recommendations;
        assert_eq!(products.len(), 1);
        assert_eq!(products[&ProductCategory::Cleanser], "Gentle foam");
    }

    #[test]
    fn wrong_types_are_malformed() {
        assert!(RawPayload::parse(json!("just text")).is_err());
        assert!(RawPayload::parse(json!({ "issues": 3 })).is_err());
        assert!(RawPayload::parse(json!({ "detectedIssues": ["acne", 4] })).is_err());
        assert!(RawPayload::parse(json!({ "issues": [{ "severity": "high" }] })).is_err());
        assert!(RawPayload::parse(json!({ "skinType": 7 })).is_err());
        assert!(RawPayload::parse(json!({ "skincareRecommendations": "drink water" })).is_err());
    }
}
