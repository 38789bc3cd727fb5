//! Core domain types: the upload input, the stored-object descriptor, and the
//! canonical analysis result every presentation view renders from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one upload/analysis attempt (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SourceFile / StoredObject
// ---------------------------------------------------------------------------

/// A file picked or dropped by the user, before validation.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Original file name, used for the stored object's extension.
    pub name: String,
    /// Declared media type, e.g. `image/jpeg`.
    pub media_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where a published image lives. The public address is the only identifier
/// the rest of the pipeline needs; the storage ids travel to the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Storage-assigned object id.
    pub storage_id: String,
    /// Key inside the bucket, e.g. `uploads/1718000000000-k3j9x2.jpg`.
    pub storage_path: String,
    /// Bucket-qualified key, e.g. `skin_image/uploads/...`.
    pub full_path: String,
    /// Publicly dereferenceable URL, used for preview and analysis.
    pub public_address: String,
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Canonical three-level severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Map any analyzer severity vocabulary onto the canonical scale.
    ///
    /// Case-insensitive and whitespace-trimmed. Unknown or empty text maps to
    /// [`Severity::Severe`] so an unrecognized value is never downgraded.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" | "mild" | "slight" => Self::Mild,
            "medium" | "moderate" => Self::Moderate,
            _ => Self::Severe,
        }
    }

    /// Coerce an optional value, treating absence as `moderate`.
    pub fn coerce_or_moderate(raw: Option<&str>) -> Self {
        Self::coerce(raw.unwrap_or("moderate"))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Product recommendation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Cleanser,
    Treatment,
    Moisturizer,
    Sunscreen,
}

impl ProductCategory {
    /// All categories in display order.
    pub const ALL: [ProductCategory; 4] = [
        Self::Cleanser,
        Self::Treatment,
        Self::Moisturizer,
        Self::Sunscreen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cleanser => "cleanser",
            Self::Treatment => "treatment",
            Self::Moisturizer => "moisturizer",
            Self::Sunscreen => "sunscreen",
        }
    }
}

/// One detected skin problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub possible_causes: Vec<String>,
    pub treatments: Vec<String>,
}

/// Morning and night care steps, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRoutines {
    pub morning: Vec<String>,
    pub night: Vec<String>,
}

/// The canonical, analyzer-independent skin report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub skin_type: String,
    pub overall_assessment: String,
    /// In the analyzer's reported order.
    pub issues: Vec<Issue>,
    pub severity_overall: Severity,
    pub skincare_recommendations: Vec<String>,
    /// Only categories the analyzer actually filled in.
    pub product_recommendations: BTreeMap<ProductCategory, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_routines: Option<DailyRoutines>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_coercion_is_total() {
        assert_eq!(Severity::coerce("low"), Severity::Mild);
        assert_eq!(Severity::coerce("slight"), Severity::Mild);
        assert_eq!(Severity::coerce("  MILD "), Severity::Mild);
        assert_eq!(Severity::coerce("medium"), Severity::Moderate);
        assert_eq!(Severity::coerce("Moderate"), Severity::Moderate);
        assert_eq!(Severity::coerce("high"), Severity::Severe);
        assert_eq!(Severity::coerce("severe"), Severity::Severe);
        assert_eq!(Severity::coerce("quite bad actually"), Severity::Severe);
        assert_eq!(Severity::coerce(""), Severity::Severe);
    }

    #[test]
    fn severity_coercion_is_idempotent() {
        for s in [Severity::Mild, Severity::Moderate, Severity::Severe] {
            assert_eq!(Severity::coerce(s.as_str()), s);
        }
    }

    #[test]
    fn absent_severity_falls_back_to_moderate() {
        assert_eq!(Severity::coerce_or_moderate(None), Severity::Moderate);
        assert_eq!(Severity::coerce_or_moderate(Some("low")), Severity::Mild);
    }

    #[test]
    fn analysis_result_serializes_camel_case() {
        let mut products = BTreeMap::new();
        products.insert(ProductCategory::Sunscreen, "SPF 50 gel".to_string());

        let result = AnalysisResult {
            skin_type: "oily".into(),
            overall_assessment: "Mild congestion on the T-zone.".into(),
            issues: vec![Issue {
                title: "acne".into(),
                severity: Severity::Mild,
                description: "small papules".into(),
                possible_causes: vec![],
                treatments: vec![],
            }],
            severity_overall: Severity::Mild,
            skincare_recommendations: vec!["Cleanse twice daily".into()],
            product_recommendations: products,
            daily_routines: None,
        };

        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["skinType"], "oily");
        assert_eq!(json["severityOverall"], "mild");
        assert_eq!(json["issues"][0]["possibleCauses"], serde_json::json!([]));
        assert_eq!(json["productRecommendations"]["sunscreen"], "SPF 50 gel");
        assert!(json.get("dailyRoutines").is_none());
    }

    #[test]
    fn source_file_debug_hides_bytes() {
        let file = SourceFile::new("face.png", "image/png", vec![0u8; 2048]);
        let dbg = format!("{file:?}");
        assert!(dbg.contains("len: 2048"));
        assert!(!dbg.contains("[0, 0"));
    }
}
