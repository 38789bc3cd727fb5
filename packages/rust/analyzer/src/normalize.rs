//! Result normalizer: raw payload variants → canonical [`AnalysisResult`].

use serde_json::Value;
use tracing::{debug, instrument, warn};

use skinscan_shared::{AnalysisResult, Issue, NormalizeError, Severity};

use crate::payload::{DetailedIssue, PayloadSummary, RawPayload};

/// Maximum words of the overall assessment quoted in a rich issue's description.
const EXCERPT_WORDS: usize = 24;

const DEFAULT_CAUSES: &[&str] = &["ฮอร์โมน", "ความเครียด", "การทำความสะอาดไม่เพียงพอ"];

const DEFAULT_TREATMENTS: &[&str] = &[
    "ใช้ผลิตภัณฑ์ที่มี Salicylic Acid",
    "หลีกเลี่ยงการสัมผัสใบหน้า",
    "ทำความสะอาดหมอน 2 ครั้ง/สัปดาห์",
];

/// Advice for flat-shape labels, matched by substring in Thai or English.
struct KeywordAdvice {
    thai: &'static str,
    /// Lowercase; compared against the lowercased label.
    english: &'static str,
    causes: &'static [&'static str],
    treatments: &'static [&'static str],
}

/// Checked in order; the first match wins.
const KEYWORD_ADVICE: &[KeywordAdvice] = &[
    KeywordAdvice {
        thai: "สิว",
        english: "acne",
        causes: &["ฮอร์โมน", "ความเครียด", "การทำความสะอาดไม่เพียงพอ"],
        treatments: &[
            "ใช้ผลิตภัณฑ์ที่มี Salicylic Acid",
            "หลีกเลี่ยงการสัมผัสใบหน้า",
            "ทำความสะอาดหมอนทุกสัปดาห์",
        ],
    },
    KeywordAdvice {
        thai: "รอยดำ",
        english: "hyperpigmentation",
        causes: &["รอยแดงเป็นรอยดำ", "การอักเสบผิวแดด"],
        treatments: &[
            "ใช้ครีมกันแดดทุกวัน",
            "ใช้ผลิตภัณฑ์ที่มี Vitamin C",
            "พิจารณาการทำ Chemical Peel",
        ],
    },
    KeywordAdvice {
        thai: "ตุ่ม",
        english: "pustule",
        causes: &["เชื้อแบคทีเรีย", "การอุดตันของรูขุมขน"],
        treatments: &["ใช้ครีมที่มีแอนติบาคทีเรีย", "หลีกเลี่ยงการบีบหรือเกาตุ่ม"],
    },
];

/// Normalize element 0 of an analyzer response.
#[instrument(skip_all)]
pub fn normalize(payload: Value) -> Result<AnalysisResult, NormalizeError> {
    let raw = RawPayload::parse(payload)?;
    normalize_payload(raw)
}

/// Normalize an already-identified payload.
pub fn normalize_payload(raw: RawPayload) -> Result<AnalysisResult, NormalizeError> {
    let (summary, issues) = match raw {
        RawPayload::Flat(p) => {
            let overall = Severity::coerce_or_moderate(p.summary.severity_overall.as_deref());
            let labels = reconcile_count(p.issues, p.summary.detection_count);
            debug!(shape = "flat", issues = labels.len(), "normalizing payload");
            let issues = labels
                .into_iter()
                .map(|label| issue_from_label(label, overall))
                .collect();
            (p.summary, issues)
        }
        RawPayload::Rich(p) => {
            let detailed = reconcile_count(p.issues, p.summary.detection_count);
            debug!(shape = "rich", issues = detailed.len(), "normalizing payload");
            let issues = detailed
                .into_iter()
                .map(|issue| issue_from_detailed(issue, &p.summary))
                .collect();
            (p.summary, issues)
        }
    };

    Ok(AnalysisResult {
        skin_type: summary.skin_type.unwrap_or_default(),
        severity_overall: Severity::coerce_or_moderate(summary.severity_overall.as_deref()),
        overall_assessment: summary.overall_assessment.unwrap_or_default(),
        issues,
        skincare_recommendations: summary.skincare_recommendations,
        product_recommendations: summary.product_recommendations,
        daily_routines: summary.daily_routines,
    })
}

/// Trim the issue list to the analyzer-reported count.
///
/// A larger count only means several detections shared a label; the listed
/// issues are kept as they are.
fn reconcile_count<T>(mut issues: Vec<T>, reported: Option<usize>) -> Vec<T> {
    match reported {
        Some(count) if count > issues.len() => {
            warn!(reported = count, listed = issues.len(), "detection count exceeds listed issues");
            issues
        }
        Some(count) => {
            issues.truncate(count);
            issues
        }
        None => issues,
    }
}

fn issue_from_label(label: String, severity: Severity) -> Issue {
    let lowered = label.to_lowercase();
    let advice = KEYWORD_ADVICE
        .iter()
        .find(|a| label.contains(a.thai) || lowered.contains(a.english));

    let (causes, treatments) = match advice {
        Some(a) => (a.causes, a.treatments),
        None => (DEFAULT_CAUSES, DEFAULT_TREATMENTS),
    };

    Issue {
        description: format!("พบปัญหา {label} บนใบหน้า"),
        title: label,
        severity,
        possible_causes: to_owned(causes),
        treatments: to_owned(treatments),
    }
}

fn issue_from_detailed(issue: DetailedIssue, summary: &PayloadSummary) -> Issue {
    let severity = Severity::coerce_or_moderate(
        issue
            .severity
            .as_deref()
            .or(summary.severity_overall.as_deref()),
    );

    let excerpt = excerpt(summary.overall_assessment.as_deref().unwrap_or_default());
    let area = issue
        .affected_area
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let description = match area {
        Some(area) if excerpt.is_empty() => format!("บริเวณที่พบ: {area}"),
        Some(area) => format!("บริเวณที่พบ: {area}. {excerpt}"),
        None => excerpt,
    };

    Issue {
        title: issue.issue_name,
        severity,
        description,
        possible_causes: issue.possible_causes,
        treatments: issue.recommended_solutions,
    }
}

/// First [`EXCERPT_WORDS`] words, with an ellipsis when anything was cut.
fn excerpt(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > EXCERPT_WORDS {
        format!("{}…", words[..EXCERPT_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
