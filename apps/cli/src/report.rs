//! Plain-text rendering of an [`AnalysisResult`] for the terminal.

use std::fmt::Write;

use skinscan_shared::{AnalysisResult, ProductCategory, Severity};

const NO_ISSUES: &str = "ไม่พบปัญหาผิวที่ต้องเฝ้าระวัง";
const NO_PRODUCT: &str = "ไม่มีคำแนะนำผลิตภัณฑ์เฉพาะ";
const NO_ROUTINE: &str = "ดูแลผิวตามปกติ";

/// Badge label shown next to an issue title.
pub(crate) fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Mild => "ปัญหาเล็กน้อย",
        Severity::Moderate => "ปัญหาปานกลาง",
        Severity::Severe => "ปัญหารุนแรง",
    }
}

fn category_heading(category: ProductCategory) -> &'static str {
    match category {
        ProductCategory::Cleanser => "Cleanser",
        ProductCategory::Treatment => "Treatment",
        ProductCategory::Moisturizer => "Moisturizer",
        ProductCategory::Sunscreen => "Sunscreen",
    }
}

/// Render the full report. `image` is the preview address, when known.
pub(crate) fn render(result: &AnalysisResult, image: Option<&str>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, result, image);
    out
}

fn write_report(out: &mut String, result: &AnalysisResult, image: Option<&str>) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "  ผลการวิเคราะห์ผิวของคุณ")?;
    if let Some(image) = image {
        writeln!(out, "  Image:     {image}")?;
    }
    writeln!(out, "  Skin type: {}", or_dash(&result.skin_type))?;
    writeln!(
        out,
        "  Severity:  {}",
        result.severity_overall.as_str().to_uppercase()
    )?;
    if !result.overall_assessment.trim().is_empty() {
        writeln!(out, "  {}", result.overall_assessment)?;
    }

    writeln!(out)?;
    writeln!(out, "  ปัญหาที่พบ")?;
    if result.issues.is_empty() {
        writeln!(out, "    {NO_ISSUES}")?;
    }
    for issue in &result.issues {
        writeln!(out, "    - {} [{}]", issue.title, severity_label(issue.severity))?;
        writeln!(out, "      {}", issue.description)?;
        for cause in &issue.possible_causes {
            writeln!(out, "        ? {cause}")?;
        }
        for treatment in &issue.treatments {
            writeln!(out, "        + {treatment}")?;
        }
    }

    if !result.skincare_recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "  สรุปและคำแนะนำเพิ่มเติม")?;
        for (i, rec) in result.skincare_recommendations.iter().enumerate() {
            writeln!(out, "    {}. {rec}", i + 1)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "  Products")?;
    for category in ProductCategory::ALL {
        let text = result
            .product_recommendations
            .get(&category)
            .map_or(NO_PRODUCT, String::as_str);
        writeln!(out, "    {:<12} {text}", category_heading(category))?;
    }

    writeln!(out)?;
    writeln!(out, "  Routine")?;
    let (morning, night) = match &result.daily_routines {
        Some(r) => (r.morning.as_slice(), r.night.as_slice()),
        None => (&[][..], &[][..]),
    };
    write_routine(out, "Morning", morning)?;
    write_routine(out, "Night", night)?;
    writeln!(out)
}

fn write_routine(out: &mut String, heading: &str, steps: &[String]) -> std::fmt::Result {
    if steps.is_empty() {
        return writeln!(out, "    {heading:<12} {NO_ROUTINE}");
    }
    writeln!(out, "    {heading}")?;
    for (i, step) in steps.iter().enumerate() {
        writeln!(out, "      {}. {step}", i + 1)?;
    }
    Ok(())
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use skinscan_shared::{DailyRoutines, Issue};

    fn result(issues: Vec<Issue>) -> AnalysisResult {
        AnalysisResult {
            skin_type: "oily".into(),
            overall_assessment: "Some congestion on the T-zone".into(),
            issues,
            severity_overall: Severity::Moderate,
            skincare_recommendations: vec!["Double cleanse at night".into()],
            product_recommendations: BTreeMap::from([(
                ProductCategory::Cleanser,
                "Gentle foaming cleanser".to_string(),
            )]),
            daily_routines: None,
        }
    }

    #[test]
    fn empty_issues_show_empty_state() {
        let text = render(&result(vec![]), None);
        assert!(text.contains(NO_ISSUES));
        assert!(text.contains("MODERATE"));
    }

    #[test]
    fn issues_carry_severity_labels() {
        let issue = Issue {
            title: "acne".into(),
            severity: Severity::Severe,
            description: "พบปัญหา acne บนใบหน้า".into(),
            possible_causes: vec!["ฮอร์โมน".into()],
            treatments: vec!["Salicylic Acid".into()],
        };
        let text = render(&result(vec![issue]), Some("https://cdn.test/a.jpg"));

        assert!(text.contains("- acne [ปัญหารุนแรง]"));
        assert!(text.contains("? ฮอร์โมน"));
        assert!(text.contains("+ Salicylic Acid"));
        assert!(text.contains("https://cdn.test/a.jpg"));
        assert!(!text.contains(NO_ISSUES));
    }

    #[test]
    fn absent_products_and_routines_fall_back() {
        let text = render(&result(vec![]), None);
        assert!(text.contains("Gentle foaming cleanser"));
        assert_eq!(text.matches(NO_PRODUCT).count(), 3);
        assert_eq!(text.matches(NO_ROUTINE).count(), 2);

        let mut with_routine = result(vec![]);
        with_routine.daily_routines = Some(DailyRoutines {
            morning: vec!["Sunscreen".into()],
            night: vec![],
        });
        let text = render(&with_routine, None);
        assert!(text.contains("1. Sunscreen"));
        assert_eq!(text.matches(NO_ROUTINE).count(), 1);
    }

    #[test]
    fn labels_cover_every_severity() {
        assert_eq!(severity_label(Severity::Mild), "ปัญหาเล็กน้อย");
        assert_eq!(severity_label(Severity::Moderate), "ปัญหาปานกลาง");
        assert_eq!(severity_label(Severity::Severe), "ปัญหารุนแรง");
    }
}
