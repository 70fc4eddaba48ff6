//! Extraction of a [`PlantReport`] from free-form model output.
//!
//! The model is asked for JSON but may wrap it in prose or markdown fences,
//! emit several brace-delimited fragments, or get cut off mid-object. This
//! module is pure and total: every input yields a complete report.

use crate::models::{PlantReport, FALLBACK_CONFIDENCE, UNKNOWN};
use serde::{Deserialize, Deserializer};

/// Turn a raw model reply into a report.
///
/// Falls back to [`PlantReport::fallback`] carrying the verbatim reply when
/// [`parse_report`] finds nothing usable.
pub fn extract_report(raw_text: &str) -> PlantReport {
    parse_report(raw_text).unwrap_or_else(|| PlantReport::fallback(raw_text))
}

/// Balanced `{...}` regions are tried left to right; the first one that reads
/// as a plant report wins.
pub fn parse_report(raw_text: &str) -> Option<PlantReport> {
    for candidate in json_object_candidates(raw_text) {
        match serde_json::from_str::<CandidateReport>(candidate) {
            Ok(parsed) => return Some(parsed.into_report()),
            Err(e) => {
                tracing::debug!("Skipping JSON candidate ({} bytes): {}", candidate.len(), e);
            }
        }
    }
    None
}

/// Every balanced brace region of `input`, ordered by start position.
///
/// Braces inside JSON string literals are ignored and escapes are honoured.
/// Regions that never close (truncated output) are skipped, though complete
/// objects nested inside them are still found. Each top-level region is
/// scanned once, so the cost is linear in the input length.
pub fn json_object_candidates(input: &str) -> impl Iterator<Item = &str> + '_ {
    let mut regions: Vec<(usize, usize)> = Vec::new();
    let mut from = 0;

    while let Some(offset) = input[from..].find('{') {
        let start = from + offset;
        let mut found = Vec::new();
        let end = scan_region(input, start, &mut found);
        found.sort_unstable();
        regions.extend(found);

        match end {
            Some(end) => from = end + 1,
            None => break,
        }
    }

    regions
        .into_iter()
        .map(move |(start, end)| &input[start..=end])
}

/// Scans from the `{` at `start`, recording every region that closes.
/// Returns the end of the outer region, or `None` if input ran out first.
fn scan_region(input: &str, start: usize, found: &mut Vec<(usize, usize)>) -> Option<usize> {
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in input[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        let pos = start + i;
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => open.push(pos),
            '}' if !in_string => {
                if let Some(region_start) = open.pop() {
                    found.push((region_start, pos));
                    if open.is_empty() {
                        return Some(pos);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Lenient view of a model-produced report. Only `plantName` is required;
/// absent or `null` fields take safe defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateReport {
    plant_name: String,
    #[serde(default)]
    is_dangerous: Option<bool>,
    #[serde(default)]
    danger_level: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    toxic_parts: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    symptoms: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    safety_tips: Vec<String>,
    #[serde(default)]
    general_info: Option<String>,
    #[serde(default)]
    habitat: Option<String>,
    #[serde(default)]
    uses: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    confidence: Option<String>,
}

impl CandidateReport {
    fn into_report(self) -> PlantReport {
        let unknown = || UNKNOWN.to_string();

        PlantReport {
            plant_name: self.plant_name,
            is_dangerous: self.is_dangerous.unwrap_or(false),
            danger_level: self.danger_level.unwrap_or_else(unknown),
            toxic_parts: self.toxic_parts,
            symptoms: self.symptoms,
            safety_tips: self.safety_tips,
            general_info: self.general_info.unwrap_or_else(unknown),
            habitat: self.habitat.unwrap_or_else(unknown),
            uses: self.uses.unwrap_or_else(unknown),
            confidence: self
                .confidence
                .unwrap_or_else(|| FALLBACK_CONFIDENCE.to_string()),
        }
    }
}

/// Accepts a list of strings, a single string, or `null`.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
    })
}

/// Accepts a string or a bare number (`92` becomes `"92"`).
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROSE: &str = r#"{"plantName":"Rosa rubiginosa","isDangerous":false,"dangerLevel":"Safe","toxicParts":[],"symptoms":[],"safetyTips":["None needed"],"generalInfo":"A wild rose.","habitat":"Temperate hedgerows","uses":"Ornamental","confidence":"92%"}"#;

    fn rose() -> PlantReport {
        PlantReport {
            plant_name: "Rosa rubiginosa".to_string(),
            is_dangerous: false,
            danger_level: "Safe".to_string(),
            toxic_parts: vec![],
            symptoms: vec![],
            safety_tips: vec!["None needed".to_string()],
            general_info: "A wild rose.".to_string(),
            habitat: "Temperate hedgerows".to_string(),
            uses: "Ornamental".to_string(),
            confidence: "92%".to_string(),
        }
    }

    #[test]
    fn test_exact_json_passes_through() {
        assert_eq!(extract_report(ROSE), rose());
    }

    #[test]
    fn test_json_with_leading_commentary() {
        assert_eq!(extract_report(&format!("Sure! {}", ROSE)), rose());
    }

    #[test]
    fn test_json_inside_markdown_fence() {
        let text = format!("Here you go:\n```json\n{}\n```\nStay safe!", ROSE);
        assert_eq!(extract_report(&text), rose());
    }

    #[test]
    fn test_plain_prose_falls_back_verbatim() {
        let text = "This looks like a fern, but the photo is too blurry to be sure.";
        assert_eq!(extract_report(text), PlantReport::fallback(text));
    }

    #[test]
    fn test_empty_text_falls_back() {
        assert_eq!(extract_report(""), PlantReport::fallback(""));
    }

    #[test]
    fn test_truncated_json_falls_back() {
        let truncated = &ROSE[..ROSE.len() / 2];
        assert_eq!(extract_report(truncated), PlantReport::fallback(truncated));
    }

    #[test]
    fn test_prose_braces_before_report_are_skipped() {
        let text = format!("Fields use {{curly}} braces. {} Hope that helps {{:)}}", ROSE);
        assert_eq!(extract_report(&text), rose());
    }

    #[test]
    fn test_first_of_multiple_reports_wins() {
        let other = ROSE.replace("Rosa rubiginosa", "Rosa canina");
        let text = format!("{} or possibly {}", ROSE, other);
        assert_eq!(extract_report(&text), rose());
    }

    #[test]
    fn test_report_nested_in_wrapper_object() {
        let text = format!(r#"{{"result": {}}}"#, ROSE);
        assert_eq!(extract_report(&text), rose());
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_scanner() {
        let text = r#"{"plantName":"Odd {name}","generalInfo":"Has \"quoted}\" text","isDangerous":true,"dangerLevel":"Deadly","toxicParts":["all"],"symptoms":[],"safetyTips":[],"habitat":"x","uses":"none","confidence":"10%"}"#;
        let report = extract_report(text);
        assert_eq!(report.plant_name, "Odd {name}");
        assert_eq!(report.general_info, "Has \"quoted}\" text");
        assert!(report.is_dangerous);
        assert_eq!(report.danger_level, "Deadly");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let report = extract_report(r#"{"plantName":"Oleander","isDangerous":true}"#);
        assert_eq!(
            report,
            PlantReport {
                plant_name: "Oleander".to_string(),
                is_dangerous: true,
                danger_level: "Unknown".to_string(),
                toxic_parts: vec![],
                symptoms: vec![],
                safety_tips: vec![],
                general_info: "Unknown".to_string(),
                habitat: "Unknown".to_string(),
                uses: "Unknown".to_string(),
                confidence: "Low".to_string(),
            }
        );
    }

    #[test]
    fn test_null_fields_get_defaults() {
        let report = extract_report(
            r#"{"plantName":"Ivy","isDangerous":null,"toxicParts":null,"confidence":null}"#,
        );
        assert!(!report.is_dangerous);
        assert!(report.toxic_parts.is_empty());
        assert_eq!(report.confidence, "Low");
    }

    #[test]
    fn test_single_string_becomes_list() {
        let report = extract_report(r#"{"plantName":"Nettle","symptoms":"Stinging rash"}"#);
        assert_eq!(report.symptoms, vec!["Stinging rash".to_string()]);
    }

    #[test]
    fn test_numeric_confidence_is_stringified() {
        let report = extract_report(r#"{"plantName":"Fern","confidence":85}"#);
        assert_eq!(report.confidence, "85");
    }

    #[test]
    fn test_object_without_plant_name_falls_back() {
        let text = r#"{"error":"image unclear"}"#;
        assert_eq!(extract_report(text), PlantReport::fallback(text));
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let text = r#"{"plantName":"Fern","isDangerous":"maybe"}"#;
        assert_eq!(extract_report(text), PlantReport::fallback(text));
    }

    #[test]
    fn test_parse_report_reports_absence() {
        assert!(parse_report("no json here").is_none());
        assert_eq!(parse_report(ROSE), Some(rose()));
    }

    #[test]
    fn test_unicode_around_json() {
        let text = format!("🌿 Résultat : {} ✅", ROSE);
        assert_eq!(extract_report(&text), rose());
    }

    #[test]
    fn test_candidates_are_ordered_and_balanced() {
        let candidates: Vec<&str> = json_object_candidates(r#"a {"x":{"y":1}} b {oops"#).collect();
        assert_eq!(candidates, vec![r#"{"x":{"y":1}}"#, r#"{"y":1}"#]);
    }

    #[test]
    fn test_report_after_many_unclosed_braces() {
        let text = format!("{}{}", "{".repeat(5000), ROSE);
        assert_eq!(extract_report(&text), rose());

        let candidates: Vec<&str> = json_object_candidates(&text).collect();
        assert_eq!(candidates, vec![ROSE]);
    }

    #[test]
    fn test_braces_in_strings_are_not_candidates() {
        let candidates: Vec<&str> = json_object_candidates(r#"{"a":"{b}"} then {c}"#).collect();
        assert_eq!(candidates, vec![r#"{"a":"{b}"}"#, "{c}"]);
    }

    #[test]
    fn test_unbalanced_closing_braces_do_not_panic() {
        let text = "}}} {} }";
        assert_eq!(extract_report(text), PlantReport::fallback(text));
    }
}
