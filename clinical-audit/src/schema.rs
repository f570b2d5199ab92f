//! Schema contract shared by the oracle request and reply validation.
//!
//! The same schema value constrains generation for both audio and text
//! analyses, and every reply is checked against the typed model before it is
//! accepted. Nothing outside the closed enumerations reaches the domain model.

use lazy_static::lazy_static;
use serde_json::{json, Value};

use crate::error::OracleError;
use crate::model::{AnalysisResult, AuditEvent, BiasType, RiskLevel};

/// Top-level key of the audit document.
pub const ROOT_FIELD: &str = "audit_flags";

const EVENT_FIELDS: [&str; 5] = [
    "timestamp",
    "bias_type",
    "risk_level",
    "dialogue_trigger",
    "clinical_reasoning",
];

lazy_static! {
    static ref RESPONSE_SCHEMA: Value = build_response_schema();
}

fn build_response_schema() -> Value {
    let bias_types: Vec<&str> = BiasType::ALL.iter().map(|b| b.as_str()).collect();
    let risk_levels: Vec<&str> = RiskLevel::ALL.iter().map(|r| r.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            ROOT_FIELD: {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "timestamp": { "type": "STRING", "description": "Format MM:SS" },
                        "bias_type": { "type": "STRING", "enum": bias_types },
                        "risk_level": { "type": "STRING", "enum": risk_levels },
                        "dialogue_trigger": { "type": "STRING", "description": "Verbatim quote from the consultation" },
                        "clinical_reasoning": { "type": "STRING", "description": "Explanation of the logic failure, or why the handling was sound" }
                    },
                    "required": EVENT_FIELDS
                }
            }
        },
        "required": [ROOT_FIELD]
    })
}

pub struct SchemaContract;

impl SchemaContract {
    /// Structured-output schema in the oracle's OpenAPI-subset dialect.
    pub fn response_schema() -> &'static Value {
        &RESPONSE_SCHEMA
    }

    /// Parse raw oracle text into a validated result.
    ///
    /// # Errors
    ///
    /// `EmptyResponse` for blank text, `MalformedResponse` for anything that
    /// is not JSON or does not satisfy the contract.
    pub fn parse(raw: &str) -> Result<AnalysisResult, OracleError> {
        let trimmed = strip_code_fence(raw.trim());
        if trimmed.is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| OracleError::malformed(format!("reply is not valid JSON: {e}")))?;
        Self::validate(value)
    }

    /// Validate an already-decoded JSON document.
    ///
    /// # Errors
    ///
    /// `MalformedResponse` naming the first violation found.
    pub fn validate(value: Value) -> Result<AnalysisResult, OracleError> {
        let Value::Object(map) = &value else {
            return Err(OracleError::malformed("reply is not a JSON object"));
        };
        if !map.contains_key(ROOT_FIELD) {
            return Err(OracleError::malformed(format!("reply is missing `{ROOT_FIELD}`")));
        }

        let result: AnalysisResult =
            serde_json::from_value(value).map_err(|e| OracleError::malformed(e.to_string()))?;

        for (index, event) in result.events().iter().enumerate() {
            check_event(index, event)?;
        }
        Ok(result)
    }
}

fn check_event(index: usize, event: &AuditEvent) -> Result<(), OracleError> {
    let text_fields = [
        ("timestamp", &event.timestamp),
        ("dialogue_trigger", &event.dialogue_trigger),
        ("clinical_reasoning", &event.reasoning),
    ];
    for (name, value) in text_fields {
        if value.trim().is_empty() {
            return Err(OracleError::malformed(format!("{ROOT_FIELD}[{index}].{name} is empty")));
        }
    }
    if !is_well_formed_timestamp(&event.timestamp) {
        return Err(OracleError::malformed(format!(
            "{ROOT_FIELD}[{index}].timestamp `{}` is not MM:SS",
            event.timestamp
        )));
    }
    Ok(())
}

/// Accepts `MM:SS` (minutes may run past 59 or be a single digit) and
/// `H:MM:SS` for long recordings.
pub fn is_well_formed_timestamp(timestamp: &str) -> bool {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let sexagesimal = |s: &str| s.len() == 2 && all_digits(s) && s < "60";

    match *parts.as_slice() {
        [minutes, seconds] => minutes.len() <= 3 && all_digits(minutes) && sexagesimal(seconds),
        [hours, minutes, seconds] => {
            hours.len() <= 2 && all_digits(hours) && sexagesimal(minutes) && sexagesimal(seconds)
        }
        _ => false,
    }
}

/// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Value {
        json!({
            "timestamp": "02:41",
            "bias_type": "Diagnostic Shadowing",
            "risk_level": "High",
            "dialogue_trigger": "This is typical for your condition",
            "clinical_reasoning": "New dizziness attributed to depression without orthostatic vitals"
        })
    }

    fn assert_malformed(result: Result<AnalysisResult, OracleError>) {
        match result {
            Err(OracleError::MalformedResponse { .. }) => {}
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn schema_lists_closed_enumerations() {
        let schema = SchemaContract::response_schema();
        let item = &schema["properties"]["audit_flags"]["items"];
        assert_eq!(item["properties"]["bias_type"]["enum"].as_array().unwrap().len(), 4);
        assert_eq!(item["properties"]["risk_level"]["enum"][3], "None");
        assert_eq!(item["required"].as_array().unwrap().len(), 5);
        assert_eq!(schema["required"][0], "audit_flags");
    }

    #[test]
    fn schema_value_is_shared() {
        assert!(std::ptr::eq(SchemaContract::response_schema(), SchemaContract::response_schema()));
    }

    #[test]
    fn accepts_valid_document_preserving_order() {
        let mut second = flag();
        second["timestamp"] = json!("00:12");
        second["bias_type"] = json!("Safe Practice");
        second["risk_level"] = json!("None");

        let result = SchemaContract::validate(json!({ "audit_flags": [flag(), second] })).unwrap();
        assert_eq!(result.total_issues(), 2);
        assert_eq!(result.events()[0].timestamp, "02:41");
        assert_eq!(result.events()[1].bias_type, BiasType::SafePractice);
    }

    #[test]
    fn accepts_empty_audit() {
        let result = SchemaContract::parse(r#"{"audit_flags": []}"#).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn rejects_missing_root_field() {
        assert_malformed(SchemaContract::parse(r#"{"clinical_insights": []}"#));
    }

    #[test]
    fn rejects_extra_root_field() {
        assert_malformed(SchemaContract::validate(json!({ "audit_flags": [], "summary": "ok" })));
    }

    #[test]
    fn rejects_unknown_bias_type() {
        let mut bad = flag();
        bad["bias_type"] = json!("Confirmation Bias");
        assert_malformed(SchemaContract::validate(json!({ "audit_flags": [flag(), bad] })));
    }

    #[test]
    fn rejects_unknown_risk_level() {
        let mut bad = flag();
        bad["risk_level"] = json!("Critical");
        assert_malformed(SchemaContract::validate(json!({ "audit_flags": [bad] })));
    }

    #[test]
    fn rejects_missing_event_field() {
        let mut bad = flag();
        bad.as_object_mut().unwrap().remove("dialogue_trigger");
        assert_malformed(SchemaContract::validate(json!({ "audit_flags": [bad] })));
    }

    #[test]
    fn rejects_blank_reasoning() {
        let mut bad = flag();
        bad["clinical_reasoning"] = json!("   ");
        assert_malformed(SchemaContract::validate(json!({ "audit_flags": [bad] })));
    }

    #[test]
    fn rejects_non_json_and_non_object() {
        assert_malformed(SchemaContract::parse("The consultation looks fine."));
        assert_malformed(SchemaContract::parse("[]"));
    }

    #[test]
    fn blank_text_is_empty_response() {
        assert_eq!(SchemaContract::parse("  \n").unwrap_err(), OracleError::EmptyResponse);
    }

    #[test]
    fn strips_markdown_fence() {
        let result = SchemaContract::parse("```json\n{\"audit_flags\": []}\n```").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn timestamp_forms() {
        for ok in ["00:00", "4:05", "12:59", "125:00", "1:02:03"] {
            assert!(is_well_formed_timestamp(ok), "{ok} should be accepted");
        }
        for bad in ["", "00", "1:5", "12:60", "ab:cd", "00:00:00:00", "1:60:00", "start"] {
            assert!(!is_well_formed_timestamp(bad), "{bad} should be rejected");
        }
    }
}
