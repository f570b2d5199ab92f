use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Clinical reasoning failure pattern tracked by the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiasType {
    /// New physical symptoms attributed to a known psychiatric or chronic history
    #[serde(rename = "Diagnostic Shadowing")]
    DiagnosticShadowing,
    /// Inquiry stopped once a benign explanation was found
    #[serde(rename = "Premature Closure")]
    PrematureClosure,
    /// Initial data point held onto despite contradictory evidence
    #[serde(rename = "Anchoring Bias")]
    AnchoringBias,
    /// Sound handling worth recording
    #[serde(rename = "Safe Practice")]
    SafePractice,
}

impl BiasType {
    pub const ALL: [BiasType; 4] = [
        BiasType::DiagnosticShadowing,
        BiasType::PrematureClosure,
        BiasType::AnchoringBias,
        BiasType::SafePractice,
    ];

    /// Wire value, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            BiasType::DiagnosticShadowing => "Diagnostic Shadowing",
            BiasType::PrematureClosure => "Premature Closure",
            BiasType::AnchoringBias => "Anchoring Bias",
            BiasType::SafePractice => "Safe Practice",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            BiasType::DiagnosticShadowing => "DS",
            BiasType::PrematureClosure => "PC",
            BiasType::AnchoringBias => "AB",
            BiasType::SafePractice => "SP",
        }
    }
}

impl fmt::Display for BiasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk attached to an audit event, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    None,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low, RiskLevel::None];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::None => "None",
        }
    }

    pub fn severity(self) -> u8 {
        match self {
            RiskLevel::High => 3,
            RiskLevel::Medium => 2,
            RiskLevel::Low => 1,
            RiskLevel::None => 0,
        }
    }

    /// Label used by the risk distribution.
    pub fn distribution_label(self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::Low => "Low Risk",
            RiskLevel::None => "Safe Practice",
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected (or explicitly absent) reasoning issue in a consultation.
///
/// Field names follow the wire contract (`bias_type`, `risk_level`,
/// `dialogue_trigger`, `clinical_reasoning`); camelCase spellings are accepted
/// on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the consultation, `MM:SS`
    pub timestamp: String,
    #[serde(alias = "biasType")]
    pub bias_type: BiasType,
    #[serde(alias = "riskLevel")]
    pub risk_level: RiskLevel,
    /// Verbatim quote that motivated the flag
    #[serde(alias = "dialogueTrigger")]
    pub dialogue_trigger: String,
    #[serde(rename = "clinical_reasoning", alias = "reasoning")]
    pub reasoning: String,
}

/// Ordered audit produced for one consultation.
///
/// Serializes as the `{"audit_flags": [...]}` document. Event order is the
/// oracle's order and is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResult {
    audit_flags: Vec<AuditEvent>,
}

/// Count of events at one risk level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskBucket {
    pub level: RiskLevel,
    pub label: &'static str,
    pub count: usize,
}

impl AnalysisResult {
    pub fn new(events: Vec<AuditEvent>) -> Self {
        Self { audit_flags: events }
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.audit_flags
    }

    pub fn is_empty(&self) -> bool {
        self.audit_flags.is_empty()
    }

    pub fn total_issues(&self) -> usize {
        self.audit_flags.len()
    }

    pub fn count_at(&self, level: RiskLevel) -> usize {
        self.audit_flags.iter().filter(|e| e.risk_level == level).count()
    }

    pub fn high_risk_count(&self) -> usize {
        self.count_at(RiskLevel::High)
    }

    /// Reasoning is considered robust when nothing high-risk was flagged.
    pub fn is_robust(&self) -> bool {
        self.high_risk_count() == 0
    }

    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.audit_flags.iter().map(|e| e.risk_level).max()
    }

    /// Per-level counts from most to least severe, empty levels omitted.
    pub fn risk_distribution(&self) -> Vec<RiskBucket> {
        RiskLevel::ALL
            .iter()
            .map(|&level| RiskBucket {
                level,
                label: level.distribution_label(),
                count: self.count_at(level),
            })
            .filter(|bucket| bucket.count > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(bias: BiasType, risk: RiskLevel) -> AuditEvent {
        AuditEvent {
            timestamp: "01:15".to_string(),
            bias_type: bias,
            risk_level: risk,
            dialogue_trigger: "It's likely just your anxiety acting up".to_string(),
            reasoning: "Chest pain attributed to anxiety without an EKG".to_string(),
        }
    }

    #[test]
    fn risk_levels_order_by_severity() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Low > RiskLevel::None);
        let mut levels = vec![RiskLevel::Low, RiskLevel::High, RiskLevel::None, RiskLevel::Medium];
        levels.sort();
        assert_eq!(levels, vec![RiskLevel::None, RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]);
    }

    #[test]
    fn bias_type_uses_spaced_wire_names() {
        let json = serde_json::to_string(&BiasType::DiagnosticShadowing).unwrap();
        assert_eq!(json, "\"Diagnostic Shadowing\"");
        for bias in BiasType::ALL {
            let parsed: BiasType = serde_json::from_str(&format!("\"{}\"", bias.as_str())).unwrap();
            assert_eq!(parsed, bias);
        }
    }

    #[test]
    fn event_accepts_camel_case_fields() {
        let event: AuditEvent = serde_json::from_value(serde_json::json!({
            "timestamp": "00:00",
            "biasType": "Anchoring Bias",
            "riskLevel": "High",
            "dialogueTrigger": "Triage says panic attack",
            "reasoning": "Triage label never revisited"
        }))
        .unwrap();
        assert_eq!(event.bias_type, BiasType::AnchoringBias);
        assert_eq!(event.reasoning, "Triage label never revisited");
    }

    #[test]
    fn summary_statistics() {
        let result = AnalysisResult::new(vec![
            event(BiasType::DiagnosticShadowing, RiskLevel::High),
            event(BiasType::PrematureClosure, RiskLevel::High),
            event(BiasType::AnchoringBias, RiskLevel::Low),
            event(BiasType::SafePractice, RiskLevel::None),
        ]);

        assert_eq!(result.total_issues(), 4);
        assert_eq!(result.high_risk_count(), 2);
        assert!(!result.is_robust());
        assert_eq!(result.highest_risk(), Some(RiskLevel::High));

        let distribution = result.risk_distribution();
        let labels: Vec<_> = distribution.iter().map(|b| (b.label, b.count)).collect();
        assert_eq!(labels, vec![("High Risk", 2), ("Low Risk", 1), ("Safe Practice", 1)]);
    }

    #[test]
    fn empty_result_is_robust() {
        let result = AnalysisResult::default();
        assert!(result.is_empty());
        assert!(result.is_robust());
        assert_eq!(result.highest_risk(), None);
        assert!(result.risk_distribution().is_empty());
    }

    #[test]
    fn result_serializes_as_audit_document() {
        let result = AnalysisResult::new(vec![event(BiasType::AnchoringBias, RiskLevel::Medium)]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["audit_flags"][0]["bias_type"], "Anchoring Bias");
        assert_eq!(value["audit_flags"][0]["clinical_reasoning"], "Chest pain attributed to anxiety without an EKG");
    }
}
