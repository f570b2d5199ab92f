//! Terminal presenter for a finished session.

use std::fmt::Write as _;

use clinical_audit::{AnalysisResult, AnalysisSession, AuditEvent, BiasType, Phase, RiskLevel};
use colored::{ColoredString, Colorize};

fn risk_colored(level: RiskLevel, text: &str) -> ColoredString {
    match level {
        RiskLevel::High => text.red().bold(),
        RiskLevel::Medium => text.truecolor(234, 88, 12),
        RiskLevel::Low => text.yellow(),
        RiskLevel::None => text.green(),
    }
}

fn bias_colored(bias: BiasType) -> ColoredString {
    let name = bias.as_str().to_uppercase();
    let name = name.as_str();
    match bias {
        BiasType::DiagnosticShadowing => name.purple().bold(),
        BiasType::PrematureClosure => name.magenta().bold(),
        BiasType::AnchoringBias => name.blue().bold(),
        BiasType::SafePractice => name.green().bold(),
    }
}

/// Render the terminal report for `session`.
pub fn render(session: &AnalysisSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "CLARA - Clinical Logic Audit".bright_cyan().bold());
    if let Some(label) = session.label() {
        let _ = writeln!(out, "Source: {}", label.bright_white());
    }

    match session.phase() {
        Phase::Complete => {
            if let Some(result) = session.result() {
                render_result(&mut out, result);
            }
        }
        Phase::Failed => {
            let reason = session.failure_reason().unwrap_or_default();
            let _ = writeln!(out, "{} {}", "Analysis failed:".red().bold(), reason);
        }
        phase => {
            let _ = writeln!(out, "Status: {}", phase.status_label());
        }
    }
    out
}

fn render_result(out: &mut String, result: &AnalysisResult) {
    let high = result.high_risk_count();
    let _ = writeln!(out);
    if result.is_robust() {
        let _ = writeln!(out, "{}", "Reasoning appears robust".green().bold());
        let _ = writeln!(out, "No high-risk cognitive biases were detected in this sample.");
    } else {
        let _ = writeln!(out, "{}", "High Risk Bias Detected".red().bold());
        let _ = writeln!(
            out,
            "CLARA identified {high} high-risk logical failure(s) that may impact patient safety."
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total events: {}   High risk: {}", result.total_issues(), high);
    let distribution = result.risk_distribution();
    if !distribution.is_empty() {
        let _ = writeln!(out, "Risk distribution:");
        for bucket in &distribution {
            let _ = writeln!(out, "  {:<14} {}", risk_colored(bucket.level, bucket.label), bucket.count);
        }
    }

    if result.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Audit stream".bold());
    for event in result.events() {
        render_event(out, event);
    }
}

fn render_event(out: &mut String, event: &AuditEvent) {
    let tag = format!("[{}]", event.bias_type.abbreviation());
    let _ = writeln!(
        out,
        "  [{}] {} {}  Risk: {}",
        event.timestamp.as_str().bold(),
        tag.as_str().dimmed(),
        bias_colored(event.bias_type),
        risk_colored(event.risk_level, event.risk_level.as_str())
    );
    let _ = writeln!(out, "    \"{}\"", event.dialogue_trigger.as_str().italic());
    let _ = writeln!(out, "    {}", event.reasoning);
}
