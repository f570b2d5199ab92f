use std::sync::Arc;
use std::time::Duration;

use clinical_audit::{
    AnalysisBackend, AnalysisOrchestrator, AnalysisRequest, AuditError, InputNormalizer, OracleConfig, OracleGateway,
    Phase, RemoteGateway, Submission,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};

const ORACLE_PATH: &str = "/v1beta/models/test-model:generateContent";
const TRANSCRIPT: &str = "Triage: pt appears intoxicated.\n\
                          Pt: I haven't had anything to drink, my head has been pounding since I fell.\n\
                          Dr: The triage note says intoxicated, so let's let you sleep it off.";

/// Leading bytes of an MP3 file with an ID3 tag.
const MP3_BYTES: [u8; 10] = [0x49, 0x44, 0x33, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x21];

fn oracle_reply(audit: &Value) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": audit.to_string() }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn gateway_config(oracle: &ServerGuard) -> OracleConfig {
    OracleConfig::default()
        .with_base_url(oracle.url())
        .with_model("test-model")
}

fn orchestrator_for(config: OracleConfig) -> AnalysisOrchestrator {
    let normalizer = InputNormalizer::new(config.max_audio_bytes);
    let gateway = Arc::new(OracleGateway::new(config).unwrap());
    AnalysisOrchestrator::new(gateway, normalizer)
}

#[tokio::test]
async fn text_with_anchoring_bias_completes_with_one_high_risk() {
    let mut oracle = Server::new_async().await;
    let audit = json!({
        "audit_flags": [{
            "timestamp": "00:00",
            "bias_type": "Anchoring Bias",
            "risk_level": "High",
            "dialogue_trigger": "The triage note says intoxicated, so let's let you sleep it off.",
            "clinical_reasoning": "The patient's denial of alcohol and report of a fall were discounted in favour of the triage label; head injury was not considered."
        }]
    });
    let mock = oracle
        .mock("POST", ORACLE_PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "generationConfig": { "responseMimeType": "application/json", "temperature": 0.2 }
            })),
            Matcher::Regex("TRANSCRIPT FOR ANALYSIS:".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(oracle_reply(&audit))
        .expect(1)
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(gateway_config(&oracle).with_api_key("test-key"));
    let session = orchestrator.run(Submission::transcript(TRANSCRIPT)).await.unwrap();

    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(session.transcript_echo(), Some(TRANSCRIPT));
    let result = session.result().unwrap();
    assert_eq!(result.total_issues(), 1);
    assert_eq!(result.high_risk_count(), 1);
    assert!(!result.is_robust());
    assert_eq!(result.events()[0].bias_type.as_str(), "Anchoring Bias");
    mock.assert_async().await;
}

#[tokio::test]
async fn text_with_no_findings_is_robust() {
    let mut oracle = Server::new_async().await;
    let mock = oracle
        .mock("POST", ORACLE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(oracle_reply(&json!({ "audit_flags": [] })))
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(gateway_config(&oracle).with_api_key("test-key"));
    let session = orchestrator.run(Submission::transcript(TRANSCRIPT)).await.unwrap();

    assert_eq!(session.phase(), Phase::Complete);
    let result = session.result().unwrap();
    assert!(result.is_empty());
    assert_eq!(result.high_risk_count(), 0);
    assert!(result.is_robust());
    assert!(result.risk_distribution().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn audio_without_credential_fails_before_any_call() {
    let mut oracle = Server::new_async().await;
    let mock = oracle.mock("POST", Matcher::Any).expect(0).create_async().await;

    let mut orchestrator = orchestrator_for(gateway_config(&oracle));
    let session = orchestrator
        .run(Submission::audio_bytes(MP3_BYTES.to_vec(), "audio/mpeg").with_label("consult.mp3"))
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.label(), Some("consult.mp3"));
    let reason = session.failure_reason().unwrap();
    assert!(reason.contains("GEMINI_API_KEY is not configured"), "{reason}");
    assert!(session.result().is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn upstream_failure_then_reset_releases_media() {
    let mut oracle = Server::new_async().await;
    let mock = oracle
        .mock("POST", ORACLE_PATH)
        .match_body(Matcher::Regex(r#""inlineData":\{"mimeType":"audio/mpeg""#.to_string()))
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": { "code": 500, "message": "Internal error encountered.", "status": "INTERNAL" } }).to_string())
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(gateway_config(&oracle).with_api_key("test-key"));
    let session = orchestrator
        .run(Submission::audio_bytes(MP3_BYTES.to_vec(), "audio/mpeg"))
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.failure_reason(), Some("Internal error encountered."));
    let handle = session.source_handle().unwrap();
    assert!(orchestrator.media().is_live(&handle));

    orchestrator.reset();
    assert_eq!(orchestrator.session().phase(), Phase::Idle);
    assert!(orchestrator.session().source_handle().is_none());
    assert!(orchestrator.session().failure_reason().is_none());
    assert!(!orchestrator.media().is_live(&handle));
    assert_eq!(orchestrator.media().live_count(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn out_of_enumeration_reply_is_malformed() {
    let mut oracle = Server::new_async().await;
    let mock = oracle
        .mock("POST", ORACLE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(oracle_reply(&json!({
            "audit_flags": [{
                "timestamp": "01:10",
                "bias_type": "Confirmation Bias",
                "risk_level": "High",
                "dialogue_trigger": "It's your anxiety.",
                "clinical_reasoning": "..."
            }]
        })))
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(gateway_config(&oracle).with_api_key("test-key"));
    let session = orchestrator.run(Submission::transcript(TRANSCRIPT)).await.unwrap();

    assert_eq!(session.phase(), Phase::Failed);
    let reason = session.failure_reason().unwrap();
    assert!(reason.starts_with("Analysis failed"), "{reason}");
    assert!(!reason.contains("Confirmation"));
    mock.assert_async().await;
}

#[tokio::test]
async fn gateway_rejects_hand_built_requests_without_calling_oracle() {
    let mut oracle = Server::new_async().await;
    let mock = oracle.mock("POST", Matcher::Any).expect(0).create_async().await;
    let gateway = OracleGateway::new(gateway_config(&oracle).with_api_key("test-key")).unwrap();

    for request in [
        AnalysisRequest::Text { content: String::new() },
        AnalysisRequest::Audio {
            data: "@@not base64@@".to_string(),
            mime_type: "audio/mpeg".to_string(),
        },
        AnalysisRequest::Audio {
            data: "SUQz".to_string(),
            mime_type: "text/plain".to_string(),
        },
    ] {
        let result = gateway.analyze(&request).await;
        assert!(matches!(result, Err(AuditError::InvalidRequest(_))), "{request:?}: {result:?}");
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_gateway_validates_server_reply() {
    let mut server = Server::new_async().await;
    let audit = json!({
        "audit_flags": [{
            "timestamp": "02:14",
            "bias_type": "Diagnostic Shadowing",
            "risk_level": "Medium",
            "dialogue_trigger": "This is typical for your condition.",
            "clinical_reasoning": "New chest pain was attributed to the known panic disorder without an EKG."
        }]
    });
    let mock = server
        .mock("POST", "/api/analyze")
        .match_body(Matcher::Json(json!({ "type": "text", "text": "Dr: typical for you." })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(audit.to_string())
        .create_async()
        .await;

    let remote = Arc::new(RemoteGateway::new(server.url(), Duration::from_secs(5)).unwrap());
    assert_eq!(remote.name(), "remote-gateway");
    let mut orchestrator = AnalysisOrchestrator::new(remote, InputNormalizer::default());
    let session = orchestrator.run(Submission::transcript("Dr: typical for you.")).await.unwrap();

    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(session.result().unwrap().count_at(clinical_audit::RiskLevel::Medium), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_gateway_surfaces_server_error_message() {
    let mut server = Server::new_async().await;
    let with_body = server
        .mock("POST", "/api/analyze")
        .match_body(Matcher::PartialJson(json!({ "text": "Dr: first" })))
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": "GEMINI_API_KEY is not configured on the server." }).to_string())
        .create_async()
        .await;
    let without_body = server
        .mock("POST", "/api/analyze")
        .match_body(Matcher::PartialJson(json!({ "text": "Dr: second" })))
        .with_status(503)
        .with_body("upstream connect error")
        .create_async()
        .await;

    let remote = Arc::new(RemoteGateway::new(server.url(), Duration::from_secs(5)).unwrap());
    let mut orchestrator = AnalysisOrchestrator::new(remote, InputNormalizer::default());

    let session = orchestrator.run(Submission::transcript("Dr: first")).await.unwrap();
    assert_eq!(session.failure_reason(), Some("GEMINI_API_KEY is not configured on the server."));

    let session = orchestrator.run(Submission::transcript("Dr: second")).await.unwrap();
    assert_eq!(session.failure_reason(), Some("Server error: 503"));

    with_body.assert_async().await;
    without_body.assert_async().await;
}
