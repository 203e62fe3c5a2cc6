//! HTTP-level tests for the Gemini client against a local mock server.

use ada_abstraction::{GenerativeModel, ModelError};
use ada_models::GeminiModel;

#[tokio::test]
async fn test_generate_text_extracts_first_candidate() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Take the THY direct flight."}]}}]}"#,
        )
        .create_async()
        .await;

    let model = GeminiModel::with_api_key("gemini-2.5-flash", "test-key").with_base_url(server.url());
    let text = model.generate_text("pick a flight", None).await.unwrap();

    assert_eq!(text, "Take the THY direct flight.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_maps_to_quota_exceeded() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(mockito::Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let model = GeminiModel::with_api_key("gemini-2.5-flash", "k").with_base_url(server.url());
    let err = model.generate_text("hello", None).await.unwrap_err();

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_generate_decision_parses_json_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"decision\":\"reject\",\"reason\":\"layover\",\"confidence\":0.66}"}]}}]}"#,
        )
        .create_async()
        .await;

    let model = GeminiModel::with_api_key("gemini-2.5-flash", "k").with_base_url(server.url());
    let decision = model.generate_decision("vote").await.unwrap();

    assert_eq!(decision.decision, "reject");
    assert_eq!(decision.reason, "layover");
    assert!((decision.confidence - 0.66).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_candidates_is_response_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let model = GeminiModel::with_api_key("gemini-2.5-flash", "k").with_base_url(server.url());
    let err = model.generate_text("hello", None).await.unwrap_err();

    assert!(matches!(err, ModelError::ModelResponseError(_)));
}
