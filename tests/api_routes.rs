mod common;

use axum::body::Body;
use axum::http::Request;
use common::{
    get_request,
    post_json,
    test_app,
    test_app_with_transcriber,
    MockChatClient,
    TEST_TOKEN,
    TEST_USER,
};
use devpilot::models::log::{ PromptLog, ReviewLog };
use devpilot::models::settings::UserSettings;
use devpilot::store::UsageStore;
use http_body_util::BodyExt;
use serde_json::{ json, Value };
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let app = test_app(MockChatClient::default());
    let response = app.router.clone().oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn settings_default_until_written_then_persist() {
    let app = test_app(MockChatClient::default());

    let response = app.router
        .clone()
        .oneshot(get_request("/settings", Some(TEST_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        body_json(response).await,
        serde_json::to_value(UserSettings::default()).unwrap()
    );

    let update =
        r#"{"enableVoiceControl":false,"enablePrReviews":true,"enableAnalytics":true,"theme":"dark","githubToken":"ghp_x"}"#;
    let response = app.router
        .clone()
        .oneshot(post_json("/settings", Some(TEST_TOKEN), update))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let response = app.router
        .clone()
        .oneshot(get_request("/settings", Some(TEST_TOKEN)))
        .await
        .unwrap();
    let stored = body_json(response).await;
    assert_eq!(stored["enableVoiceControl"], json!(false));
    assert_eq!(stored["theme"], json!("dark"));
    assert_eq!(stored["githubToken"], json!("ghp_x"));
}

#[tokio::test]
async fn settings_reject_unknown_theme_to_system() {
    let app = test_app(MockChatClient::default());

    let response = app.router
        .clone()
        .oneshot(post_json("/settings", Some(TEST_TOKEN), r#"{"theme":"solarized"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let settings = app.store.get_settings(TEST_USER).await.unwrap().unwrap();
    assert_eq!(settings.theme, "system");
}

#[tokio::test]
async fn settings_require_authentication() {
    let app = test_app(MockChatClient::default());
    let response = app.router.clone().oneshot(get_request("/settings", None)).await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn refactor_tags_model_json_as_parsed() {
    let reply = r#"{"refactoredCode": "fn add(a: i32, b: i32) -> i32 { a + b }", "explanation": "Extracted a function."}"#;
    let app = test_app(MockChatClient::completing(reply));

    let response = app.router
        .clone()
        .oneshot(
            post_json(
                "/refactor",
                Some(TEST_TOKEN),
                r#"{"code":"let c = a + b;","instructions":"extract a function"}"#
            )
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["source"], json!("model"));
    assert_eq!(body["refactoredCode"], json!("fn add(a: i32, b: i32) -> i32 { a + b }"));
    assert_eq!(body["explanation"], json!("Extracted a function."));
}

#[tokio::test]
async fn refactor_tags_prose_reply_as_fallback() {
    let app = test_app(MockChatClient::completing("Here you go:\n\nfn add() {}"));

    let response = app.router
        .clone()
        .oneshot(
            post_json("/refactor", Some(TEST_TOKEN), r#"{"code":"x","instructions":"clean up"}"#)
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["source"], json!("fallback"));
    assert_eq!(body["refactoredCode"], json!("Here you go:\n\nfn add() {}"));
}

#[tokio::test]
async fn refactor_requires_code_and_instructions() {
    let app = test_app(MockChatClient::default());

    let response = app.router
        .clone()
        .oneshot(post_json("/refactor", Some(TEST_TOKEN), r#"{"code":"x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Code and instructions are required" })
    );
    assert_eq!(app.chat.call_count(), 0);
}

#[tokio::test]
async fn review_summary_parses_model_json_and_records_log() {
    let reply = r#"{"summary": "Swaps the allocator behind a feature flag.", "riskLevel": "high"}"#;
    let app = test_app(MockChatClient::completing(reply));

    let response = app.router
        .clone()
        .oneshot(
            post_json(
                "/ai/review-summary",
                Some(TEST_TOKEN),
                r#"{"repo":"acme/widget","prNumber":7}"#
            )
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["source"], json!("model"));
    assert_eq!(body["riskLevel"], json!("high"));

    let reviews = app.store.recent_reviews(TEST_USER, 10).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].repo, "acme/widget");
    assert_eq!(reviews[0].pr_number, 7);
    assert_eq!(reviews[0].risk_level, "high");
}

#[tokio::test]
async fn review_summary_falls_back_on_prose_reply() {
    let app = test_app(MockChatClient::completing("Looks fine to me!"));

    let response = app.router
        .clone()
        .oneshot(
            post_json("/ai/review-summary", Some(TEST_TOKEN), r#"{"repo":"acme/widget","prNumber":8}"#)
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["source"], json!("fallback"));
    assert_eq!(body["riskLevel"], json!("low"));
}

#[tokio::test]
async fn review_summary_requires_repo_and_number() {
    let app = test_app(MockChatClient::default());

    let response = app.router
        .clone()
        .oneshot(post_json("/ai/review-summary", Some(TEST_TOKEN), r#"{"repo":"acme/widget"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "PR number and repository are required" })
    );
}

#[tokio::test]
async fn github_prs_without_token_is_a_config_error() {
    let app = test_app(MockChatClient::default());

    let response = app.router
        .clone()
        .oneshot(get_request("/github/prs", Some(TEST_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(body_json(response).await, json!({ "error": "GitHub token not configured" }));
}

#[tokio::test]
async fn transcribe_round_trips_audio_to_text() {
    let app = test_app_with_transcriber(MockChatClient::default(), "list my open pull requests");

    let boundary = "test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"clip.webm\"\r\nContent-Type: audio/webm\r\n\r\nFAKEWEBM\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/voice/transcribe")
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        body_json(response).await,
        json!({ "transcription": "list my open pull requests" })
    );
}

#[tokio::test]
async fn transcribe_without_audio_part_is_rejected() {
    let app = test_app_with_transcriber(MockChatClient::default(), "unused");

    let boundary = "test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/voice/transcribe")
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(body_json(response).await, json!({ "error": "Audio file is required" }));
}

#[tokio::test]
async fn analytics_aggregates_recorded_logs() {
    let app = test_app(MockChatClient::default());

    let older_prompt = PromptLog {
        id: "p1".to_string(),
        user_id: TEST_USER.to_string(),
        prompt: "write a config file parser".to_string(),
        response: "fn parse() {}".to_string(),
        duration_ms: 100,
        created_at: 1_700_000_100,
    };
    let newer_prompt = PromptLog {
        id: "p2".to_string(),
        user_id: TEST_USER.to_string(),
        prompt: "add retry logic".to_string(),
        response: "loop {}".to_string(),
        duration_ms: 300,
        created_at: 1_700_000_300,
    };
    let review = ReviewLog {
        id: "r1".to_string(),
        user_id: TEST_USER.to_string(),
        repo: "acme/widget".to_string(),
        pr_number: 7,
        risk_level: "medium".to_string(),
        created_at: 1_700_000_200,
    };

    app.store.record_prompt(&older_prompt).await.unwrap();
    app.store.record_prompt(&newer_prompt).await.unwrap();
    app.store.record_review(&review).await.unwrap();

    let response = app.router
        .clone()
        .oneshot(get_request("/analytics", Some(TEST_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let report = body_json(response).await;
    assert_eq!(report["totalPrompts"], json!(2));
    assert_eq!(report["totalPrReviews"], json!(1));
    assert_eq!(report["averageResponseTimeMs"], json!(200));

    let features = report["mostUsedFeatures"].as_array().unwrap();
    assert_eq!(features[0]["feature"], json!("Code Generation"));
    assert_eq!(features[0]["count"], json!(2));
    assert_eq!(features[1]["feature"], json!("PR Reviews"));
    assert_eq!(features[1]["count"], json!(1));

    let activity = report["recentActivity"].as_array().unwrap();
    assert_eq!(activity.len(), 3);
    assert_eq!(activity[0]["id"], json!("p2"));
    assert_eq!(activity[1]["id"], json!("r1"));
    assert_eq!(activity[2]["id"], json!("p1"));
    assert_eq!(activity[1]["type"], json!("pr_review"));
    assert_eq!(activity[1]["description"], json!("Reviewed PR #7 in acme/widget"));
}

#[tokio::test]
async fn analytics_for_fresh_user_is_all_zeroes() {
    let app = test_app(MockChatClient::default());

    let response = app.router
        .clone()
        .oneshot(get_request("/analytics", Some(TEST_TOKEN)))
        .await
        .unwrap();

    let report = body_json(response).await;
    assert_eq!(report["totalPrompts"], json!(0));
    assert_eq!(report["averageResponseTimeMs"], json!(0));
    assert!(report["recentActivity"].as_array().unwrap().is_empty());
}
