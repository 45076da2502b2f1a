//! Integration tests for the feedback stub.
//!
//! These tests start a real axum server on a random port and drive it with
//! the `feedback-rs` HTTP backend, the way a widget would.

use std::sync::Arc;
use std::time::Duration;

use feedback_rs::backend::{FeatureFeedback, FeedbackBackend, SurveySubmission};
use feedback_rs::prelude::*;
use feedback_web::{INVALID_TOKEN_MESSAGE, RecordedSubmission, StubConfig, StubMode, SubmissionLog, spawn_stub};

/// Helper: spawn a stub on port 0 (random available port).
async fn spawn_test_stub(config: StubConfig) -> (String, SubmissionLog) {
    let config = config.with_bind_addr(([127, 0, 0, 1], 0));
    let (addr, log) = spawn_stub(config).await.unwrap();
    (format!("http://{addr}"), log)
}

fn service(base: &str) -> HttpFeedbackService {
    HttpFeedbackService::new(FeedbackClientConfig::new(format!("{base}/api/feedback"))).unwrap()
}

fn feedback(vote: Vote, comments: Option<&str>, token: &str) -> FeatureFeedback {
    FeatureFeedback {
        feature_identifier: "search-filters".into(),
        vote,
        comments: comments.map(str::to_string),
        recaptcha_token: token.into(),
    }
}

// ── HTTP backend against the stub ────────────────────────────────────

#[tokio::test]
async fn feature_feedback_is_accepted_and_recorded() {
    let (base, log) = spawn_test_stub(StubConfig::default()).await;

    let outcome = service(&base)
        .submit_feedback(feedback(Vote::Up, Some("handy"), "tok"))
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);

    assert_eq!(
        log.all(),
        vec![RecordedSubmission::Feature {
            feature_id: "search-filters".into(),
            rating: Vote::Up,
            comment: Some("handy".into()),
            token: "tok".into(),
        }]
    );
}

#[tokio::test]
async fn empty_comment_is_not_sent() {
    let (base, log) = spawn_test_stub(StubConfig::default()).await;

    service(&base)
        .submit_feedback(feedback(Vote::Down, Some(""), "tok"))
        .await
        .unwrap();

    let RecordedSubmission::Feature { comment, .. } = &log.all()[0] else {
        panic!("expected feature feedback");
    };
    assert_eq!(comment, &None);
}

#[tokio::test]
async fn survey_payload_reaches_the_service() {
    let (base, log) = spawn_test_stub(StubConfig::default()).await;
    let survey = SurveySubmission {
        survey_identifier: "onboarding".into(),
        responses: vec![
            QuestionResponse::new("Easy?").with_rating(Some(Vote::Up)),
            QuestionResponse::new("extra info").with_comment(Some("foo-extra-1".into())),
        ],
        recaptcha_token: "tok".into(),
    };

    let outcome = service(&base).submit_survey(survey.clone()).await.unwrap();
    assert!(outcome.is_accepted());

    assert_eq!(
        log.all(),
        vec![RecordedSubmission::Survey {
            survey_id: "onboarding".into(),
            responses: survey.responses,
            token: "tok".into(),
        }]
    );
}

#[tokio::test]
async fn rejection_carries_the_reason() {
    let (base, log) = spawn_test_stub(StubConfig::default().with_mode(StubMode::Reject {
        message: "quota exceeded".into(),
    }))
    .await;

    let outcome = service(&base)
        .submit_feedback(feedback(Vote::Up, None, "tok"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: Some("quota exceeded".into())
        }
    );
    // Rejected submissions are still recorded.
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn wrong_token_is_rejected_and_not_recorded() {
    let (base, log) = spawn_test_stub(StubConfig::default().with_required_token("secret")).await;

    let outcome = service(&base)
        .submit_feedback(feedback(Vote::Up, None, "guess"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: Some(INVALID_TOKEN_MESSAGE.into())
        }
    );
    assert!(log.is_empty());

    let outcome = service(&base)
        .submit_feedback(feedback(Vote::Up, None, "secret"))
        .await
        .unwrap();
    assert!(outcome.is_accepted());
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn error_status_is_a_transport_error() {
    let (base, log) = spawn_test_stub(StubConfig::default().with_mode(StubMode::Fail { status: 503 })).await;

    let err = service(&base)
        .submit_feedback(feedback(Vote::Up, None, "tok"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"), "{err}");
    assert!(log.is_empty());
}

// ── Widgets end to end ───────────────────────────────────────────────

#[tokio::test]
async fn coordinator_submits_survey_over_http() {
    let (base, log) = spawn_test_stub(StubConfig::default().with_required_token("dev-token")).await;

    let survey = SubmissionCoordinator::for_questions(
        SurveyConfig::new("search-survey"),
        [
            Question::vote("Did you find it?").required(),
            Question::comment("Anything else?"),
            Question::extra("extra info", "foo-extra-1"),
        ],
    )
    .with_backend(Arc::new(service(&base)))
    .with_captcha(Arc::new(StaticTokenProvider::new("dev-token")));

    survey.set_vote(QuestionId(0), Vote::Down).unwrap();
    survey.set_comment(QuestionId(1), "Filters were hidden").unwrap();

    assert_eq!(survey.submit().await.unwrap(), SubmissionState::Submitted);
    assert_eq!(survey.last_receipt().unwrap().response_count, 3);

    let RecordedSubmission::Survey {
        survey_id,
        responses,
        token,
    } = &log.all()[0]
    else {
        panic!("expected a survey");
    };
    assert_eq!(survey_id, "search-survey");
    assert_eq!(token, "dev-token");
    assert_eq!(
        responses,
        &vec![
            QuestionResponse::new("Did you find it?").with_rating(Some(Vote::Down)),
            QuestionResponse::new("Anything else?").with_comment(Some("Filters were hidden".into())),
            QuestionResponse::new("extra info").with_comment(Some("foo-extra-1".into())),
        ]
    );
}

#[tokio::test]
async fn slow_service_times_out() {
    let (base, log) = spawn_test_stub(StubConfig::default().with_delay(Duration::from_millis(500))).await;

    let survey = SubmissionCoordinator::for_questions(
        SurveyConfig::new("s").with_submit_timeout_ms(50),
        [Question::vote("Useful?")],
    )
    .with_backend(Arc::new(service(&base)))
    .with_captcha(Arc::new(StaticTokenProvider::new("tok")));

    assert_eq!(survey.submit().await.unwrap(), SubmissionState::Error);
    assert!(matches!(survey.error(), Some(SubmissionError::Timeout(_))));
    assert!(
        survey
            .error_message()
            .unwrap()
            .ends_with("Error: Operation timed out")
    );
    assert!(log.is_empty());
}

#[tokio::test]
async fn feature_widget_submits_over_http() {
    let (base, log) = spawn_test_stub(StubConfig::default()).await;

    let widget = FeatureFeedbackWidget::new(FeatureConfig::new("dark-mode"))
        .with_backend(Arc::new(service(&base)))
        .with_captcha(Arc::new(StaticTokenProvider::new("tok")));
    widget.open();
    widget.select(Vote::Up);

    assert_eq!(widget.submit().await.unwrap(), SubmissionState::Submitted);
    assert!(!widget.is_open());
    assert_eq!(log.len(), 1);
}

// ── Raw endpoints ────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_request_gets_400() {
    let (base, log) = spawn_test_stub(StubConfig::default()).await;

    let resp = reqwest::get(format!("{base}/api/feedback?featureId=f&token=t"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains("rating"));
    assert!(log.is_empty());
}

#[tokio::test]
async fn submissions_endpoint_lists_recorded() {
    let (base, _log) = spawn_test_stub(StubConfig::default()).await;

    let resp = reqwest::get(format!("{base}/api/feedback?featureId=f&rating=down&token=t"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json, serde_json::json!({"success": true, "value": true}));

    let resp = reqwest::get(format!("{base}/api/submissions")).await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["kind"], "feature");
    assert_eq!(list[0]["rating"], "down");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let (base, _log) = spawn_test_stub(StubConfig::default()).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/api/submissions"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
