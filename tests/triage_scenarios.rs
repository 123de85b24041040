//! End-to-end pipeline scenarios against a mocked mailbox and stubbed
//! classification/draft services

mod common;

use std::sync::Arc;

use common::{test_message, verdict_json, MockGmail, MockTokens};
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use squire_triage::classifier::ClassifierClient;
use squire_triage::client::LabelInfo;
use squire_triage::draft::DraftClient;
use squire_triage::models::ActionOutcome;
use squire_triage::state::Checkpoint;
use squire_triage::{Credential, PipelineSettings, TriagePipeline};

fn tokens_ok() -> MockTokens {
    let mut tokens = MockTokens::new();
    tokens
        .expect_authenticate()
        .returning(|_| Ok(Credential::new("bearer-token")));
    tokens
}

fn pipeline(
    gmail: MockGmail,
    tokens: MockTokens,
    server: &MockServer,
    dir: &TempDir,
) -> TriagePipeline {
    TriagePipeline::new(
        Arc::new(gmail),
        Arc::new(tokens),
        ClassifierClient::new(format!("{}/classify", server.uri())).unwrap(),
        DraftClient::new(format!("{}/drafts", server.uri())).unwrap(),
        Checkpoint::new(dir.path().join("state.json")),
        PipelineSettings {
            user_id: "user-1".to_string(),
            label_base: "Exec Scout".to_string(),
            max_messages_per_run: 10,
        },
    )
}

#[tokio::test]
async fn warm_intro_is_labeled_and_draft_is_requested() {
    let mut gmail = MockGmail::new();
    gmail
        .expect_list_message_ids()
        .times(1)
        .returning(|_, _| Ok(vec!["m1".to_string()]));
    gmail.expect_get_message().times(1).returning(|id| {
        Ok(test_message(
            id,
            "Sam Lee <sam@example.com>",
            "Intro: Sam <> you",
            "Hi both, connecting you two.\n\nBest,\nSam",
        ))
    });
    gmail
        .expect_list_labels()
        .times(1)
        .returning(|| Ok(vec![]));
    gmail
        .expect_create_label()
        .withf(|name| name == "Exec Scout/warm_intro")
        .times(1)
        .returning(|name| {
            Ok(LabelInfo {
                id: "Label_10".to_string(),
                name: name.to_string(),
            })
        });
    // draft_response keeps the message in the inbox
    gmail
        .expect_modify_labels()
        .withf(|id, add, remove| id == "m1" && add == ["Label_10"] && remove.is_empty())
        .times(1)
        .returning(|_, _, _| Ok(()));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_partial_json(serde_json::json!({
            "id": "m1",
            "user_id": "user-1",
            "sender": "Sam Lee <sam@example.com>"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(verdict_json(
            "m1",
            "warm_intro",
            "draft_response",
            Some("log-42"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/drafts"))
        .and(header("authorization", "Bearer bearer-token"))
        .and(body_json(serde_json::json!({
            "userId": "user-1",
            "gmailMessageId": "m1",
            "classificationId": "log-42",
            "llmSummary": "Summary of m1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "d-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(gmail, tokens_ok(), &server, &dir);

    let result = pipeline.run(false).await.unwrap();
    assert_eq!(result.processed_ids, vec!["m1"]);
    assert_eq!(
        result.outcomes[0].outcome,
        ActionOutcome::LabeledAndDraftRequested {
            label: "Exec Scout/warm_intro".to_string(),
            draft_id: Some("d-1".to_string())
        }
    );
    assert!(result.checkpoint_advanced);
}

#[tokio::test]
async fn spam_is_trashed_without_touching_labels() {
    let mut gmail = MockGmail::new();
    gmail
        .expect_list_message_ids()
        .times(1)
        .returning(|_, _| Ok(vec!["m2".to_string()]));
    gmail.expect_get_message().times(1).returning(|id| {
        Ok(test_message(
            id,
            "win@lottery.example",
            "You won!!!",
            "Claim your prize now",
        ))
    });
    gmail
        .expect_trash_message()
        .withf(|id| id == "m2")
        .times(1)
        .returning(|_| Ok(()));
    gmail.expect_list_labels().times(0);
    gmail.expect_create_label().times(0);
    gmail.expect_modify_labels().times(0);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(verdict_json("m2", "spam", "delete", Some("log-1"))),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(gmail, tokens_ok(), &server, &dir);

    let result = pipeline.run(false).await.unwrap();
    assert_eq!(result.outcomes[0].outcome, ActionOutcome::Trashed);
}

#[tokio::test]
async fn label_cache_is_reused_across_runs() {
    let mut gmail = MockGmail::new();
    gmail
        .expect_list_message_ids()
        .times(2)
        .returning(|_, _| Ok(vec!["m3".to_string()]));
    gmail.expect_get_message().times(2).returning(|id| {
        Ok(test_message(
            id,
            "bot@pitch.example",
            "Grow your pipeline",
            "Our AI tool books meetings for you",
        ))
    });
    // Resolved once, then served from the cache on the second run
    gmail
        .expect_list_labels()
        .times(1)
        .returning(|| Ok(vec![]));
    gmail
        .expect_create_label()
        .times(1)
        .returning(|name| {
            Ok(LabelInfo {
                id: "Label_11".to_string(),
                name: name.to_string(),
            })
        });
    gmail
        .expect_modify_labels()
        .withf(|_, add, remove| add == ["Label_11"] && remove == ["INBOX"])
        .times(2)
        .returning(|_, _, _| Ok(()));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(verdict_json("m3", "ai_pitch", "label_only", Some("log-2"))),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(gmail, tokens_ok(), &server, &dir);

    let first = pipeline.run(false).await.unwrap();
    let second = pipeline.run(false).await.unwrap();
    assert!(first.checkpoint_advanced);
    assert!(second.checkpoint_advanced);
    assert_eq!(
        second.outcomes[0].outcome,
        ActionOutcome::LabeledAndArchived {
            label: "Exec Scout/ai_pitch".to_string()
        }
    );
}

#[tokio::test]
async fn second_run_scans_only_after_the_checkpoint() {
    let mut gmail = MockGmail::new();
    let mut calls = 0u32;
    gmail
        .expect_list_message_ids()
        .times(2)
        .returning_st(move |query, _| {
            calls += 1;
            if calls == 1 {
                assert!(!query.contains("after:"));
            } else {
                assert!(query.contains("after:"));
            }
            Ok(vec![])
        });

    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(gmail, tokens_ok(), &server, &dir);

    pipeline.run(false).await.unwrap();
    pipeline.run(false).await.unwrap();
}

#[tokio::test]
async fn unrecognized_action_leaves_the_message_untouched() {
    let mut gmail = MockGmail::new();
    gmail
        .expect_list_message_ids()
        .times(1)
        .returning(|_, _| Ok(vec!["m4".to_string()]));
    gmail
        .expect_get_message()
        .times(1)
        .returning(|id| Ok(test_message(id, "a@example.com", "s", "body")));
    gmail.expect_trash_message().times(0);
    gmail.expect_modify_labels().times(0);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verdict_json(
            "m4",
            "other",
            "escalate_to_human",
            None,
        )))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(gmail, tokens_ok(), &server, &dir);

    let result = pipeline.run(false).await.unwrap();
    assert_eq!(result.outcomes[0].outcome, ActionOutcome::NoOp);
    assert!(result.checkpoint_advanced);
}
