// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface tests driven through the axum router with `oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{TestNode, TestPanel};
use filenode_core::domain::envelope::Envelope;
use filenode_core::domain::protocol::*;
use filenode_core::presentation::app;
use serde_json::{json, Value};
use tower::ServiceExt;

const BODY_LIMIT: usize = 64 * 1024;

fn router(node: &TestNode) -> Router {
    app(node.app_state(), BODY_LIMIT)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn post_envelope(uri: &str, envelope: &Envelope) -> Request<Body> {
    post(uri, serde_json::to_vec(envelope).unwrap())
}

fn post_form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn form_encode(envelope: &Envelope) -> String {
    let escape = |value: &str| {
        value
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
                other => format!("%{other:02X}"),
            })
            .collect::<String>()
    };
    format!("encrypted={}&key={}", escape(&envelope.encrypted), escape(&envelope.key))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_landing_page_before_and_after_pairing() {
    let node = TestNode::start();
    let panel = TestPanel::new();

    let (status, body) = send(router(&node), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["publickey"], json!(node.public_key().as_str()));

    let (status, body) = send(router(&node), post_envelope("/init", &panel.pair_request(&node.public_key()))).await;
    assert_eq!(status, StatusCode::OK);
    let envelope: Envelope = serde_json::from_slice(&body).unwrap();
    let reply = panel.open(&NodeResponse::Sealed(envelope));
    assert!(reply.success);

    let (status, body) = send(router(&node), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), MSG_USE_PANEL);
}

#[tokio::test]
async fn test_lenient_bodies_report_missing_message() {
    let node = TestNode::start();

    for body in ["", "not json", "{\"encrypted\": \"abc\"}", "{\"encrypted\": \"\", \"key\": \"\"}"] {
        for uri in ["/init", "/files/view", "/files/delete", "/files/upload"] {
            let (status, bytes) = send(router(&node), post(uri, body)).await;
            assert_eq!(status, StatusCode::OK, "{uri} {body:?}");

            let reply: Reply = serde_json::from_slice(&bytes).unwrap();
            assert!(!reply.success);
            assert_eq!(reply.message.as_deref(), Some(MSG_MISSING_MESSAGE), "{uri} {body:?}");
        }
    }
}

#[tokio::test]
async fn test_form_encoded_envelopes_are_accepted() {
    let node = TestNode::start();
    let panel = TestPanel::new();

    let request = post_form("/init", form_encode(&panel.pair_request(&node.public_key())));
    let (status, body) = send(router(&node), request).await;
    assert_eq!(status, StatusCode::OK);
    let reply = panel.open(&NodeResponse::Sealed(serde_json::from_slice(&body).unwrap()));
    assert!(reply.success);

    std::fs::write(node.sandbox.path().join("form.txt"), b"f").unwrap();
    let envelope = panel.seal(&node.public_key(), &json!({"path": "/"}));
    let (_, body) = send(router(&node), post_form("/files/view", form_encode(&envelope))).await;
    let reply = panel.open(&NodeResponse::Sealed(serde_json::from_slice(&body).unwrap()));
    assert_eq!(reply.files, Some(vec!["form.txt".to_string()]));

    for body in ["", "encrypted=abc", "garbage&&=="] {
        let (status, bytes) = send(router(&node), post_form("/files/view", body.to_string())).await;
        assert_eq!(status, StatusCode::OK, "{body:?}");
        let reply: Reply = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(reply.message.as_deref(), Some(MSG_MISSING_MESSAGE), "{body:?}");
    }
}

#[tokio::test]
async fn test_oversized_form_body_is_refused() {
    let node = TestNode::start();

    let oversized = format!("encrypted={}&key=k", "x".repeat(BODY_LIMIT));
    let (status, _) = send(router(&node), post_form("/init", oversized)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unpaired_file_routes_ask_for_reconnect() {
    let node = TestNode::start();
    let panel = TestPanel::new();

    let envelope = panel.seal(&node.public_key(), &json!({"path": "/"}));
    let (status, body) = send(router(&node), post_envelope("/files/view", &envelope)).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["reconnect"], json!(true));
}

#[tokio::test]
async fn test_file_routes_round_trip_sealed_replies() {
    let node = TestNode::start();
    let panel = TestPanel::new();
    send(router(&node), post_envelope("/init", &panel.pair_request(&node.public_key()))).await;

    let descriptor = serde_json::to_string(&UploadDescriptor::new("hello.txt", b"hello".to_vec())).unwrap();
    let envelope = panel.seal(&node.public_key(), &json!({"path": "/", "file": descriptor}));
    let (_, body) = send(router(&node), post_envelope("/files/upload", &envelope)).await;
    let reply = panel.open(&NodeResponse::Sealed(serde_json::from_slice(&body).unwrap()));
    assert_eq!(reply.message.as_deref(), Some(MSG_FILE_SAVED));

    let envelope = panel.seal(&node.public_key(), &json!({"path": "/"}));
    let (_, body) = send(router(&node), post_envelope("/files/view", &envelope)).await;
    let reply = panel.open(&NodeResponse::Sealed(serde_json::from_slice(&body).unwrap()));
    assert_eq!(reply.files, Some(vec!["hello.txt".to_string()]));

    let envelope = panel.seal(&node.public_key(), &json!({"path": "/", "file": "hello.txt"}));
    let (_, body) = send(router(&node), post_envelope("/files/delete", &envelope)).await;
    let reply = panel.open(&NodeResponse::Sealed(serde_json::from_slice(&body).unwrap()));
    assert_eq!(reply.message.as_deref(), Some(MSG_FILE_DELETED));
    assert!(!node.sandbox.path().join("hello.txt").exists());
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let node = TestNode::start();

    let oversized = vec![b'x'; BODY_LIMIT + 1];
    let (status, _) = send(router(&node), post("/init", oversized)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health_reports_uptime() {
    let node = TestNode::start();

    let (status, body) = send(router(&node), get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], json!("healthy"));
    assert!(value["uptime_seconds"].is_u64());
}
