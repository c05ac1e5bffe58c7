use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use kbcore::persist::{build_bundle, load_dataset, save_bundle, DataPaths, ANSWER_FIELD};
use kbcore::tfidf::TfidfParams;
use kbcore::Normalizer;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_kb(dir: &std::path::Path) -> DataPaths {
    let paths = DataPaths::new(dir);
    fs::write(
        paths.dataset(),
        concat!(
            "{\"Doc_ID\": \"K1\", \"Answer_Snippet\": \"Deposit limits can be set in the account settings.\"}\n",
            "{\"Doc_ID\": \"K2\", \"Answer_Snippet\": \"Bonus wagering requirements apply to every promotion.\"}\n",
        ),
    )
    .unwrap();
    let records = load_dataset(&paths.dataset()).unwrap();
    let bundle = build_bundle(
        &records,
        &[ANSWER_FIELD.to_string()],
        TfidfParams::default(),
        &Normalizer::default(),
        "2024-01-01T00:00:00Z".into(),
    );
    save_bundle(&paths.bundle(), &bundle).unwrap();
    paths
}

fn app() -> (tempfile::TempDir, Router) {
    let dir = tempdir().unwrap();
    let paths = build_tiny_kb(dir.path());
    let app = server::build_app(&paths).unwrap();
    (dir, app)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Bytes) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

fn json_of(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn ask_returns_best_document() {
    let (_dir, app) = app();
    let (status, body) = call(&app, "POST", "/ask", Some(json!({ "question": "how do I limit my deposits" }))).await;
    assert_eq!(status, StatusCode::OK);
    let json = json_of(&body);
    assert_eq!(json["doc_id"], "K1");
    assert!(json["answer"].as_str().unwrap().starts_with("Deposit limits"));
    assert!(json["took_s"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn ask_rejects_non_string_questions() {
    let (_dir, app) = app();
    for q in [json!(5), json!(null), json!(["bonus"])] {
        let (status, body) = call(&app, "POST", "/ask", Some(json!({ "question": q }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_of(&body)["error"].as_str().unwrap().contains("must be a string"));
    }
    let (status, _) = call(&app, "POST", "/ask", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chats_keep_their_own_history() {
    let (_dir, app) = app();
    let (status, body) = call(&app, "POST", "/chats", Some(json!({ "username": "sam" }))).await;
    assert_eq!(status, StatusCode::OK);
    let chat_id = json_of(&body)["chat_id"].as_str().unwrap().to_string();
    let (_, body) = call(&app, "POST", "/chats", None).await;
    let other = json_of(&body)["chat_id"].as_str().unwrap().to_string();

    let uri = format!("/chats/{chat_id}/ask");
    let (status, body) = call(&app, "POST", &uri, Some(json!({ "question": "bonus wagering?" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["doc_id"], "K2");

    let (_, body) = call(&app, "GET", &format!("/chats/{chat_id}/history"), None).await;
    let entries = json_of(&body);
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert_eq!(entries[0], json!({ "speaker": "sam", "text": "bonus wagering?" }));
    assert_eq!(entries[1]["speaker"], "Chatbot V0.1");

    let (_, body) = call(&app, "GET", &format!("/chats/{other}/history"), None).await;
    assert!(json_of(&body).as_array().unwrap().is_empty());

    let (_, body) = call(&app, "GET", "/chats", None).await;
    assert_eq!(json_of(&body), json!([chat_id, other]));

    let (status, _) = call(&app, "DELETE", &format!("/chats/{chat_id}/history"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&app, "GET", &format!("/chats/{chat_id}/history"), None).await;
    assert!(json_of(&body).as_array().unwrap().is_empty());
}

#[tokio::test]
async fn user_history_spans_chats() {
    let (_dir, app) = app();
    let mut ids = Vec::new();
    for _ in 0..2 {
        let (_, body) = call(&app, "POST", "/chats", Some(json!({ "username": "kim" }))).await;
        ids.push(json_of(&body)["chat_id"].as_str().unwrap().to_string());
    }
    call(&app, "POST", &format!("/chats/{}/ask", ids[0]), Some(json!({ "question": "deposit limits" }))).await;
    call(&app, "POST", &format!("/chats/{}/ask", ids[1]), Some(json!({ "question": "bonus" }))).await;

    let (status, body) = call(&app, "GET", "/users/kim/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!(["deposit limits", "bonus"]));

    // Clearing a transcript keeps the user's questions.
    call(&app, "DELETE", &format!("/chats/{}/history", ids[0]), None).await;
    let (_, body) = call(&app, "GET", "/users/kim/history", None).await;
    assert_eq!(json_of(&body).as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "DELETE", "/users/kim/history", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&app, "GET", "/users/kim/history", None).await;
    assert!(json_of(&body).as_array().unwrap().is_empty());

    let (status, _) = call(&app, "GET", "/users/nobody/history", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_chats_do_not_interfere() {
    let (_dir, app) = app();
    let mut ids = Vec::new();
    for i in 0..8 {
        let (_, body) = call(&app, "POST", "/chats", Some(json!({ "username": format!("u{i}") }))).await;
        ids.push(json_of(&body)["chat_id"].as_str().unwrap().to_string());
    }

    let mut tasks = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let app = app.clone();
        let id = id.clone();
        tasks.push(tokio::spawn(async move {
            let question = if i % 2 == 0 { "deposit limits" } else { "bonus wagering" };
            for _ in 0..5 {
                let (status, _) = call(&app, "POST", &format!("/chats/{id}/ask"), Some(json!({ "question": question }))).await;
                assert_eq!(status, StatusCode::OK);
                let (status, _) = call(&app, "GET", &format!("/chats/{id}/history"), None).await;
                assert_eq!(status, StatusCode::OK);
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    for (i, id) in ids.iter().enumerate() {
        let (_, body) = call(&app, "GET", &format!("/chats/{id}/history"), None).await;
        let entries = json_of(&body);
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 10);
        assert!(entries.iter().step_by(2).all(|e| e["speaker"] == format!("u{i}")));
    }
}

#[tokio::test]
async fn unknown_chats_and_docs_are_404() {
    let (_dir, app) = app();
    let missing = "00000000-0000-4000-8000-000000000000";
    let (status, _) = call(&app, "GET", &format!("/chats/{missing}/history"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "POST", &format!("/chats/{missing}/ask"), Some(json!({ "question": "hi" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "GET", "/doc/NOPE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "GET", "/doc/K2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["doc_id"], "K2");
}

#[tokio::test]
async fn health_is_ok() {
    let (_dir, app) = app();
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}
