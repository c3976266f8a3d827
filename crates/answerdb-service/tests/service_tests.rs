#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use answerdb_core::config::Settings;
use answerdb_core::traits::Embedder;
use answerdb_embed::FakeEmbedder;
use answerdb_exec::ExecutionOutcome;
use answerdb_service::{load_or_build, router, Answer, IndexSources, QueryError, QueryService, NO_MATCH_MESSAGE};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// GA1: two solved questions. GA2: one question without a script.
fn fixture() -> (TempDir, Settings) {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    write(&repo.join("GA1/q1.txt"), "what is 2+2?\n");
    write(&repo.join("GA1/q1.sh"), "echo 4\n");
    write(&repo.join("GA1/q2.txt"), "what is the capital of France?");
    write(&repo.join("GA1/q2.sh"), "echo Paris\n");
    write(&repo.join("GA2/q3.txt"), "which planet is largest?");

    let mut settings = Settings::default();
    settings.corpus.root = repo.display().to_string();
    settings.index.path = tmp.path().join("embeddings.json").display().to_string();
    settings.exec.timeout_secs = 5;
    (tmp, settings)
}

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(FakeEmbedder::new(64))
}

fn start(tmp: &TempDir, settings: &Settings) -> QueryService {
    QueryService::start(settings, tmp.path(), embedder()).unwrap()
}

#[tokio::test]
async fn matched_question_runs_its_solution() {
    let (tmp, settings) = fixture();
    let service = start(&tmp, &settings);

    let answer = service.answer("what is 2+2?").await.unwrap();

    match &answer {
        Answer::Solved { matched, outcome } => {
            assert_eq!(matched.matched_question, "what is 2+2?");
            assert_eq!(outcome, &ExecutionOutcome::Completed { output: "4".to_string(), exit_code: Some(0) });
        }
        other => panic!("expected a solved answer, got {:?}", other),
    }
    assert_eq!(answer.text(), "4");
    assert!(!answer.is_degraded());
    assert_eq!(service.answer("what is the capital of France?").await.unwrap().text(), "Paris");
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let (tmp, settings) = fixture();
    let service = start(&tmp, &settings);

    for question in ["", "   \n"] {
        let err = service.answer(question).await.unwrap_err();
        assert!(matches!(err, QueryError::EmptyQuestion));
        assert!(err.is_client_error());
    }
}

#[tokio::test]
async fn nearest_question_without_script_is_no_match() {
    let (tmp, settings) = fixture();
    let service = start(&tmp, &settings);

    let answer = service.answer("which planet is largest?").await.unwrap();

    match &answer {
        Answer::NoMatch { nearest: Some(nearest) } => assert_eq!(nearest.matched_question, "which planet is largest?"),
        other => panic!("expected no match, got {:?}", other),
    }
    assert_eq!(answer.text(), NO_MATCH_MESSAGE);
}

#[tokio::test]
async fn empty_corpus_never_matches() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("repo/GA1")).unwrap();
    let mut settings = Settings::default();
    settings.corpus.root = tmp.path().join("repo").display().to_string();
    settings.index.path = tmp.path().join("embeddings.json").display().to_string();
    let service = start(&tmp, &settings);

    assert_eq!(service.entries(), 0);
    let answer = service.answer("anything at all").await.unwrap();
    assert_eq!(answer, Answer::NoMatch { nearest: None });
}

#[test]
fn persisted_index_is_reused_until_embedder_changes() {
    let (tmp, settings) = fixture();
    let sources = IndexSources::from_settings(&settings, tmp.path());

    let (built, report) = load_or_build(&sources, &FakeEmbedder::new(64), false).unwrap();
    let report = report.expect("first call builds");
    assert_eq!(report.indexed, 3);
    assert!(sources.index_path.exists());

    let (loaded, report) = load_or_build(&sources, &FakeEmbedder::new(64), false).unwrap();
    assert!(report.is_none(), "second call loads from disk");
    assert_eq!(loaded, built);

    let (rebuilt, report) = load_or_build(&sources, &FakeEmbedder::new(32), false).unwrap();
    assert!(report.is_some(), "different embedder forces a rebuild");
    assert_eq!(rebuilt.dimension(), 32);

    let (_, report) = load_or_build(&sources, &FakeEmbedder::new(32), true).unwrap();
    assert!(report.is_some(), "forced rebuild ignores the saved file");
}

#[test]
fn missing_corpus_root_fails_the_build() {
    let tmp = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.corpus.root = tmp.path().join("nope").display().to_string();
    settings.index.path = tmp.path().join("embeddings.json").display().to_string();

    let err = QueryService::start(&settings, tmp.path(), embedder()).err().unwrap();
    assert!(matches!(err, QueryError::Corpus(_)));
}

#[tokio::test]
async fn rebuild_swaps_in_new_questions() {
    let (tmp, settings) = fixture();
    let service = start(&tmp, &settings);
    let before = service.snapshot();

    let repo = tmp.path().join("repo");
    write(&repo.join("GA2/q4.txt"), "how many legs does a spider have");
    write(&repo.join("GA2/q4.sh"), "echo 8\n");
    let report = service.rebuild().await.unwrap();

    assert_eq!(report.indexed, 4);
    assert_eq!(before.len(), 3, "earlier snapshot is untouched");
    assert_eq!(service.entries(), 4);
    assert_eq!(service.answer("how many legs does a spider have").await.unwrap().text(), "8");
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn http_answer_returns_script_output() {
    let (tmp, settings) = fixture();
    let app = router(Arc::new(start(&tmp, &settings)));

    let response = app.oneshot(form_post("/api/", "question=what%20is%202%2B2%3F")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "answer": "4" }));
}

#[tokio::test]
async fn http_missing_question_is_bad_request() {
    let (tmp, settings) = fixture();
    let app = router(Arc::new(start(&tmp, &settings)));

    for body in ["", "other=1", "question="] {
        let response = app.clone().oneshot(form_post("/api/", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(body_json(response).await, serde_json::json!({ "error": "Question is required" }));
    }
}

#[tokio::test]
async fn http_health_and_reindex() {
    let (tmp, settings) = fixture();
    let app = router(Arc::new(start(&tmp, &settings)));

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(health).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "status": "ok", "entries": 3 }));

    let response = app.oneshot(form_post("/api/reindex", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "indexed": 3, "skipped": 0 }));
}

#[tokio::test]
async fn answers_serialize_as_answer_bodies() {
    let (tmp, settings) = fixture();
    let service = start(&tmp, &settings);

    let solved = service.answer("what is 2+2?").await.unwrap();
    let unsolved = service.answer("which planet is largest?").await.unwrap();

    assert_eq!(serde_json::to_value(solved.to_result()).unwrap(), serde_json::json!({ "answer": "4" }));
    assert_eq!(serde_json::to_value(unsolved.to_result()).unwrap(), serde_json::json!({ "answer": NO_MATCH_MESSAGE }));
}

#[tokio::test]
async fn http_no_match_is_still_ok() {
    let (tmp, settings) = fixture();
    let app = router(Arc::new(start(&tmp, &settings)));

    let response = app.oneshot(form_post("/api/", "question=which+planet+is+largest%3F")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "answer": NO_MATCH_MESSAGE }));
}

#[tokio::test]
async fn abandoned_rebuild_still_swaps_what_it_saved() {
    let (tmp, settings) = fixture();
    let service = start(&tmp, &settings);
    let repo = tmp.path().join("repo");
    write(&repo.join("GA2/q4.txt"), "how many legs does a spider have");
    write(&repo.join("GA2/q4.sh"), "echo 8\n");

    // The caller gives up right away, as a disconnected HTTP client would.
    let _ = tokio::time::timeout(Duration::ZERO, service.rebuild()).await;

    let deadline = Instant::now() + Duration::from_secs(5);
    while service.entries() != 4 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(service.entries(), 4);
    let saved = answerdb_index::load(&service.sources().index_path).unwrap();
    assert_eq!(saved.len(), 4, "file on disk matches the served index");
    assert_eq!(service.rebuild().await.unwrap().indexed, 4, "rebuild lock was released");
}
