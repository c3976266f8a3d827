use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use answerdb_core::types::QueryRequest;

use crate::error::QueryError;
use crate::service::QueryService;

pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/api/", post(ask))
        .route("/api/reindex", post(reindex))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind and serve until ctrl-c.
pub async fn serve(service: Arc<QueryService>, host: &str, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, entries = service.entries(), "answer server listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}

async fn ask(State(service): State<Arc<QueryService>>, form: Result<Form<QueryRequest>, FormRejection>) -> Response {
    let question = match form {
        Ok(Form(QueryRequest { question: Some(q) })) => q,
        Ok(_) => return QueryError::EmptyQuestion.into_response(),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable question form");
            return QueryError::EmptyQuestion.into_response();
        }
    };
    match service.answer(&question).await {
        Ok(answer) => Json(answer.to_result()).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn reindex(State(service): State<Arc<QueryService>>) -> Response {
    match service.rebuild().await {
        Ok(report) => Json(json!({ "indexed": report.indexed, "skipped": report.skipped })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health(State(service): State<Arc<QueryService>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "entries": service.entries() }))
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self, "query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
