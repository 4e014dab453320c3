use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use super::evaluate::evaluate_request;
use super::models::{ErrorResponse, EvaluateRequest, EvaluateResponse};
use super::state::{ServerState, SharedEngine};
use crate::answer_key::AnswerKey;
use crate::evaluator::Evaluator;
use crate::ocr::TesseractEngine;
use crate::settings::Settings;

pub async fn run_server(settings: Settings, addr: String) -> Result<()> {
    let engine: SharedEngine = Box::new(TesseractEngine::new(
        settings.tesseract_program.clone(),
        settings.tesseract_psm,
    ));
    let state = Arc::new(ServerState {
        evaluator: Evaluator::new(engine, settings),
    });
    let app = Router::new()
        .route("/health", get(health))
        .route("/answer-key", get(answer_key))
        .route("/evaluate", post(evaluate))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!(%addr, "exam grader listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn answer_key(State(state): State<Arc<ServerState>>) -> Json<AnswerKey> {
    Json(state.evaluator.answer_key().clone())
}

async fn evaluate(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, (StatusCode, Json<ErrorResponse>)> {
    // OCR shells out and blocks; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || evaluate_request(state.as_ref(), payload))
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("server task failed: {}", err),
                }),
            )
        })?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(err) => Err((err.status, Json(ErrorResponse { error: err.message }))),
    }
}
