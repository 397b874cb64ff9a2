//! Reference accumulator service.
//!
//! `POST /add` stores the request body and acknowledges with the running
//! count; `GET /count` reports how many results were stored. Enough to run
//! the benchmark locally and to exercise [`HttpDeliveryClient`] in tests.
//!
//! [`HttpDeliveryClient`]: crate::delivery::HttpDeliveryClient

use crate::error::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// In-memory result store shared by the handlers.
#[derive(Debug, Default)]
pub struct Accumulator {
    results: Mutex<Vec<String>>,
}

impl Accumulator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of results stored so far.
    pub fn len(&self) -> usize {
        self.results().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every stored result, in arrival order.
    pub fn snapshot(&self) -> Vec<String> {
        self.results().clone()
    }

    fn push(&self, result: String) -> usize {
        let mut results = self.results();
        results.push(result);
        results.len()
    }

    // A push cannot leave the vector half-written, so a poisoned lock still
    // guards consistent data.
    fn results(&self) -> MutexGuard<'_, Vec<String>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the accumulator's routes over `state`.
pub fn router(state: Arc<Accumulator>) -> Router {
    Router::new()
        .route("/add", post(add))
        .route("/count", get(count))
        .with_state(state)
}

async fn add(
    State(state): State<Arc<Accumulator>>,
    body: String,
) -> std::result::Result<Json<Value>, StatusCode> {
    if body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let count = state.push(body);
    debug!(count, "result stored");
    Ok(Json(json!({ "status": "ok", "count": count })))
}

async fn count(State(state): State<Arc<Accumulator>>) -> Json<Value> {
    Json(json!({ "count": state.len() }))
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: Arc<Accumulator>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "accumulator listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
