// src/api.rs
//! Read-only status surface: liveness, today's task progress, and the
//! Prometheus endpoint mounted by `main`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::config::CollectionConfig;
use crate::scheduler::next_collection_time;
use crate::store::{PostStore, TaskStore};
use crate::types::TaskStatus;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CollectionConfig>,
    pub tasks: Arc<dyn TaskStore>,
    pub posts: Arc<dyn PostStore>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct TaskView {
    status: TaskStatus,
    target_count: u32,
    actual_count: u32,
    started_at: Option<i64>,
    ended_at: Option<i64>,
    error_message: Option<String>,
}

#[derive(serde::Serialize)]
struct StatusResp {
    date: chrono::NaiveDate,
    task: Option<TaskView>,
    today_total: u32,
    by_source: Vec<(String, u32)>,
    next_collection_time: String,
}

async fn status(
    State(state): State<AppState>,
) -> Result<Json<StatusResp>, (StatusCode, String)> {
    let now = Utc::now();
    let date = state.config.collection_date(now);

    let task = state
        .tasks
        .get(date)
        .await
        .map_err(internal)?
        .map(|t| TaskView {
            status: t.status,
            target_count: t.target_count,
            actual_count: t.actual_count,
            started_at: t.started_at,
            ended_at: t.ended_at,
            error_message: t.error_message,
        });

    let today_total = state.posts.count_today(date).await.map_err(internal)?;
    let mut by_source: Vec<(String, u32)> = state
        .posts
        .count_today_by_source(date)
        .await
        .map_err(internal)?
        .into_iter()
        .collect();
    by_source.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(Json(StatusResp {
        date,
        task,
        today_total,
        by_source,
        next_collection_time: next_collection_time(&state.config, now).to_rfc3339(),
    }))
}

fn internal(e: crate::error::HarvestError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
