use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use hm_common::api::AssignmentResponse;
use hm_common::matching::{RankedTask, DEFAULT_RECOMMENDATION_LIMIT};

use super::populate;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

const fn default_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

/// GET /api/tasks/recommended：当前用户的任务推荐。
pub async fn recommended(
    State(state): State<SharedState>,
    Query(query): Query<RecommendQuery>,
    auth: AuthUser,
) -> Result<Json<Vec<RankedTask>>, ApiError> {
    let user_id = auth.user_id()?;
    let limit = query.limit.clamp(1, 50);

    let ranked = state.service.recommend_for_user(user_id, limit).await?;
    Ok(Json(ranked))
}

/// POST /api/tasks/choose/:task_id：当前用户自选一个未分配任务。
pub async fn choose(
    State(state): State<SharedState>,
    Path(task_id): Path<String>,
    auth: AuthUser,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let user_id = auth.user_id()?;

    let assignment = state.service.choose_task(user_id, &task_id).await?;
    Ok(Json(populate(&state, assignment).await?))
}

/// DELETE /api/tasks/:id：删除任务并级联其 assignment。
pub async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    _auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.service.delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
