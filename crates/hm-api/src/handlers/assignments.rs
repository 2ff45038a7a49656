use axum::{
    extract::{Path, State},
    Json,
};

use hm_common::api::{AssignBatchRequest, AssignmentResponse};
use hm_common::assignment::{AssignmentRecord, BatchAssignOutcome};

use super::populate;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

/// POST /api/assignments/assign
pub async fn assign_batch(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<AssignBatchRequest>,
) -> Result<Json<BatchAssignOutcome>, ApiError> {
    if request.task_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "task_ids must be a non-empty array".into(),
        ));
    }

    let outcome = state
        .service
        .assign_batch(&request.task_ids, request.auto_assign)
        .await?;

    Ok(Json(outcome))
}

/// POST /api/assignments/assign/:task_id/:user_id
pub async fn assign_manual(
    State(state): State<SharedState>,
    Path((task_id, user_id)): Path<(String, String)>,
    _auth: AuthUser,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = state.service.assign_manual(&task_id, &user_id).await?;
    Ok(Json(populate(&state, assignment).await?))
}

pub async fn start(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<AssignmentRecord>, ApiError> {
    Ok(Json(state.service.start_assignment(&id).await?))
}

pub async fn complete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<AssignmentRecord>, ApiError> {
    Ok(Json(state.service.complete_assignment(&id).await?))
}

pub async fn reject(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<AssignmentRecord>, ApiError> {
    Ok(Json(state.service.reject_assignment(&id).await?))
}

pub async fn cancel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<AssignmentRecord>, ApiError> {
    Ok(Json(state.service.cancel_assignment(&id).await?))
}
