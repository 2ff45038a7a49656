pub mod assignments;
pub mod health;
pub mod tasks;

use hm_common::api::{AssignmentResponse, UserSummary};
use hm_common::assignment::AssignmentRecord;

use crate::error::ApiError;
use crate::SharedState;

/// 补全响应里的任务与用户摘要。记录刚写入，读不到视为内部错误。
pub(crate) async fn populate(
    state: &SharedState,
    assignment: AssignmentRecord,
) -> Result<AssignmentResponse, ApiError> {
    let task = state
        .store
        .find_task_by_id(&assignment.task_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("task {} vanished", assignment.task_id)))?;
    let user = state
        .store
        .find_user_by_id(&assignment.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("user {} vanished", assignment.user_id)))?;

    Ok(AssignmentResponse {
        task,
        user: UserSummary::from(&user),
        assignment,
    })
}
