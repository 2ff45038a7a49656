use async_trait::async_trait;
use thiserror::Error;

use super::records::{AssignmentRecord, AssignmentStatus, TaskRecord, TaskStatus, UserRecord};
use crate::matching::scoring::MatchResult;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    /// 任务已被并发的分配流程抢先占用。
    #[error("task already claimed: {0}")]
    ClaimLost(String),
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// 分配持久化端口。状态的正本在实现方（Postgres 或内存）。
///
/// `claim_and_assign` 是唯一的串行化点：任务状态从 unassigned 翻到
/// assigned、创建 Assignment、追加到用户 active_tasks 三步必须原子完成，
/// 条件更新失败以 `ClaimLost` 返回，调用方按"已被占用"跳过。
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// 按 id 批量取任务，不存在的 id 静默缺席；状态甄别留给调用方，
    /// 以便区分"不存在"与"状态不符"。
    async fn find_tasks_by_ids(&self, ids: &[String]) -> Result<Vec<TaskRecord>, StoreError>;

    async fn find_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<TaskRecord>, StoreError>;

    async fn find_task_by_id(&self, id: &str) -> Result<Option<TaskRecord>, StoreError>;

    async fn find_all_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_assignment_by_id(&self, id: &str)
        -> Result<Option<AssignmentRecord>, StoreError>;

    /// 原子占用：条件翻转任务状态 + 写入 Assignment + 更新 active_tasks。
    async fn claim_and_assign(
        &self,
        task_id: &str,
        user_id: &str,
        result: &MatchResult,
    ) -> Result<AssignmentRecord, StoreError>;

    /// 推进 Assignment 状态机，并同步任务状态与用户 active_tasks：
    /// completed → 任务 completed；rejected → 任务 rejected；
    /// cancelled → 任务回到 unassigned。非法迁移返回 `InvalidTransition`。
    async fn transition_assignment(
        &self,
        id: &str,
        to: AssignmentStatus,
    ) -> Result<AssignmentRecord, StoreError>;

    /// 删除任务并级联删除其全部 Assignment。
    async fn delete_task(&self, id: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
