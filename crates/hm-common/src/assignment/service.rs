use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::records::{AssignmentRecord, AssignmentStatus, TaskStatus};
use super::store::{AssignmentStore, StoreError};
use crate::matching::ranking::{RankedTask, RankedUser};
use crate::matching::scoring::{MatchEngine, MatchResult};

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("assignment not found: {0}")]
    AssignmentNotFound(String),
    #[error("task is not unassigned: {0}")]
    TaskNotAvailable(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 批处理中单个任务的处理结果。一个任务失败不影响其余任务。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskAssignOutcome {
    /// auto_assign=true 且占用成功
    Assigned {
        task_id: String,
        assignment: AssignmentRecord,
    },
    /// auto_assign=false 的预览：最佳匹配 + 最多三位备选，无任何写入
    Preview {
        task_id: String,
        best: CandidateMatch,
        alternatives: Vec<CandidateMatch>,
    },
    /// 任务 id 未解析
    NotFound { task_id: String },
    /// 任务不在 unassigned 状态，或被并发批次抢先占用
    Skipped { task_id: String, reason: String },
    Failed { task_id: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub user_id: String,
    pub user_name: String,
    pub result: MatchResult,
}

impl From<&RankedUser> for CandidateMatch {
    fn from(ranked: &RankedUser) -> Self {
        Self {
            user_id: ranked.user.id.clone(),
            user_name: ranked.user.name.clone(),
            result: ranked.result,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAssignOutcome {
    pub results: Vec<TaskAssignOutcome>,
}

/// 备选展示数量（最佳匹配之外）。
const ALTERNATIVE_LIMIT: usize = 3;

/// 分配编排器：消费评分/排序引擎，经由持久化端口产生副作用。
#[derive(Clone)]
pub struct AssignmentService {
    engine: MatchEngine,
    store: Arc<dyn AssignmentStore>,
}

impl AssignmentService {
    pub fn new(engine: MatchEngine, store: Arc<dyn AssignmentStore>) -> Self {
        Self { engine, store }
    }

    /// 批量分配。每个任务独立取最佳匹配用户；auto_assign=false 时
    /// 只返回预览，不发生任何写入。
    #[instrument(skip(self, task_ids), fields(task_count = task_ids.len(), auto_assign))]
    pub async fn assign_batch(
        &self,
        task_ids: &[String],
        auto_assign: bool,
    ) -> Result<BatchAssignOutcome, AssignError> {
        let tasks = self.store.find_tasks_by_ids(task_ids).await?;
        let users = self.store.find_all_users().await?;

        let by_id: HashMap<&str, &super::records::TaskRecord> =
            tasks.iter().map(|task| (task.id.as_str(), task)).collect();

        let mut results = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            let Some(task) = by_id.get(task_id.as_str()) else {
                results.push(TaskAssignOutcome::NotFound {
                    task_id: task_id.clone(),
                });
                continue;
            };
            if task.status != TaskStatus::Unassigned {
                results.push(TaskAssignOutcome::Skipped {
                    task_id: task_id.clone(),
                    reason: "task is not unassigned".into(),
                });
                continue;
            }

            let ranked = self.engine.rank_users_for_task(&task.definition, &users);
            let Some(best) = ranked.first() else {
                results.push(TaskAssignOutcome::Failed {
                    task_id: task_id.clone(),
                    error: "no candidate users available".into(),
                });
                continue;
            };

            if !auto_assign {
                results.push(TaskAssignOutcome::Preview {
                    task_id: task_id.clone(),
                    best: CandidateMatch::from(best),
                    alternatives: ranked
                        .iter()
                        .skip(1)
                        .take(ALTERNATIVE_LIMIT)
                        .map(CandidateMatch::from)
                        .collect(),
                });
                continue;
            }

            match self
                .store
                .claim_and_assign(task_id, &best.user.id, &best.result)
                .await
            {
                Ok(assignment) => {
                    info!(
                        task_id = %task_id,
                        user_id = %best.user.id,
                        score = assignment.final_score,
                        "task auto-assigned"
                    );
                    results.push(TaskAssignOutcome::Assigned {
                        task_id: task_id.clone(),
                        assignment,
                    });
                }
                Err(StoreError::ClaimLost(_)) => {
                    // 并发批次赢得了占用，按已占用跳过而不是报错
                    warn!(task_id = %task_id, "claim lost to concurrent batch");
                    results.push(TaskAssignOutcome::Skipped {
                        task_id: task_id.clone(),
                        reason: "task claimed by a concurrent batch".into(),
                    });
                }
                Err(err) => {
                    results.push(TaskAssignOutcome::Failed {
                        task_id: task_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(BatchAssignOutcome { results })
    }

    /// 手动把一个任务指派给一个用户。候选只有一个，直接算 pairwise 分。
    #[instrument(skip(self))]
    pub async fn assign_manual(
        &self,
        task_id: &str,
        user_id: &str,
    ) -> Result<AssignmentRecord, AssignError> {
        let task = self
            .store
            .find_task_by_id(task_id)
            .await?
            .ok_or_else(|| AssignError::TaskNotFound(task_id.to_string()))?;
        if task.status != TaskStatus::Unassigned {
            return Err(AssignError::TaskNotAvailable(task_id.to_string()));
        }

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AssignError::UserNotFound(user_id.to_string()))?;

        let result = self.engine.score(&user.profile, &task.definition);

        match self.store.claim_and_assign(task_id, user_id, &result).await {
            Ok(assignment) => Ok(assignment),
            // 读取校验与占用之间输掉竞争时同样按状态冲突上报
            Err(StoreError::ClaimLost(id)) => Err(AssignError::TaskNotAvailable(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// 用户自选任务：与手动指派同一套写入。
    pub async fn choose_task(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<AssignmentRecord, AssignError> {
        self.assign_manual(task_id, user_id).await
    }

    /// 给用户推荐未分配任务中的前 limit 条。
    #[instrument(skip(self))]
    pub async fn recommend_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RankedTask>, AssignError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AssignError::UserNotFound(user_id.to_string()))?;

        let pool = self.store.find_tasks_by_status(TaskStatus::Unassigned).await?;
        Ok(self.engine.rank_tasks_for_user(&user.profile, &pool, limit))
    }

    pub async fn start_assignment(&self, id: &str) -> Result<AssignmentRecord, AssignError> {
        self.transition(id, AssignmentStatus::InProgress).await
    }

    pub async fn complete_assignment(&self, id: &str) -> Result<AssignmentRecord, AssignError> {
        self.transition(id, AssignmentStatus::Completed).await
    }

    pub async fn reject_assignment(&self, id: &str) -> Result<AssignmentRecord, AssignError> {
        self.transition(id, AssignmentStatus::Rejected).await
    }

    pub async fn cancel_assignment(&self, id: &str) -> Result<AssignmentRecord, AssignError> {
        self.transition(id, AssignmentStatus::Cancelled).await
    }

    async fn transition(
        &self,
        id: &str,
        to: AssignmentStatus,
    ) -> Result<AssignmentRecord, AssignError> {
        match self.store.transition_assignment(id, to).await {
            Ok(assignment) => {
                info!(assignment_id = %id, status = to.as_str(), "assignment transitioned");
                Ok(assignment)
            }
            Err(StoreError::NotFound(_)) => Err(AssignError::AssignmentNotFound(id.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), AssignError> {
        match self.store.delete_task(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => Err(AssignError::TaskNotFound(id.to_string())),
            Err(err) => Err(err.into()),
        }
    }
}
