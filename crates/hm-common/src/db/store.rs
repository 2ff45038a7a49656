use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio_postgres::types::Json;
use tokio_postgres::Row;
use tracing::instrument;
use uuid::Uuid;

use super::pool::PgPool;
use crate::assignment::records::{
    AssignmentRecord, AssignmentStatus, TaskRecord, TaskStatus, UserRecord,
};
use crate::assignment::store::{AssignmentStore, StoreError};
use crate::matching::environment::EnvFlag;
use crate::matching::scoring::{MatchResult, ScoreBreakdown};
use crate::{EnvironmentTolerance, TaskDefinition, UserProfile};

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(value: deadpool_postgres::PoolError) -> Self {
        StoreError::Backend(format!("failed to get postgres connection: {value}"))
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(value: tokio_postgres::Error) -> Self {
        StoreError::Backend(format!("postgres error: {value}"))
    }
}

/// Postgres 持久化实现。claim 的三步写入跑在同一事务里，
/// 条件 UPDATE 即串行化点。
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TASK_COLUMNS: &str = "id, name, tags, time_slots, environment, urgency, level, status";
const USER_COLUMNS: &str = "id, name, password_hash, skills, preferences, time_slots, \
     noise_tolerance, space_requirement, social_density, urgency_acceptance, \
     multitask_capability, active_tasks";
const ASSIGNMENT_COLUMNS: &str =
    "id, task_id, user_id, final_score, breakdown, status, assigned_at, started_at, completed_at";

fn map_task_row(row: &Row) -> Result<TaskRecord, StoreError> {
    let status: String = row.get("status");
    let status = TaskStatus::parse(&status)
        .ok_or_else(|| StoreError::Backend(format!("unknown task status: {status}")))?;

    let environment: Vec<String> = row.get("environment");
    let environment = environment
        .iter()
        .map(|flag| {
            EnvFlag::parse(flag)
                .ok_or_else(|| StoreError::Backend(format!("unknown environment flag: {flag}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskRecord {
        id: row.get("id"),
        definition: TaskDefinition {
            name: row.get("name"),
            tags: row.get("tags"),
            time_slots: row.get("time_slots"),
            environment,
            urgency: row.get("urgency"),
            level: row.get("level"),
        },
        status,
    })
}

fn map_user_row(row: &Row) -> Result<UserRecord, StoreError> {
    let skills: Vec<String> = row.get("skills");
    let preferences: Vec<String> = row.get("preferences");
    let time_slots: Vec<String> = row.get("time_slots");

    Ok(UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        profile: UserProfile {
            skills: skills.into_iter().collect::<HashSet<_>>(),
            preferences: preferences.into_iter().collect::<HashSet<_>>(),
            time_slots: time_slots.into_iter().collect::<HashSet<_>>(),
            environment: EnvironmentTolerance {
                noise_tolerance: row.get("noise_tolerance"),
                space_requirement: row.get("space_requirement"),
                social_density: row.get("social_density"),
                urgency_acceptance: row.get("urgency_acceptance"),
                multitask_capability: row.get("multitask_capability"),
            },
        },
        active_tasks: row.get("active_tasks"),
    })
}

fn map_assignment_row(row: &Row) -> Result<AssignmentRecord, StoreError> {
    let status: String = row.get("status");
    let status = AssignmentStatus::parse(&status)
        .ok_or_else(|| StoreError::Backend(format!("unknown assignment status: {status}")))?;

    let Json(breakdown): Json<Value> = row.get("breakdown");
    let breakdown: ScoreBreakdown = serde_json::from_value(breakdown)
        .map_err(|err| StoreError::Backend(format!("failed to map breakdown: {err}")))?;

    Ok(AssignmentRecord {
        id: row.get("id"),
        task_id: row.get("task_id"),
        user_id: row.get("user_id"),
        final_score: row.get("final_score"),
        breakdown,
        status,
        assigned_at: row.get("assigned_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    })
}

#[async_trait]
impl AssignmentStore for PgStore {
    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    async fn find_tasks_by_ids(&self, ids: &[String]) -> Result<Vec<TaskRecord>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM hm_tasks WHERE id = ANY($1)"
            ))
            .await?;

        let rows = client.query(&stmt, &[&ids]).await?;
        rows.iter().map(map_task_row).collect()
    }

    async fn find_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<TaskRecord>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM hm_tasks WHERE status = $1 ORDER BY id"
            ))
            .await?;

        let rows = client.query(&stmt, &[&status.as_str()]).await?;
        rows.iter().map(map_task_row).collect()
    }

    async fn find_task_by_id(&self, id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM hm_tasks WHERE id = $1"))
            .await?;

        let row = client.query_opt(&stmt, &[&id]).await?;
        row.as_ref().map(map_task_row).transpose()
    }

    async fn find_all_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!("SELECT {USER_COLUMNS} FROM hm_users ORDER BY id"))
            .await?;

        let rows = client.query(&stmt, &[]).await?;
        rows.iter().map(map_user_row).collect()
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!("SELECT {USER_COLUMNS} FROM hm_users WHERE id = $1"))
            .await?;

        let row = client.query_opt(&stmt, &[&id]).await?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_assignment_by_id(
        &self,
        id: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM hm_assignments WHERE id = $1"
            ))
            .await?;

        let row = client.query_opt(&stmt, &[&id]).await?;
        row.as_ref().map(map_assignment_row).transpose()
    }

    #[instrument(skip(self, result))]
    async fn claim_and_assign(
        &self,
        task_id: &str,
        user_id: &str,
        result: &MatchResult,
    ) -> Result<AssignmentRecord, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        // 串行化点：只有仍处于 unassigned 的任务能被翻转
        let claimed = tx
            .execute(
                "UPDATE hm_tasks SET status = 'assigned' WHERE id = $1 AND status = 'unassigned'",
                &[&task_id],
            )
            .await?;
        if claimed == 0 {
            return Err(StoreError::ClaimLost(task_id.to_string()));
        }

        let assignment_id = Uuid::new_v4().to_string();
        let assigned_at = Utc::now();
        let breakdown = serde_json::to_value(result.breakdown)
            .map_err(|err| StoreError::Backend(format!("failed to encode breakdown: {err}")))?;

        let row = tx
            .query_one(
                &format!(
                    "INSERT INTO hm_assignments \
                         (id, task_id, user_id, final_score, breakdown, status, assigned_at) \
                     VALUES ($1, $2, $3, $4, $5, 'assigned', $6) \
                     RETURNING {ASSIGNMENT_COLUMNS}"
                ),
                &[
                    &assignment_id,
                    &task_id,
                    &user_id,
                    &result.final_score,
                    &Json(&breakdown),
                    &assigned_at,
                ],
            )
            .await?;

        let updated = tx
            .execute(
                "UPDATE hm_users SET active_tasks = array_append(active_tasks, $2) WHERE id = $1",
                &[&user_id, &assignment_id],
            )
            .await?;
        if updated == 0 {
            // 事务随 drop 回滚，任务状态不会半途留下
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }

        tx.commit().await?;
        map_assignment_row(&row)
    }

    #[instrument(skip(self))]
    async fn transition_assignment(
        &self,
        id: &str,
        to: AssignmentStatus,
    ) -> Result<AssignmentRecord, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let row = tx
            .query_opt(
                &format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM hm_assignments WHERE id = $1 FOR UPDATE"
                ),
                &[&id],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("assignment {id}")))?;
        let current = map_assignment_row(&row)?;

        if !current.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition(format!(
                "assignment {id}: {} -> {}",
                current.status.as_str(),
                to.as_str()
            )));
        }

        let now = Utc::now();
        let updated = match to {
            AssignmentStatus::InProgress => {
                tx.query_one(
                    &format!(
                        "UPDATE hm_assignments SET status = $2, started_at = $3 \
                         WHERE id = $1 RETURNING {ASSIGNMENT_COLUMNS}"
                    ),
                    &[&id, &to.as_str(), &now],
                )
                .await?
            }
            AssignmentStatus::Completed => {
                tx.query_one(
                    &format!(
                        "UPDATE hm_assignments SET status = $2, completed_at = $3 \
                         WHERE id = $1 RETURNING {ASSIGNMENT_COLUMNS}"
                    ),
                    &[&id, &to.as_str(), &now],
                )
                .await?
            }
            _ => {
                tx.query_one(
                    &format!(
                        "UPDATE hm_assignments SET status = $2 \
                         WHERE id = $1 RETURNING {ASSIGNMENT_COLUMNS}"
                    ),
                    &[&id, &to.as_str()],
                )
                .await?
            }
        };

        let task_status = match to {
            AssignmentStatus::Completed => Some(TaskStatus::Completed),
            AssignmentStatus::Rejected => Some(TaskStatus::Rejected),
            AssignmentStatus::Cancelled => Some(TaskStatus::Unassigned),
            _ => None,
        };
        if let Some(status) = task_status {
            tx.execute(
                "UPDATE hm_tasks SET status = $2 WHERE id = $1",
                &[&current.task_id, &status.as_str()],
            )
            .await?;
            tx.execute(
                "UPDATE hm_users SET active_tasks = array_remove(active_tasks, $2) WHERE id = $1",
                &[&current.user_id, &id],
            )
            .await?;
        }

        tx.commit().await?;
        map_assignment_row(&updated)
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        // 级联前先把被删 assignment 从持有者的 active_tasks 摘掉
        tx.execute(
            "UPDATE hm_users u SET active_tasks = array_remove(u.active_tasks, a.id) \
             FROM hm_assignments a \
             WHERE a.task_id = $1 AND a.user_id = u.id",
            &[&id],
        )
        .await?;

        let deleted = tx
            .execute("DELETE FROM hm_tasks WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("task {id}")));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}
