use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::scoring::ScoreBreakdown;
use crate::{TaskDefinition, UserProfile};

/// 任务状态机：unassigned → assigned → completed / rejected。
/// 取消分配会把任务放回 unassigned 池，因此没有 cancelled 档。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Unassigned,
    Assigned,
    Completed,
    Rejected,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Unassigned => "unassigned",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Completed => "completed",
            TaskStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unassigned" => Some(TaskStatus::Unassigned),
            "assigned" => Some(TaskStatus::Assigned),
            "completed" => Some(TaskStatus::Completed),
            "rejected" => Some(TaskStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Rejected => "rejected",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assigned" => Some(AssignmentStatus::Assigned),
            "in_progress" => Some(AssignmentStatus::InProgress),
            "completed" => Some(AssignmentStatus::Completed),
            "rejected" => Some(AssignmentStatus::Rejected),
            "cancelled" => Some(AssignmentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Completed | AssignmentStatus::Rejected | AssignmentStatus::Cancelled
        )
    }

    /// assigned → in_progress → completed，assigned → rejected，
    /// 任何非终态 → cancelled。
    pub fn can_transition_to(&self, to: AssignmentStatus) -> bool {
        match (self, to) {
            (AssignmentStatus::Assigned, AssignmentStatus::InProgress) => true,
            (AssignmentStatus::InProgress, AssignmentStatus::Completed) => true,
            (AssignmentStatus::Assigned, AssignmentStatus::Rejected) => true,
            (from, AssignmentStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(flatten)]
    pub definition: TaskDefinition,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    /// 永不向外序列化；对外展示一律走 `UserSummary`。
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(flatten)]
    pub profile: UserProfile,
    /// 当前持有的非终态 assignment id 列表
    #[serde(default)]
    pub active_tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
