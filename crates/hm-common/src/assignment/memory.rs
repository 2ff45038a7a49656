//! In-memory store implementation, used by tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::records::{AssignmentRecord, AssignmentStatus, TaskRecord, TaskStatus, UserRecord};
use super::store::{AssignmentStore, StoreError};
use crate::matching::scoring::MatchResult;

#[derive(Default)]
struct MemoryState {
    tasks: HashMap<String, TaskRecord>,
    users: HashMap<String, UserRecord>,
    assignments: HashMap<String, AssignmentRecord>,
    next_assignment_id: u64,
}

/// 整个状态挂在一把互斥锁下，claim 的条件检查与三步写入
/// 天然在同一临界区内完成。
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_task(&self, task: TaskRecord) {
        self.state.lock().await.tasks.insert(task.id.clone(), task);
    }

    pub async fn insert_user(&self, user: UserRecord) {
        self.state.lock().await.users.insert(user.id.clone(), user);
    }
}

impl MemoryState {
    fn allocate_assignment_id(&mut self) -> String {
        self.next_assignment_id += 1;
        format!("a-{}", self.next_assignment_id)
    }

    fn pull_active_task(&mut self, user_id: &str, assignment_id: &str) {
        if let Some(user) = self.users.get_mut(user_id) {
            user.active_tasks.retain(|id| id != assignment_id);
        }
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn find_tasks_by_ids(&self, ids: &[String]) -> Result<Vec<TaskRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .cloned()
            .collect())
    }

    async fn find_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<TaskRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut tasks: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|task| task.status == status)
            .cloned()
            .collect();
        // HashMap 迭代顺序不稳定，按 id 固定住
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    async fn find_task_by_id(&self, id: &str) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self.state.lock().await.tasks.get(id).cloned())
    }

    async fn find_all_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut users: Vec<UserRecord> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn find_assignment_by_id(
        &self,
        id: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError> {
        Ok(self.state.lock().await.assignments.get(id).cloned())
    }

    async fn claim_and_assign(
        &self,
        task_id: &str,
        user_id: &str,
        result: &MatchResult,
    ) -> Result<AssignmentRecord, StoreError> {
        let mut state = self.state.lock().await;

        let task = state
            .tasks
            .get(task_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {task_id}")))?;
        if task.status != TaskStatus::Unassigned {
            return Err(StoreError::ClaimLost(task_id.to_string()));
        }
        if !state.users.contains_key(user_id) {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }

        let assignment_id = state.allocate_assignment_id();
        let assignment = AssignmentRecord {
            id: assignment_id.clone(),
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
            final_score: result.final_score,
            breakdown: result.breakdown,
            status: AssignmentStatus::Assigned,
            assigned_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        state.tasks.get_mut(task_id).unwrap().status = TaskStatus::Assigned;
        state
            .assignments
            .insert(assignment_id.clone(), assignment.clone());
        state
            .users
            .get_mut(user_id)
            .unwrap()
            .active_tasks
            .push(assignment_id);

        Ok(assignment)
    }

    async fn transition_assignment(
        &self,
        id: &str,
        to: AssignmentStatus,
    ) -> Result<AssignmentRecord, StoreError> {
        let mut state = self.state.lock().await;

        let current = state
            .assignments
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("assignment {id}")))?
            .clone();

        if !current.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition(format!(
                "assignment {id}: {} -> {}",
                current.status.as_str(),
                to.as_str()
            )));
        }

        let now = Utc::now();
        let assignment = state.assignments.get_mut(id).unwrap();
        assignment.status = to;
        match to {
            AssignmentStatus::InProgress => assignment.started_at = Some(now),
            AssignmentStatus::Completed => assignment.completed_at = Some(now),
            _ => {}
        }
        let updated = assignment.clone();

        let task_status = match to {
            AssignmentStatus::Completed => Some(TaskStatus::Completed),
            AssignmentStatus::Rejected => Some(TaskStatus::Rejected),
            AssignmentStatus::Cancelled => Some(TaskStatus::Unassigned),
            _ => None,
        };
        if let Some(status) = task_status {
            if let Some(task) = state.tasks.get_mut(&updated.task_id) {
                task.status = status;
            }
            state.pull_active_task(&updated.user_id, id);
        }

        Ok(updated)
    }

    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if state.tasks.remove(id).is_none() {
            return Err(StoreError::NotFound(format!("task {id}")));
        }

        let cascade: Vec<(String, String)> = state
            .assignments
            .values()
            .filter(|a| a.task_id == id)
            .map(|a| (a.id.clone(), a.user_id.clone()))
            .collect();

        for (assignment_id, user_id) in cascade {
            state.assignments.remove(&assignment_id);
            state.pull_active_task(&user_id, &assignment_id);
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
