use std::cmp::Ordering;

use serde::Serialize;

use super::scoring::{MatchEngine, MatchResult};
use crate::assignment::records::{TaskRecord, UserRecord};
use crate::{TaskDefinition, UserProfile};

/// 推荐列表的默认长度。
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct RankedTask {
    pub task: TaskRecord,
    pub result: MatchResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedUser {
    pub user: UserRecord,
    pub result: MatchResult,
}

impl MatchEngine {
    /// 对单个用户给候选任务排序，返回前 limit 条。
    /// 稳定排序：同分保持输入顺序。
    pub fn rank_tasks_for_user(
        &self,
        user: &UserProfile,
        tasks: &[TaskRecord],
        limit: usize,
    ) -> Vec<RankedTask> {
        let mut ranked: Vec<RankedTask> = tasks
            .iter()
            .map(|task| RankedTask {
                result: self.score(user, &task.definition),
                task: task.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| descending(a.result, b.result));
        ranked.truncate(limit);
        ranked
    }

    /// 对单个任务给候选用户排序；调用方通常取首位（最佳匹配）
    /// 外加随后几位作为备选展示。
    pub fn rank_users_for_task(&self, task: &TaskDefinition, users: &[UserRecord]) -> Vec<RankedUser> {
        let mut ranked: Vec<RankedUser> = users
            .iter()
            .map(|user| RankedUser {
                result: self.score(&user.profile, task),
                user: user.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| descending(a.result, b.result));
        ranked
    }
}

fn descending(a: MatchResult, b: MatchResult) -> Ordering {
    b.final_score
        .partial_cmp(&a.final_score)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::records::TaskStatus;
    use crate::matching::scoring::MatchingConfig;
    use crate::EnvironmentTolerance;

    fn engine() -> MatchEngine {
        MatchEngine::new(MatchingConfig::default())
    }

    fn user() -> UserProfile {
        UserProfile {
            skills: ["洗碗".to_string()].into(),
            preferences: ["日常例行任务".to_string()].into(),
            time_slots: ["9:00-11:00".to_string()].into(),
            environment: EnvironmentTolerance::default(),
        }
    }

    fn task(id: &str, name: &str) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            definition: TaskDefinition {
                name: name.into(),
                tags: vec!["日常例行任务".into()],
                time_slots: vec!["9:00-11:00".into()],
                ..TaskDefinition::default()
            },
            status: TaskStatus::Unassigned,
        }
    }

    fn user_record(id: &str, skills: &[&str]) -> UserRecord {
        UserRecord {
            id: id.into(),
            name: id.into(),
            password_hash: None,
            profile: UserProfile {
                skills: skills.iter().map(|s| s.to_string()).collect(),
                ..UserProfile::default()
            },
            active_tasks: vec![],
        }
    }

    #[test]
    fn ranks_tasks_descending_and_truncates() {
        let strong = task("t1", "洗碗");
        let weak = task("t2", "修水管");
        let tasks = vec![weak.clone(), strong.clone()];

        let ranked = engine().rank_tasks_for_user(&user(), &tasks, 6);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].task.id, "t1");
        assert!(ranked[0].result.final_score > ranked[1].result.final_score);

        let top_one = engine().rank_tasks_for_user(&user(), &tasks, 1);
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].task.id, "t1");
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let tasks = vec![task("first", "洗碗"), task("second", "洗碗")];

        let ranked = engine().rank_tasks_for_user(&user(), &tasks, 6);
        assert_eq!(ranked[0].result.final_score, ranked[1].result.final_score);
        assert_eq!(ranked[0].task.id, "first");
        assert_eq!(ranked[1].task.id, "second");
    }

    #[test]
    fn empty_candidates_yield_empty_result() {
        assert!(engine().rank_tasks_for_user(&user(), &[], 6).is_empty());
        assert!(engine()
            .rank_users_for_task(&TaskDefinition::default(), &[])
            .is_empty());
    }

    #[test]
    fn ranks_users_with_best_match_first() {
        let task = task("t1", "洗碗");
        let users = vec![user_record("novice", &[]), user_record("expert", &["洗碗"])];

        let ranked = engine().rank_users_for_task(&task.definition, &users);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user.id, "expert");
        assert!(ranked[0].result.final_score > ranked[1].result.final_score);
    }
}
