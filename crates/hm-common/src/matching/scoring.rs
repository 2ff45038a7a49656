use serde::{Deserialize, Serialize};

use super::environment::evaluate_environment;
use super::weights::Weights;
use crate::{TaskDefinition, UserProfile};

/// 时间段哨兵值：出现即短路为满分。
pub const ALL_DAY_SLOT: &str = "全天";

#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    pub weights: Weights,
}

/// 五个分项得分，均为 [0,100] 区间的浮点数
/// （time 分项按原始公式不设上限，见 `score_time`）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill: f64,
    pub preference: f64,
    pub time: f64,
    pub environment: f64,
    pub level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 加权综合分，保留两位小数
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// 用户・任务匹配评分引擎。纯函数，无 I/O、无内部状态，
/// 权重在组合根显式注入，多线程并发调用安全。
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: MatchingConfig,
}

impl MatchEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn weights(&self) -> Weights {
        self.config.weights
    }

    /// 综合评分：五个分项独立计算后按固定权重合成。
    /// 输入约定为已校验的完整数据，本函数无错误分支。
    pub fn score(&self, user: &UserProfile, task: &TaskDefinition) -> MatchResult {
        let breakdown = ScoreBreakdown {
            skill: score_skill(user, task),
            preference: score_preference(user, task),
            time: score_time(user, task),
            environment: evaluate_environment(task, &user.environment),
            level: score_level(user, task),
        };

        let w = self.config.weights;
        let final_score = round2(
            breakdown.skill * w.skill
                + breakdown.preference * w.preference
                + breakdown.time * w.time
                + breakdown.environment * w.environment
                + breakdown.level * w.level,
        );

        MatchResult {
            final_score,
            breakdown,
        }
    }
}

/// 技能分：按任务名精确命中，非此即彼。
fn score_skill(user: &UserProfile, task: &TaskDefinition) -> f64 {
    if user.skills.contains(&task.name) {
        100.0
    } else {
        0.0
    }
}

/// 偏好分：每个命中标签固定 50 分，封顶 100。
/// 注意不是命中率：两个及以上命中即饱和。
fn score_preference(user: &UserProfile, task: &TaskDefinition) -> f64 {
    let matched = task
        .tags
        .iter()
        .filter(|tag| user.preferences.contains(*tag))
        .count();

    (matched as f64 * 50.0).min(100.0)
}

/// 时间分：遇到 "全天" 立即返回 100；否则每个命中的任务时间段
/// 贡献 100/N（N 为任务时间段数）。任务侧重复的时间段会重复计分，
/// 且不做封顶。
fn score_time(user: &UserProfile, task: &TaskDefinition) -> f64 {
    let mut total = 0.0;

    for slot in &task.time_slots {
        if slot == ALL_DAY_SLOT {
            return 100.0;
        }
        if user.time_slots.contains(slot) {
            total += 100.0 / task.time_slots.len() as f64;
        }
    }

    total
}

/// 等级分：已掌握该任务直接满分；否则以 2 级为基准，
/// 每高一级扣 20 分（低于 2 级反向加分），下限 0。
/// 在 f64 上计算，任意 i32 等级都不会溢出。
fn score_level(user: &UserProfile, task: &TaskDefinition) -> f64 {
    if user.skills.contains(&task.name) {
        100.0
    } else {
        (100.0 - (task.level as f64 - 2.0) * 20.0).max(0.0)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
