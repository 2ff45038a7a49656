pub mod api;
pub mod assignment;
pub mod db;
pub mod logging;
pub mod matching;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use matching::environment::EnvFlag;

// Commonly used data models for the matching functions.

/// 用户画像（匹配输入・只读快照）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// 熟练任务名集合（按任务名精确匹配）
    #[serde(default)]
    pub skills: HashSet<String>,
    /// 偏好的任务标签集合
    #[serde(default)]
    pub preferences: HashSet<String>,
    /// 可用时间段标签集合，如 "9:00-11:00"
    #[serde(default)]
    pub time_slots: HashSet<String>,
    #[serde(default)]
    pub environment: EnvironmentTolerance,
}

/// 环境耐受度，五项属性取值 [0,100]。
/// 缺失的属性在反序列化时显式补为中性值 50。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTolerance {
    #[serde(default = "neutral_tolerance")]
    pub noise_tolerance: i32,
    #[serde(default = "neutral_tolerance")]
    pub space_requirement: i32,
    #[serde(default = "neutral_tolerance")]
    pub social_density: i32,
    #[serde(default = "neutral_tolerance")]
    pub urgency_acceptance: i32,
    #[serde(default = "neutral_tolerance")]
    pub multitask_capability: i32,
}

const fn neutral_tolerance() -> i32 {
    50
}

impl Default for EnvironmentTolerance {
    fn default() -> Self {
        Self {
            noise_tolerance: neutral_tolerance(),
            space_requirement: neutral_tolerance(),
            social_density: neutral_tolerance(),
            urgency_acceptance: neutral_tolerance(),
            multitask_capability: neutral_tolerance(),
        }
    }
}

/// 任务定义（匹配输入・只读快照）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// 任务名，同时作为技能查找键（按名字等值匹配，非语义相似）
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 时间段标签序列；哨兵值 "全天" 无条件命中
    #[serde(default)]
    pub time_slots: Vec<String>,
    /// 环境要求标志，固定词汇表中的任意子集
    #[serde(default)]
    pub environment: Vec<EnvFlag>,
    /// 紧急程度，>= 4 时触发高紧急兼容规则
    #[serde(default = "default_urgency")]
    pub urgency: i32,
    /// 难度等级，仅在用户未掌握该任务时参与评分
    #[serde(default = "default_level")]
    pub level: i32,
}

const fn default_urgency() -> i32 {
    1
}

const fn default_level() -> i32 {
    1
}

impl Default for TaskDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            tags: Vec::new(),
            time_slots: Vec::new(),
            environment: Vec::new(),
            urgency: default_urgency(),
            level: default_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tolerance_attributes_default_to_neutral() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"skills":["洗碗"],"environment":{"noise_tolerance":80}}"#)
                .unwrap();

        assert_eq!(profile.environment.noise_tolerance, 80);
        assert_eq!(profile.environment.space_requirement, 50);
        assert_eq!(profile.environment.social_density, 50);
        assert_eq!(profile.environment.urgency_acceptance, 50);
        assert_eq!(profile.environment.multitask_capability, 50);
    }

    #[test]
    fn task_definition_fills_optional_fields() {
        let task: TaskDefinition = serde_json::from_str(r#"{"name":"拖地"}"#).unwrap();

        assert_eq!(task.name, "拖地");
        assert!(task.tags.is_empty());
        assert!(task.environment.is_empty());
        assert_eq!(task.urgency, 1);
        assert_eq!(task.level, 1);
    }
}
