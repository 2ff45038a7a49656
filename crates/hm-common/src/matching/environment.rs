use serde::{Deserialize, Serialize};

use crate::{EnvironmentTolerance, TaskDefinition};

/// 任务侧的环境要求标志（固定词汇表，彼此独立，可任意组合）。
/// `quiet` 同时作为噪音和社交两条规则的低档。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvFlag {
    HighNoise,
    MediumNoise,
    LowNoise,
    Quiet,
    HighSpace,
    MediumSpace,
    HighSocial,
    MediumSocial,
    LowSocial,
    HighUrgency,
    Multitask,
}

impl EnvFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvFlag::HighNoise => "high_noise",
            EnvFlag::MediumNoise => "medium_noise",
            EnvFlag::LowNoise => "low_noise",
            EnvFlag::Quiet => "quiet",
            EnvFlag::HighSpace => "high_space",
            EnvFlag::MediumSpace => "medium_space",
            EnvFlag::HighSocial => "high_social",
            EnvFlag::MediumSocial => "medium_social",
            EnvFlag::LowSocial => "low_social",
            EnvFlag::HighUrgency => "high_urgency",
            EnvFlag::Multitask => "multitask",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high_noise" => Some(EnvFlag::HighNoise),
            "medium_noise" => Some(EnvFlag::MediumNoise),
            "low_noise" => Some(EnvFlag::LowNoise),
            "quiet" => Some(EnvFlag::Quiet),
            "high_space" => Some(EnvFlag::HighSpace),
            "medium_space" => Some(EnvFlag::MediumSpace),
            "high_social" => Some(EnvFlag::HighSocial),
            "medium_social" => Some(EnvFlag::MediumSocial),
            "low_social" => Some(EnvFlag::LowSocial),
            "high_urgency" => Some(EnvFlag::HighUrgency),
            "multitask" => Some(EnvFlag::Multitask),
            _ => None,
        }
    }
}

/// 中档要求按 1.5 倍放大耐受度，封顶 100。
fn boosted(attribute: i32) -> f64 {
    (attribute as f64 * 1.5).min(100.0)
}

fn noise_compat(flags: &[EnvFlag], tolerance: &EnvironmentTolerance) -> f64 {
    if flags.contains(&EnvFlag::HighNoise) {
        tolerance.noise_tolerance as f64
    } else if flags.contains(&EnvFlag::MediumNoise) {
        boosted(tolerance.noise_tolerance)
    } else {
        // 低噪音/安静及未声明都视为无要求
        100.0
    }
}

fn space_compat(flags: &[EnvFlag], tolerance: &EnvironmentTolerance) -> f64 {
    if flags.contains(&EnvFlag::HighSpace) {
        tolerance.space_requirement as f64
    } else if flags.contains(&EnvFlag::MediumSpace) {
        boosted(tolerance.space_requirement)
    } else {
        100.0
    }
}

fn social_compat(flags: &[EnvFlag], tolerance: &EnvironmentTolerance) -> f64 {
    if flags.contains(&EnvFlag::HighSocial) {
        tolerance.social_density as f64
    } else if flags.contains(&EnvFlag::MediumSocial) {
        boosted(tolerance.social_density)
    } else {
        100.0
    }
}

fn urgency_compat(task: &TaskDefinition, tolerance: &EnvironmentTolerance) -> f64 {
    if task.environment.contains(&EnvFlag::HighUrgency) || task.urgency >= 4 {
        tolerance.urgency_acceptance as f64
    } else {
        100.0
    }
}

fn multitask_compat(flags: &[EnvFlag], tolerance: &EnvironmentTolerance) -> f64 {
    if flags.contains(&EnvFlag::Multitask) {
        tolerance.multitask_capability as f64
    } else {
        100.0
    }
}

/// 五项兼容度取平均后保留两位小数。
pub fn evaluate_environment(task: &TaskDefinition, tolerance: &EnvironmentTolerance) -> f64 {
    let total = noise_compat(&task.environment, tolerance)
        + space_compat(&task.environment, tolerance)
        + social_compat(&task.environment, tolerance)
        + urgency_compat(task, tolerance)
        + multitask_compat(&task.environment, tolerance);

    super::scoring::round2(total / 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tolerance() -> EnvironmentTolerance {
        EnvironmentTolerance {
            noise_tolerance: 40,
            space_requirement: 60,
            social_density: 30,
            urgency_acceptance: 20,
            multitask_capability: 80,
        }
    }

    fn task_with(flags: Vec<EnvFlag>) -> TaskDefinition {
        TaskDefinition {
            name: "打扫".into(),
            environment: flags,
            ..TaskDefinition::default()
        }
    }

    #[test]
    fn no_flags_means_full_compatibility() {
        let score = evaluate_environment(&task_with(vec![]), &tolerance());
        assert_eq!(score, 100.0);
    }

    #[test]
    fn high_noise_uses_raw_tolerance() {
        let score = evaluate_environment(&task_with(vec![EnvFlag::HighNoise]), &tolerance());
        // (40 + 100 * 4) / 5
        assert_eq!(score, 88.0);
    }

    #[test]
    fn medium_tiers_boost_and_cap() {
        assert_eq!(boosted(40), 60.0);
        assert_eq!(boosted(80), 100.0);

        let score = evaluate_environment(&task_with(vec![EnvFlag::MediumSocial]), &tolerance());
        // (45 + 100 * 4) / 5
        assert_eq!(score, 89.0);
    }

    #[test]
    fn quiet_counts_as_low_tier() {
        let score = evaluate_environment(&task_with(vec![EnvFlag::Quiet]), &tolerance());
        assert_eq!(score, 100.0);
    }

    #[test]
    fn urgency_level_triggers_without_flag() {
        let mut task = task_with(vec![]);
        task.urgency = 4;
        let score = evaluate_environment(&task, &tolerance());
        // (20 + 100 * 4) / 5
        assert_eq!(score, 84.0);

        task.urgency = 3;
        assert_eq!(evaluate_environment(&task, &tolerance()), 100.0);
    }

    #[test]
    fn multitask_flag_reads_capability() {
        let score = evaluate_environment(&task_with(vec![EnvFlag::Multitask]), &tolerance());
        // (80 + 100 * 4) / 5
        assert_eq!(score, 96.0);
    }

    #[test]
    fn flags_round_trip_through_strings() {
        for flag in [
            EnvFlag::HighNoise,
            EnvFlag::Quiet,
            EnvFlag::MediumSpace,
            EnvFlag::LowSocial,
            EnvFlag::HighUrgency,
            EnvFlag::Multitask,
        ] {
            assert_eq!(EnvFlag::parse(flag.as_str()), Some(flag));
        }
        assert_eq!(EnvFlag::parse("loud"), None);
    }
}
