/// 综合评分权重（技能为主，等级为辅）
/// 各分项先独立算出 [0,100] 分，再按权重线性合成。
pub const DEFAULT_WEIGHTS: Weights = Weights {
    skill: 0.35,
    preference: 0.20,
    time: 0.25,
    environment: 0.15,
    level: 0.05,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skill: f64,
    pub preference: f64,
    pub time: f64,
    pub environment: f64,
    pub level: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skill + self.preference + self.time + self.environment + self.level
    }
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }
}
