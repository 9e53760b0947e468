//! Tunable constants of the memory model, grouped in one configuration object.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Which update rule drives `evaluate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    /// Bayesian half-life model (reference)
    #[default]
    HalfLife,
    /// Heuristic reaction-time / friction weight model
    Flux,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "halflife" | "half-life" | "half_life" => Some(Self::HalfLife),
            "flux" => Some(Self::Flux),
            _ => None,
        }
    }
}

/// Parameters of the heuristic friction strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FluxParams {
    pub instant_recall_ms: i64,
    pub quick_recall_ms: i64,
    pub deep_friction_ms: i64,
    pub instant_gain: f64,
    pub quick_gain: f64,
    pub friction_gain: f64,
    pub assistance_penalty: f64,
    pub deep_friction_penalty: f64,
    /// Weight floor after a remembered-with-friction interaction
    pub friction_floor: f64,
    /// Fraction of weight kept after a lapse
    pub forgot_retain: f64,
    pub forgot_floor: f64,
    pub stability_growth: f64,
    pub weak_threshold: f64,
    pub shaky_threshold: f64,
    pub forgot_interval_min: f64,
    pub weak_interval_min: f64,
    pub shaky_interval_min: f64,
    /// Weight a never-seen item starts from, in place of the alpha/beta priors
    pub initial_weight: f64,
    /// Growth base for an item without a previous interval
    pub initial_interval_min: f64,
    pub max_interval_min: f64,
}

impl Default for FluxParams {
    fn default() -> Self {
        Self {
            instant_recall_ms: 900,
            quick_recall_ms: 2800,
            deep_friction_ms: 7000,
            instant_gain: 0.35,
            quick_gain: 0.2,
            friction_gain: 0.1,
            assistance_penalty: 0.05,
            deep_friction_penalty: 0.1,
            friction_floor: 0.2,
            forgot_retain: 0.4,
            forgot_floor: 0.1,
            stability_growth: 2.2,
            weak_threshold: 0.3,
            shaky_threshold: 0.5,
            forgot_interval_min: 10.0,
            weak_interval_min: 30.0,
            shaky_interval_min: 1440.0,
            initial_weight: 0.2,
            initial_interval_min: 1440.0,
            max_interval_min: 525_600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    pub strategy: StrategyKind,
    pub prior_success: f64,
    pub prior_failure: f64,
    pub initial_halflife: f64,
    pub min_halflife: f64,
    pub max_halflife: f64,
    pub min_success: f64,
    pub min_failure: f64,
    pub decay_on_fail: f64,
    pub fail_halflife_shrink: f64,
    pub fast_recall_window_ms: f64,
    pub reaction_bonus_max: f64,
    /// Subtracted per assistance request; 0 makes assistance neutral
    pub assistance_penalty: f64,
    pub slow_recall_threshold_ms: i64,
    pub slow_recall_penalty: f64,
    pub growth_scale: f64,
    /// Retention level at which an item becomes due again
    pub r_target: f64,
    /// Half-life (minutes) from which an item counts as stabilized
    pub stabilized_halflife: f64,
    /// Half-life (minutes) above which an item counts as mastered in distributions
    pub mastered_halflife: f64,
    /// When false, negative elapsed times are rejected instead of clamped
    pub clamp_negative_elapsed: bool,
    pub flux: FluxParams,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::HalfLife,
            prior_success: 3.0,
            prior_failure: 1.0,
            initial_halflife: 1440.0,
            min_halflife: 10.0,
            max_halflife: 525_600.0,
            min_success: 0.1,
            min_failure: 0.1,
            decay_on_fail: 0.5,
            fail_halflife_shrink: 0.2,
            fast_recall_window_ms: 2800.0,
            reaction_bonus_max: 0.5,
            assistance_penalty: 0.15,
            slow_recall_threshold_ms: 7000,
            slow_recall_penalty: 0.25,
            growth_scale: 1.5,
            r_target: 0.85,
            stabilized_halflife: 4320.0,
            mastered_halflife: 20160.0,
            clamp_negative_elapsed: true,
            flux: FluxParams::default(),
        }
    }
}

impl SchedulerConfig {
    /// Parses a (possibly partial) JSON document; missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        fn positive(name: &str, value: f64) -> Result<(), ModelError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ModelError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )))
            }
        }
        fn non_negative(name: &str, value: f64) -> Result<(), ModelError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ModelError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )))
            }
        }
        fn unit_interval(name: &str, value: f64) -> Result<(), ModelError> {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(ModelError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )))
            }
        }

        positive("priorSuccess", self.prior_success)?;
        positive("priorFailure", self.prior_failure)?;
        positive("minSuccess", self.min_success)?;
        positive("minFailure", self.min_failure)?;
        positive("minHalflife", self.min_halflife)?;
        positive("maxHalflife", self.max_halflife)?;
        if self.min_halflife > self.max_halflife {
            return Err(ModelError::InvalidConfig(format!(
                "minHalflife {} exceeds maxHalflife {}",
                self.min_halflife, self.max_halflife
            )));
        }
        positive("initialHalflife", self.initial_halflife)?;
        unit_interval("decayOnFail", self.decay_on_fail)?;
        unit_interval("failHalflifeShrink", self.fail_halflife_shrink)?;
        positive("fastRecallWindowMs", self.fast_recall_window_ms)?;
        non_negative("reactionBonusMax", self.reaction_bonus_max)?;
        non_negative("assistancePenalty", self.assistance_penalty)?;
        non_negative("slowRecallPenalty", self.slow_recall_penalty)?;
        non_negative("growthScale", self.growth_scale)?;
        if !(self.r_target > 0.0 && self.r_target < 1.0) {
            return Err(ModelError::InvalidConfig(format!(
                "rTarget must be in (0, 1), got {}",
                self.r_target
            )));
        }
        positive("stabilizedHalflife", self.stabilized_halflife)?;
        if self.mastered_halflife < self.stabilized_halflife {
            return Err(ModelError::InvalidConfig(format!(
                "masteredHalflife {} is below stabilizedHalflife {}",
                self.mastered_halflife, self.stabilized_halflife
            )));
        }

        let flux = &self.flux;
        unit_interval("flux.forgotRetain", flux.forgot_retain)?;
        unit_interval("flux.forgotFloor", flux.forgot_floor)?;
        unit_interval("flux.frictionFloor", flux.friction_floor)?;
        positive("flux.stabilityGrowth", flux.stability_growth)?;
        positive("flux.forgotIntervalMin", flux.forgot_interval_min)?;
        positive("flux.weakIntervalMin", flux.weak_interval_min)?;
        positive("flux.shakyIntervalMin", flux.shaky_interval_min)?;
        Ok(())
    }

    /// Clamps a half-life into `[min_halflife, max_halflife]`
    pub fn clamp_halflife(&self, halflife: f64) -> f64 {
        halflife.clamp(self.min_halflife, self.max_halflife)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config =
            SchedulerConfig::from_json_str(r#"{"rTarget":0.9,"strategy":"flux"}"#).unwrap();
        assert_eq!(config.r_target, 0.9);
        assert_eq!(config.strategy, StrategyKind::Flux);
        assert_eq!(config.prior_success, 3.0);
        assert_eq!(config.flux.instant_recall_ms, 900);
    }

    #[test]
    fn test_rejects_r_target_out_of_range() {
        let err = SchedulerConfig::from_json_str(r#"{"rTarget":1.0}"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_inverted_halflife_bounds() {
        let config = SchedulerConfig {
            min_halflife: 100.0,
            max_halflife: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = SchedulerConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ModelError::Serialization(_)));
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(StrategyKind::parse("HalfLife"), Some(StrategyKind::HalfLife));
        assert_eq!(StrategyKind::parse(" flux "), Some(StrategyKind::Flux));
        assert_eq!(StrategyKind::parse("sm2"), None);
    }
}
