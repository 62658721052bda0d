//! Configuration validation.
//!
//! The validator walks the whole configuration and collects every issue
//! it finds instead of stopping at the first, so a config author gets
//! one complete report per run. Hard structural problems (patterns that
//! do not compile, broken phase tables) are errors; values the engine
//! would clamp or ignore at runtime are warnings.

use regex::RegexBuilder;

use crate::config::schema::EngineConfig;
use crate::error::{Severity, ValidationIssue};

/// Outcome of validating one configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Issues that prevent the configuration from being used
    pub errors: Vec<ValidationIssue>,
    /// Issues the engine will tolerate (clamping, dead routing)
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Whether the configuration is usable.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

struct Validator {
    result: ValidationResult,
}

impl Validator {
    fn new() -> Self {
        Self {
            result: ValidationResult::default(),
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.result.errors.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.result.warnings.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }

    fn check_unit_range(&mut self, path: String, value: f64) {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            self.warning(path, format!("value {value} outside [0, 1], will be clamped"));
        }
    }
}

/// Validates a configuration, collecting all issues.
#[must_use]
pub fn validate_config(config: &EngineConfig) -> ValidationResult {
    let mut v = Validator::new();

    if config.triggers.is_empty() {
        v.warning("triggers", "no trigger kinds configured, nothing will ever fire");
    }
    for (kind, trigger) in &config.triggers {
        let base = format!("triggers.{kind}");
        for (i, pattern) in trigger.patterns.iter().enumerate() {
            if let Err(e) = RegexBuilder::new(pattern).case_insensitive(true).build() {
                v.error(format!("{base}.patterns[{i}]"), format!("invalid pattern: {e}"));
            }
        }
        v.check_unit_range(format!("{base}.weight"), trigger.weight);
        if trigger.behaviors.is_empty() {
            v.warning(&base, "trigger routes to no behavior types");
        }
        for behavior in &trigger.behaviors {
            if !config.behaviors.contains_key(behavior) {
                v.warning(
                    format!("{base}.behaviors"),
                    format!("behavior {behavior} is not configured, its events will be dropped"),
                );
            }
        }
    }

    for (behavior, behavior_config) in &config.behaviors {
        let base = format!("behaviors.{behavior}");

        let d = &behavior_config.defaults;
        v.check_unit_range(format!("{base}.defaults.base_intensity"), d.base_intensity);
        v.check_unit_range(format!("{base}.defaults.escalation_rate"), d.escalation_rate);
        v.check_unit_range(
            format!("{base}.defaults.de_escalation_rate"),
            d.de_escalation_rate,
        );
        v.check_unit_range(format!("{base}.defaults.volatility"), d.volatility);
        v.check_unit_range(
            format!("{base}.defaults.threshold_for_display"),
            d.threshold_for_display,
        );
        if d.volatility == 0.0 {
            v.warning(
                format!("{base}.defaults.volatility"),
                "volatility is zero, intensity will never move",
            );
        }

        let phases = &behavior_config.phases;
        if phases.advance.is_empty() {
            v.error(
                format!("{base}.phases.advance"),
                "phase table is empty, at least one threshold is required",
            );
        }
        let mut prev = 0.0;
        for (i, &threshold) in phases.advance.iter().enumerate() {
            let path = format!("{base}.phases.advance[{i}]");
            if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
                v.error(path.clone(), format!("threshold {threshold} outside (0, 1]"));
            } else if threshold <= prev {
                v.error(path, "thresholds must be strictly increasing");
            }
            prev = threshold;
        }
        // A zero margin puts the regress threshold exactly on the advance
        // threshold, so a profile sitting there oscillates between the
        // two phases on every interaction.
        if !phases.hysteresis_margin.is_finite()
            || phases.hysteresis_margin <= 0.0
            || phases.hysteresis_margin >= 1.0
        {
            v.error(
                format!("{base}.phases.hysteresis_margin"),
                format!("margin {} outside (0, 1)", phases.hysteresis_margin),
            );
        }

        let max_phase = phases.max_phase();
        let mut seen_from = Vec::new();
        for (i, band) in behavior_config.safety.iter().enumerate() {
            let path = format!("{base}.safety[{i}]");
            if band.from_phase == 0 {
                v.error(path.clone(), "phases are 1-based, from_phase 0 is invalid");
            }
            if seen_from.contains(&band.from_phase) {
                v.error(path.clone(), format!("duplicate from_phase {}", band.from_phase));
            }
            seen_from.push(band.from_phase);
            if band.from_phase > max_phase {
                v.warning(
                    path,
                    format!(
                        "from_phase {} exceeds the highest phase {max_phase}",
                        band.from_phase
                    ),
                );
            }
        }

        for (kind, &weight) in &behavior_config.trigger_overrides {
            let path = format!("{base}.trigger_overrides.{kind}");
            if !config.triggers.contains_key(kind) {
                v.warning(path.clone(), "override references an unknown trigger kind");
            }
            v.check_unit_range(path, weight);
        }
    }

    let mut prev_gap = -1.0;
    for (i, step) in config.delayed_response.ladder.iter().enumerate() {
        let path = format!("delayed_response.ladder[{i}]");
        if !step.min_gap_hours.is_finite() || step.min_gap_hours < 0.0 {
            v.error(path.clone(), format!("min_gap_hours {} is negative", step.min_gap_hours));
        } else if step.min_gap_hours <= prev_gap {
            v.error(path.clone(), "ladder steps must be strictly increasing");
        }
        prev_gap = step.min_gap_hours;
        v.check_unit_range(format!("{path}.weight"), step.weight);
    }

    if config.limits.trigger_log_capacity == 0 {
        v.warning("limits.trigger_log_capacity", "capacity 0 is treated as 1");
    }
    if config.limits.max_store_attempts == 0 {
        v.warning("limits.max_store_attempts", "0 attempts is treated as 1");
    }

    v.result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{BehaviorType, TriggerKind};

    #[test]
    fn test_builtin_config_is_clean() {
        let result = validate_config(&EngineConfig::builtin());
        assert!(result.is_ok(), "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let mut config = EngineConfig::builtin();
        config
            .triggers
            .get_mut(&TriggerKind::new("criticism"))
            .unwrap()
            .patterns
            .push("[unclosed".to_string());
        let result = validate_config(&config);
        assert!(!result.is_ok());
        assert!(result.errors[0].path.contains("criticism"));
    }

    #[test]
    fn test_out_of_range_weight_is_a_warning() {
        let mut config = EngineConfig::builtin();
        config
            .triggers
            .get_mut(&TriggerKind::new("criticism"))
            .unwrap()
            .weight = 1.5;
        let result = validate_config(&config);
        assert!(result.is_ok());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.path == "triggers.criticism.weight")
        );
    }

    #[test]
    fn test_unconfigured_behavior_route_is_a_warning() {
        let mut config = EngineConfig::builtin();
        config.behaviors.remove(&BehaviorType::Codependency);
        let result = validate_config(&config);
        assert!(result.is_ok());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.message.contains("CODEPENDENCY"))
        );
    }

    #[test]
    fn test_non_increasing_phase_table_is_an_error() {
        let mut config = EngineConfig::builtin();
        config
            .behaviors
            .get_mut(&BehaviorType::BorderlinePd)
            .unwrap()
            .phases
            .advance = vec![0.5, 0.5, 0.7];
        let result = validate_config(&config);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_empty_phase_table_is_an_error() {
        let mut config = EngineConfig::builtin();
        config
            .behaviors
            .get_mut(&BehaviorType::BorderlinePd)
            .unwrap()
            .phases
            .advance = Vec::new();
        let result = validate_config(&config);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_zero_hysteresis_margin_is_an_error() {
        let mut config = EngineConfig::builtin();
        config
            .behaviors
            .get_mut(&BehaviorType::AnxiousAttachment)
            .unwrap()
            .phases
            .hysteresis_margin = 0.0;
        let result = validate_config(&config);
        assert!(!result.is_ok());
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.path.contains("hysteresis_margin"))
        );
    }

    #[test]
    fn test_multiple_issues_are_all_collected() {
        let mut config = EngineConfig::builtin();
        config
            .triggers
            .get_mut(&TriggerKind::new("criticism"))
            .unwrap()
            .patterns
            .push("[bad".to_string());
        config
            .behaviors
            .get_mut(&BehaviorType::BorderlinePd)
            .unwrap()
            .phases
            .advance = vec![1.5];
        let result = validate_config(&config);
        assert!(result.errors.len() >= 2);
    }

    #[test]
    fn test_ladder_order_is_checked() {
        let mut config = EngineConfig::builtin();
        config.delayed_response.ladder.reverse();
        let result = validate_config(&config);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_zero_volatility_default_is_a_warning() {
        let mut config = EngineConfig::builtin();
        config
            .behaviors
            .get_mut(&BehaviorType::Codependency)
            .unwrap()
            .defaults
            .volatility = 0.0;
        let result = validate_config(&config);
        assert!(result.is_ok());
        assert!(!result.warnings.is_empty());
    }
}
