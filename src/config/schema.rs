//! Configuration schema.
//!
//! The whole engine is driven by one [`EngineConfig`]: trigger kinds with
//! their patterns and routing, per-behavior parameter defaults and phase
//! tables, safety ladders, and operational limits. A built-in
//! configuration covers the stock behavior catalog so the engine runs
//! with no file at all; a YAML file overrides it wholesale.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::detector::patterns;
use crate::profile::{BehaviorType, ProfileParams, TriggerDirection, TriggerKind};
use crate::safety::SafetyBand;

// ============================================================================
// Trigger Configuration
// ============================================================================

/// One trigger kind: how to detect it and where it routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerKindConfig {
    /// Regex patterns, matched case-insensitively against the message
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Weight magnitude in [0, 1]
    pub weight: f64,
    /// Whether a hit escalates or soothes
    #[serde(default)]
    pub direction: TriggerDirection,
    /// Behavior types this kind routes to
    pub behaviors: Vec<BehaviorType>,
}

/// One step of the delayed-response ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GapStep {
    /// Minimum gap since the previous message, in hours
    pub min_gap_hours: f64,
    /// Weight assigned when this step is the highest one reached
    pub weight: f64,
}

/// Delayed-response detection: maps the gap since the previous message
/// to a trigger weight through a step ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayedResponseConfig {
    /// Whether gap detection runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ladder steps; the highest step at or below the gap wins
    pub ladder: Vec<GapStep>,
}

impl Default for DelayedResponseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ladder: vec![
                GapStep {
                    min_gap_hours: 3.0,
                    weight: 0.2,
                },
                GapStep {
                    min_gap_hours: 6.0,
                    weight: 0.4,
                },
                GapStep {
                    min_gap_hours: 12.0,
                    weight: 0.6,
                },
                GapStep {
                    min_gap_hours: 24.0,
                    weight: 0.8,
                },
                GapStep {
                    min_gap_hours: 48.0,
                    weight: 0.9,
                },
            ],
        }
    }
}

impl DelayedResponseConfig {
    /// Weight for a gap of `hours`, if any ladder step is reached.
    #[must_use]
    pub fn weight_for_gap(&self, hours: f64) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        self.ladder
            .iter()
            .filter(|step| step.min_gap_hours <= hours)
            .max_by(|a, b| a.min_gap_hours.total_cmp(&b.min_gap_hours))
            .map(|step| step.weight)
    }
}

const fn default_true() -> bool {
    true
}

// ============================================================================
// Phase Tables
// ============================================================================

/// Advance-threshold ladder for one behavior type.
///
/// A table with `n` thresholds defines `n + 1` phases: entering phase
/// `p + 1` requires intensity at or above `advance[p - 1]`, sustained
/// across two consecutive interactions. Regression back to phase `p`
/// happens when intensity drops to `advance[p - 1] - hysteresis_margin`
/// or below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTable {
    /// Advance thresholds, strictly increasing, each in (0, 1]
    pub advance: Vec<f64>,
    /// Gap between the advance and regress thresholds, in (0, 1)
    #[serde(default = "default_hysteresis_margin")]
    pub hysteresis_margin: f64,
}

const fn default_hysteresis_margin() -> f64 {
    0.05
}

impl PhaseTable {
    /// Highest phase this table defines.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_phase(&self) -> u32 {
        self.advance.len() as u32 + 1
    }

    /// Threshold for advancing out of `phase`, if `phase` is not terminal.
    #[must_use]
    pub fn advance_threshold(&self, phase: u32) -> Option<f64> {
        if phase == 0 {
            return None;
        }
        self.advance.get(phase as usize - 1).copied()
    }

    /// Threshold for regressing out of `phase`, if `phase > 1`.
    ///
    /// Sits `hysteresis_margin` below the threshold that was crossed to
    /// enter `phase`, so a profile hovering at the boundary does not
    /// oscillate.
    #[must_use]
    pub fn regress_threshold(&self, phase: u32) -> Option<f64> {
        if phase < 2 {
            return None;
        }
        self.advance
            .get(phase as usize - 2)
            .map(|t| t - self.hysteresis_margin)
    }
}

// ============================================================================
// Behavior Configuration
// ============================================================================

/// Per-behavior-type configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorTypeConfig {
    /// Parameter defaults for freshly activated profiles
    #[serde(default)]
    pub defaults: ProfileParams,
    /// Phase table
    pub phases: PhaseTable,
    /// Safety ladder; empty means the generic built-in ladder
    #[serde(default)]
    pub safety: Vec<SafetyBand>,
    /// Per-kind weight overrides for this behavior type
    #[serde(default)]
    pub trigger_overrides: BTreeMap<TriggerKind, f64>,
}

// ============================================================================
// Limits
// ============================================================================

/// Operational limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Maximum configuration file size in bytes
    #[serde(default = "default_max_config_bytes")]
    pub max_config_bytes: u64,
    /// Trigger events retained per character
    #[serde(default = "default_trigger_log_capacity")]
    pub trigger_log_capacity: usize,
    /// Profile lock acquisition attempts before reporting contention
    #[serde(default = "default_max_store_attempts")]
    pub max_store_attempts: u32,
}

const fn default_max_config_bytes() -> u64 {
    1024 * 1024
}

const fn default_trigger_log_capacity() -> usize {
    1000
}

const fn default_max_store_attempts() -> u32 {
    16
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_config_bytes: default_max_config_bytes(),
            trigger_log_capacity: default_trigger_log_capacity(),
            max_store_attempts: default_max_store_attempts(),
        }
    }
}

// ============================================================================
// Engine Configuration
// ============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trigger kinds, in declaration order
    pub triggers: IndexMap<TriggerKind, TriggerKindConfig>,
    /// Behavior types
    pub behaviors: BTreeMap<BehaviorType, BehaviorTypeConfig>,
    /// Delayed-response gap ladder
    #[serde(default)]
    pub delayed_response: DelayedResponseConfig,
    /// Operational limits
    #[serde(default)]
    pub limits: EngineLimits,
}

impl EngineConfig {
    /// The built-in configuration: the stock trigger catalog, routing,
    /// phase tables, and safety ladders.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            triggers: patterns::builtin_triggers(),
            behaviors: Self::builtin_behaviors(),
            delayed_response: DelayedResponseConfig::default(),
            limits: EngineLimits::default(),
        }
    }

    fn builtin_behaviors() -> BTreeMap<BehaviorType, BehaviorTypeConfig> {
        let mut behaviors = BTreeMap::new();
        for bt in BehaviorType::ALL {
            behaviors.insert(
                bt,
                BehaviorTypeConfig {
                    defaults: ProfileParams::default(),
                    phases: Self::builtin_phase_table(bt),
                    safety: Vec::new(),
                    trigger_overrides: BTreeMap::new(),
                },
            );
        }
        behaviors
    }

    fn builtin_phase_table(behavior_type: BehaviorType) -> PhaseTable {
        let advance = match behavior_type {
            // Eight phases, a long tail of increasingly sticky thresholds.
            BehaviorType::YandereObsessive => {
                vec![0.3, 0.5, 0.65, 0.75, 0.85, 0.92, 0.97]
            }
            // Three broad phases.
            BehaviorType::AnxiousAttachment => vec![0.4, 0.7],
            // Five phases for everything else.
            _ => vec![0.3, 0.5, 0.7, 0.85],
        };
        PhaseTable {
            advance,
            hysteresis_margin: default_hysteresis_margin(),
        }
    }

    /// Effective weight for a (kind, behavior type) pair: the per-type
    /// override when present, else the kind's configured weight.
    #[must_use]
    pub fn effective_weight(&self, kind: &TriggerKind, behavior_type: BehaviorType) -> Option<f64> {
        let base = self.triggers.get(kind)?.weight;
        let weight = self
            .behaviors
            .get(&behavior_type)
            .and_then(|b| b.trigger_overrides.get(kind).copied())
            .unwrap_or(base);
        Some(weight)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_behavior_types() {
        let config = EngineConfig::builtin();
        for bt in BehaviorType::ALL {
            assert!(config.behaviors.contains_key(&bt), "missing {bt}");
        }
    }

    #[test]
    fn test_builtin_trigger_catalog() {
        let config = EngineConfig::builtin();
        for kind in [
            "abandonment_signal",
            "delayed_response",
            "criticism",
            "mention_other_person",
            "boundary_assertion",
            "reassurance",
            "explicit_rejection",
        ] {
            assert!(
                config.triggers.contains_key(&TriggerKind::new(kind)),
                "missing trigger kind {kind}"
            );
        }
    }

    #[test]
    fn test_phase_table_thresholds() {
        let table = PhaseTable {
            advance: vec![0.3, 0.5, 0.7],
            hysteresis_margin: 0.05,
        };
        assert_eq!(table.max_phase(), 4);
        assert_eq!(table.advance_threshold(1), Some(0.3));
        assert_eq!(table.advance_threshold(3), Some(0.7));
        assert_eq!(table.advance_threshold(4), None);
        assert_eq!(table.regress_threshold(1), None);
        let r2 = table.regress_threshold(2).unwrap();
        assert!((r2 - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_gap_ladder_picks_highest_reached_step() {
        let config = DelayedResponseConfig::default();
        assert_eq!(config.weight_for_gap(1.0), None);
        assert_eq!(config.weight_for_gap(3.0), Some(0.2));
        assert_eq!(config.weight_for_gap(7.5), Some(0.4));
        assert_eq!(config.weight_for_gap(25.0), Some(0.8));
        assert_eq!(config.weight_for_gap(100.0), Some(0.9));
    }

    #[test]
    fn test_gap_ladder_disabled() {
        let config = DelayedResponseConfig {
            enabled: false,
            ..DelayedResponseConfig::default()
        };
        assert_eq!(config.weight_for_gap(100.0), None);
    }

    #[test]
    fn test_effective_weight_honors_override() {
        let mut config = EngineConfig::builtin();
        let kind = TriggerKind::new("criticism");
        let base = config.effective_weight(&kind, BehaviorType::NarcissisticPd);
        assert_eq!(base, Some(0.8));
        config
            .behaviors
            .get_mut(&BehaviorType::NarcissisticPd)
            .unwrap()
            .trigger_overrides
            .insert(kind.clone(), 0.95);
        assert_eq!(
            config.effective_weight(&kind, BehaviorType::NarcissisticPd),
            Some(0.95)
        );
        assert_eq!(
            config.effective_weight(&kind, BehaviorType::BorderlinePd),
            Some(0.8)
        );
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = EngineConfig::builtin();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.triggers.len(), config.triggers.len());
        assert_eq!(back.behaviors.len(), config.behaviors.len());
    }
}
