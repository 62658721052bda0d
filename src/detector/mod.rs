//! Trigger detection.
//!
//! The detector compiles the configured trigger catalog once and scans
//! each incoming message against it. Detection is stateless: the gap
//! since the previous message is an input, and the output is a flat list
//! of [`TriggerEvent`]s with at most one event per (kind, behavior type)
//! pair per message. A message that matches nothing produces an empty
//! list, which is a normal outcome rather than an error.

pub mod patterns;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use regex::{Regex, RegexBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::config::schema::{DelayedResponseConfig, EngineConfig};
use crate::engine::intensity::clamp_unit;
use crate::error::DetectorError;
use crate::observability::metrics;
use crate::profile::{BehaviorType, TriggerDirection, TriggerEvent, TriggerKind};

#[derive(Debug)]
struct CompiledKind {
    kind: TriggerKind,
    regexes: Vec<Regex>,
    direction: TriggerDirection,
    /// Effective (possibly overridden) weight per routed behavior type,
    /// clamped to [0, 1] at build time.
    weights: BTreeMap<BehaviorType, f64>,
}

/// Compiled trigger detector.
#[derive(Debug)]
pub struct TriggerDetector {
    kinds: Vec<CompiledKind>,
    delayed_response: DelayedResponseConfig,
}

impl TriggerDetector {
    /// Compiles the catalog from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidPattern`] for the first pattern
    /// that fails to compile. (The config validator reports all of them;
    /// this path exists for configs built programmatically.)
    pub fn new(config: &EngineConfig) -> Result<Self, DetectorError> {
        let mut kinds = Vec::with_capacity(config.triggers.len());
        for (kind, kind_config) in &config.triggers {
            let mut regexes = Vec::with_capacity(kind_config.patterns.len());
            for pattern in &kind_config.patterns {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| DetectorError::InvalidPattern {
                        kind: kind.to_string(),
                        message: e.to_string(),
                    })?;
                regexes.push(regex);
            }
            let weights = kind_config
                .behaviors
                .iter()
                .map(|&bt| {
                    let weight = config.effective_weight(kind, bt).unwrap_or(0.0);
                    (bt, clamp_unit("trigger weight", weight))
                })
                .collect();
            kinds.push(CompiledKind {
                kind: kind.clone(),
                regexes,
                direction: kind_config.direction,
                weights,
            });
        }
        Ok(Self {
            kinds,
            delayed_response: config.delayed_response.clone(),
        })
    }

    /// Scans one message.
    ///
    /// Each trigger kind fires at most once per message; the first
    /// matching pattern supplies the diagnostic snippet. The gap since
    /// the previous message, when known, feeds the delayed-response
    /// ladder.
    #[must_use]
    pub fn detect(
        &self,
        message_id: &str,
        text: &str,
        gap: Option<Duration>,
        timestamp: DateTime<Utc>,
    ) -> Vec<TriggerEvent> {
        let mut events = Vec::new();
        for compiled in &self.kinds {
            if compiled.kind.as_str() == patterns::DELAYED_RESPONSE {
                self.detect_gap(compiled, message_id, gap, timestamp, &mut events);
                continue;
            }
            let Some(snippet) = compiled
                .regexes
                .iter()
                .find_map(|re| re.find(text).map(|m| m.as_str().to_string()))
            else {
                continue;
            };
            debug!(kind = %compiled.kind, snippet = %snippet, "trigger matched");
            for (&behavior_type, &weight) in &compiled.weights {
                events.push(self.event(
                    compiled,
                    message_id,
                    behavior_type,
                    weight,
                    snippet.clone(),
                    timestamp,
                ));
            }
        }
        for event in &events {
            metrics::record_trigger_detected(&event.kind, event.behavior_type);
        }
        events
    }

    fn detect_gap(
        &self,
        compiled: &CompiledKind,
        message_id: &str,
        gap: Option<Duration>,
        timestamp: DateTime<Utc>,
        events: &mut Vec<TriggerEvent>,
    ) {
        let Some(gap) = gap else { return };
        let hours = gap.num_milliseconds() as f64 / 3_600_000.0;
        let Some(weight) = self.delayed_response.weight_for_gap(hours) else {
            return;
        };
        let weight = clamp_unit("delayed response weight", weight);
        debug!(hours, weight, "delayed response trigger");
        let snippet = format!("{hours:.1}h gap");
        for &behavior_type in compiled.weights.keys() {
            events.push(self.event(
                compiled,
                message_id,
                behavior_type,
                weight,
                snippet.clone(),
                timestamp,
            ));
        }
    }

    #[allow(clippy::unused_self)]
    fn event(
        &self,
        compiled: &CompiledKind,
        message_id: &str,
        behavior_type: BehaviorType,
        weight: f64,
        detected_text: String,
        timestamp: DateTime<Utc>,
    ) -> TriggerEvent {
        TriggerEvent {
            id: Uuid::new_v4(),
            message_id: message_id.to_string(),
            kind: compiled.kind.clone(),
            behavior_type,
            weight,
            direction: compiled.direction,
            detected_text,
            timestamp,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
