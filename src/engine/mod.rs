//! Progression engine.
//!
//! [`ProgressionEngine`] wires the detector, profile store, phase policy,
//! and trigger log behind one interaction-processing entry point. The
//! engine is synchronous and shareable: every method takes `&self`, and
//! all mutation of one character's profiles is serialized by the store.

pub mod intensity;
pub mod log;
pub mod policy;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{ProgressionState, SentimentCounts};
use crate::config::schema::EngineConfig;
use crate::detector::TriggerDetector;
use crate::error::{PhaseError, Result};
use crate::observability::metrics;
use crate::profile::{
    BehaviorProfile, BehaviorType, CharacterId, ProfileStore, Sentiment, TriggerEvent, TriggerKind,
};
use crate::safety::{SafetyMap, SafetyTier};

pub use log::{TriggerLog, TriggerStats};
pub use policy::PhaseTransition;

/// What one processed interaction did.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionOutcome {
    /// Message the interaction processed
    pub message_id: String,
    /// Trigger events applied to active profiles
    pub events: Vec<TriggerEvent>,
    /// Phase transitions the interaction produced
    pub transitions: Vec<PhaseTransition>,
    /// Detected events dropped because no active profile matched
    pub dropped_events: usize,
}

/// The progression engine.
pub struct ProgressionEngine {
    config: Arc<EngineConfig>,
    detector: TriggerDetector,
    store: ProfileStore,
    trigger_log: TriggerLog,
    safety: SafetyMap,
    last_seen: DashMap<CharacterId, DateTime<Utc>>,
    sentiment: DashMap<CharacterId, SentimentCounts>,
}

impl ProgressionEngine {
    /// Builds an engine from a frozen configuration.
    ///
    /// # Errors
    ///
    /// Fails when a configured trigger pattern does not compile.
    pub fn new(config: Arc<EngineConfig>) -> Result<Self> {
        let detector = TriggerDetector::new(&config)?;
        let safety = SafetyMap::merged(
            config
                .behaviors
                .iter()
                .map(|(&bt, b)| (bt, b.safety.clone()))
                .collect(),
        );
        Ok(Self {
            detector,
            store: ProfileStore::with_max_attempts(config.limits.max_store_attempts),
            trigger_log: TriggerLog::new(config.limits.trigger_log_capacity),
            safety,
            last_seen: DashMap::new(),
            sentiment: DashMap::new(),
            config,
        })
    }

    /// Activates a behavior profile for a character at phase 1, using the
    /// configured parameter defaults for the type.
    ///
    /// # Errors
    ///
    /// Fails when the behavior type has no configuration, when the
    /// profile already exists, or on store contention.
    pub fn activate(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let behavior = self
            .config
            .behaviors
            .get(&behavior_type)
            .ok_or(PhaseError::NoPhaseTable(behavior_type))?;
        let params = intensity::clamp_params(behavior.defaults);
        self.store.activate(character, behavior_type, params, now)?;
        Ok(())
    }

    /// Processes one message for a character.
    ///
    /// Detection runs over the message text and the gap since the
    /// character's previous message. Every active profile then advances
    /// by exactly one interaction: matched triggers escalate or soothe
    /// it, an interaction with no matching trigger decays it, and the
    /// phase policy is evaluated once at the end. Detected events whose
    /// behavior type has no active profile are dropped.
    ///
    /// # Errors
    ///
    /// Surfaces store contention and phase table faults. Profile updates
    /// are staged and committed together, and the gap tracker only
    /// advances on success, so a failed interaction leaves no trace and
    /// can be retried wholesale.
    pub fn process_interaction(
        &self,
        character: &CharacterId,
        message_id: &str,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<InteractionOutcome> {
        let gap = self
            .last_seen
            .get(character)
            .map(|prev| timestamp - *prev)
            .filter(|gap| *gap > Duration::zero());

        let detected = self.detector.detect(message_id, text, gap, timestamp);
        let mut by_behavior: BTreeMap<BehaviorType, Vec<TriggerEvent>> = BTreeMap::new();
        for event in detected {
            by_behavior.entry(event.behavior_type).or_default().push(event);
        }

        let (transitions, applied) = self
            .store
            .update_character(character, |profiles| {
                let mut transitions = Vec::new();
                let mut applied = Vec::new();
                for (&behavior_type, profile) in profiles.iter_mut() {
                    let table = &self
                        .config
                        .behaviors
                        .get(&behavior_type)
                        .ok_or(PhaseError::NoPhaseTable(behavior_type))?
                        .phases;
                    let events = by_behavior.remove(&behavior_type).unwrap_or_default();
                    apply_interaction(profile, &events);
                    if let Some(transition) = policy::step(profile, table, timestamp)? {
                        transitions.push(transition);
                    }
                    applied.extend(events);
                }
                Ok::<_, PhaseError>((transitions, applied))
            })??;
        self.last_seen.insert(character.clone(), timestamp);

        let mut outcome = InteractionOutcome {
            message_id: message_id.to_string(),
            events: applied,
            transitions,
            dropped_events: 0,
        };
        for transition in &outcome.transitions {
            metrics::record_phase_transition(transition);
        }

        // Whatever is left in the map targeted behavior types with no
        // active profile for this character.
        for (behavior_type, events) in by_behavior {
            for event in events {
                debug!(
                    character = %character,
                    behavior_type = %behavior_type,
                    kind = %event.kind,
                    "dropping trigger event, no active profile"
                );
                metrics::record_dropped_event(&event.kind);
                outcome.dropped_events += 1;
            }
        }

        // The log counts one occurrence per detected kind per message,
        // regardless of how many profiles the kind routed to.
        let mut logged: Vec<TriggerKind> = Vec::new();
        for event in &outcome.events {
            if !logged.contains(&event.kind) {
                logged.push(event.kind.clone());
                self.trigger_log.record(character, event.clone());
            }
        }

        metrics::record_interaction();
        Ok(outcome)
    }

    /// Returns a snapshot of one profile.
    ///
    /// # Errors
    ///
    /// Fails for unknown keys and for profiles with corrupt history.
    pub fn get_profile(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
    ) -> Result<BehaviorProfile> {
        let profile = self.store.get(character, behavior_type)?;
        if let Err(detail) = profile.check_integrity() {
            return Err(crate::error::ProfileError::CorruptHistory {
                character: character.clone(),
                behavior_type,
                detail,
            }
            .into());
        }
        Ok(profile)
    }

    /// Rolls up a character's progression. Never fails: an unknown
    /// character rolls up to an empty state.
    #[must_use]
    pub fn get_progression_state(&self, character: &CharacterId) -> ProgressionState {
        let profiles = self.store.profiles_for(character);
        let sentiment = self
            .sentiment
            .get(character)
            .map(|s| *s.value())
            .unwrap_or_default();
        ProgressionState::from_profiles(&profiles, sentiment)
    }

    /// Safety tier for a character's current phase in one behavior.
    ///
    /// # Errors
    ///
    /// Fails when the profile does not exist.
    pub fn get_safety_level(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
    ) -> Result<SafetyTier> {
        let profile = self.store.get(character, behavior_type)?;
        Ok(self.safety.classify(behavior_type, profile.current_phase))
    }

    /// The engine's safety map, for pure classification without a profile.
    #[must_use]
    pub const fn safety_map(&self) -> &SafetyMap {
        &self.safety
    }

    /// Trigger history for a character, most recent first.
    #[must_use]
    pub fn list_trigger_history(
        &self,
        character: &CharacterId,
        kind: Option<&TriggerKind>,
        limit: usize,
    ) -> Vec<TriggerEvent> {
        self.trigger_log.list(character, kind, limit)
    }

    /// Records an externally classified sentiment signal.
    pub fn record_sentiment(&self, character: &CharacterId, sentiment: Sentiment) {
        let mut counts = self.sentiment.entry(character.clone()).or_default();
        match sentiment {
            Sentiment::Positive => counts.positive += 1,
            Sentiment::Negative => counts.negative += 1,
        }
    }

    /// Returns a profile to phase 1.
    ///
    /// # Errors
    ///
    /// Fails for unknown keys, corrupt history, and store contention.
    pub fn reset_phase(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
        now: DateTime<Utc>,
    ) -> Result<PhaseTransition> {
        let transition = self
            .store
            .update(character, behavior_type, |p| policy::reset(p, now))?;
        metrics::record_phase_transition(&transition);
        Ok(transition)
    }

    /// Global top-trigger ranking.
    #[must_use]
    pub fn top_triggers(&self, limit: usize) -> Vec<TriggerStats> {
        self.trigger_log.top_triggers(limit)
    }
}

/// Applies one interaction's events to a profile: escalate or soothe per
/// event, or a single idle decay when nothing matched, then bump the
/// interaction counter exactly once.
fn apply_interaction(profile: &mut BehaviorProfile, events: &[TriggerEvent]) {
    if events.is_empty() {
        profile.current_intensity = intensity::decay(profile.current_intensity, &profile.params);
    } else {
        for event in events {
            profile.current_intensity = match event.direction {
                crate::profile::TriggerDirection::Escalate => {
                    intensity::escalate(profile.current_intensity, &profile.params, event.weight)
                }
                crate::profile::TriggerDirection::Soothe => {
                    intensity::soothe(profile.current_intensity, &profile.params, event.weight)
                }
            };
            profile.open_phase_trigger_kinds.insert(event.kind.clone());
        }
    }
    profile.interactions_since_phase_start += 1;
}

// ============================================================================
// Tests
// ============================================================================
