//! Behavior profile types.
//!
//! A [`BehaviorProfile`] is the per-(character, behavior type) state the
//! engine evolves: tunable parameters, a bounded intensity, the current
//! phase, and an append-only phase history. Profiles are plain data;
//! all mutation goes through the store and engine.

pub mod store;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use store::ProfileStore;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque character identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    /// Creates a character id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trigger kind name (e.g. `abandonment_signal`).
///
/// Kinds are open-ended configuration, not a closed enum; the built-in
/// configuration ships seven of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerKind(String);

impl TriggerKind {
    /// Creates a trigger kind from any string-like value.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TriggerKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Behavior Types
// ============================================================================

/// The behavior patterns the engine models.
///
/// This is a closed set: trigger events targeting anything else are
/// dropped at the detection boundary, so downstream code never sees an
/// unknown type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorType {
    AnxiousAttachment,
    AvoidantAttachment,
    DisorganizedAttachment,
    YandereObsessive,
    BorderlinePd,
    NarcissisticPd,
    Codependency,
}

impl BehaviorType {
    /// All behavior types, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::AnxiousAttachment,
        Self::AvoidantAttachment,
        Self::DisorganizedAttachment,
        Self::YandereObsessive,
        Self::BorderlinePd,
        Self::NarcissisticPd,
        Self::Codependency,
    ];

    /// Wire-format name (matches the serialized form).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnxiousAttachment => "ANXIOUS_ATTACHMENT",
            Self::AvoidantAttachment => "AVOIDANT_ATTACHMENT",
            Self::DisorganizedAttachment => "DISORGANIZED_ATTACHMENT",
            Self::YandereObsessive => "YANDERE_OBSESSIVE",
            Self::BorderlinePd => "BORDERLINE_PD",
            Self::NarcissisticPd => "NARCISSISTIC_PD",
            Self::Codependency => "CODEPENDENCY",
        }
    }

    /// Parses the wire-format name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.as_str() == s)
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Trigger Events
// ============================================================================

/// Whether a trigger pushes intensity up or draws it back down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerDirection {
    /// Pushes intensity toward 1.0
    #[default]
    Escalate,
    /// Draws intensity back toward the baseline
    Soothe,
}

/// A detected trigger occurrence, bound to one behavior type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Unique event id
    pub id: Uuid,
    /// Message the trigger was detected in
    pub message_id: String,
    /// Trigger kind
    pub kind: TriggerKind,
    /// Behavior type this event targets
    pub behavior_type: BehaviorType,
    /// Effective weight in [0, 1]
    pub weight: f64,
    /// Escalating or soothing
    pub direction: TriggerDirection,
    /// Matched text snippet, for diagnostics
    pub detected_text: String,
    /// Detection timestamp
    pub timestamp: DateTime<Utc>,
}

/// External sentiment signal recorded against a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
}

// ============================================================================
// Phase History
// ============================================================================

/// Why a phase was exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseExitReason {
    /// Intensity sustained above the advance threshold
    NaturalProgression,
    /// Intensity fell below the regress threshold
    Regression,
    /// Explicit reset to phase 1
    Reset,
}

/// A closed chapter of a profile's phase history.
///
/// Entries are appended when a phase is exited and never mutated
/// afterwards. The open phase lives in the profile's current-phase
/// fields, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseHistoryEntry {
    /// Phase number (1-based)
    pub phase: u32,
    /// When the phase was entered
    pub entered_at: DateTime<Utc>,
    /// When the phase was exited
    pub exited_at: DateTime<Utc>,
    /// Interactions processed while in this phase
    pub interactions: u64,
    /// Distinct trigger kinds observed during this phase
    pub trigger_kinds: BTreeSet<TriggerKind>,
    /// Why the phase ended
    pub exit_reason: PhaseExitReason,
}

// ============================================================================
// Profile Parameters
// ============================================================================

/// Tunable per-profile parameters, all in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileParams {
    /// Resting intensity the profile decays toward
    pub base_intensity: f64,
    /// Escalation rate multiplier
    pub escalation_rate: f64,
    /// Idle decay rate multiplier
    pub de_escalation_rate: f64,
    /// Reactivity multiplier applied to every delta
    pub volatility: f64,
    /// Intensity above which downstream surfaces show the behavior
    pub threshold_for_display: f64,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            base_intensity: 0.3,
            escalation_rate: 0.1,
            de_escalation_rate: 0.05,
            volatility: 0.5,
            threshold_for_display: 0.3,
        }
    }
}

// ============================================================================
// Behavior Profile
// ============================================================================

/// Per-(character, behavior type) progression state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorProfile {
    /// Behavior type this profile tracks
    pub behavior_type: BehaviorType,
    /// Tunable parameters
    pub params: ProfileParams,
    /// Current intensity in [0, 1]
    pub current_intensity: f64,
    /// Current phase (1-based)
    pub current_phase: u32,
    /// When the current phase was entered
    pub phase_started_at: DateTime<Utc>,
    /// Interactions processed since the current phase started
    pub interactions_since_phase_start: u64,
    /// Distinct trigger kinds observed during the current phase
    pub open_phase_trigger_kinds: BTreeSet<TriggerKind>,
    /// Advance threshold held at the end of the previous interaction
    pub advance_armed: bool,
    /// Closed phases, oldest first
    pub phase_history: Vec<PhaseHistoryEntry>,
}

impl BehaviorProfile {
    /// Creates a fresh profile at phase 1 with intensity at baseline.
    ///
    /// Callers are expected to pass already-clamped parameters.
    #[must_use]
    pub fn new(behavior_type: BehaviorType, params: ProfileParams, now: DateTime<Utc>) -> Self {
        Self {
            behavior_type,
            params,
            current_intensity: params.base_intensity,
            current_phase: 1,
            phase_started_at: now,
            interactions_since_phase_start: 0,
            open_phase_trigger_kinds: BTreeSet::new(),
            advance_armed: false,
            phase_history: Vec::new(),
        }
    }

    /// Total interactions processed over the profile's lifetime:
    /// everything recorded in closed phases plus the open phase.
    #[must_use]
    pub fn lifetime_interactions(&self) -> u64 {
        self.phase_history
            .iter()
            .map(|e| e.interactions)
            .sum::<u64>()
            + self.interactions_since_phase_start
    }

    /// Whether the current intensity is at or above the display threshold.
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.current_intensity >= self.params.threshold_for_display
    }

    /// Checks phase history for internal consistency.
    ///
    /// History is the audit trail for safety escalation; a profile that
    /// fails this check must be surfaced as corrupt, not repaired.
    pub fn check_integrity(&self) -> Result<(), String> {
        let mut prev_exit: Option<DateTime<Utc>> = None;
        for (i, entry) in self.phase_history.iter().enumerate() {
            if entry.phase == 0 {
                return Err(format!("history entry {i} has phase 0"));
            }
            if entry.exited_at < entry.entered_at {
                return Err(format!("history entry {i} exited before it was entered"));
            }
            if let Some(prev) = prev_exit {
                if entry.entered_at < prev {
                    return Err(format!("history entry {i} overlaps the previous entry"));
                }
            }
            prev_exit = Some(entry.exited_at);
        }
        if self.current_phase == 0 {
            return Err("current phase is 0".to_string());
        }
        if let Some(last) = self.phase_history.last() {
            let delta = i64::from(self.current_phase) - i64::from(last.phase);
            let contiguous = match last.exit_reason {
                PhaseExitReason::NaturalProgression => delta == 1,
                PhaseExitReason::Regression => delta == -1,
                PhaseExitReason::Reset => self.current_phase == 1,
            };
            if !contiguous {
                return Err(format!(
                    "current phase {} does not follow history tail phase {} ({:?})",
                    self.current_phase, last.phase, last.exit_reason
                ));
            }
            if self.phase_started_at < last.exited_at {
                return Err("current phase started before history tail exited".to_string());
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_behavior_type_wire_roundtrip() {
        for bt in BehaviorType::ALL {
            let json = serde_json::to_string(&bt).unwrap();
            assert_eq!(json, format!("\"{}\"", bt.as_str()));
            let back: BehaviorType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, bt);
        }
    }

    #[test]
    fn test_behavior_type_parse() {
        assert_eq!(
            BehaviorType::parse("YANDERE_OBSESSIVE"),
            Some(BehaviorType::YandereObsessive)
        );
        assert_eq!(BehaviorType::parse("UNKNOWN_TYPE"), None);
    }

    #[test]
    fn test_new_profile_starts_at_baseline() {
        let params = ProfileParams::default();
        let profile = BehaviorProfile::new(BehaviorType::AnxiousAttachment, params, now());
        assert_eq!(profile.current_phase, 1);
        assert!((profile.current_intensity - params.base_intensity).abs() < f64::EPSILON);
        assert_eq!(profile.interactions_since_phase_start, 0);
        assert!(profile.phase_history.is_empty());
        assert!(!profile.advance_armed);
    }

    #[test]
    fn test_lifetime_interactions_sums_history_and_open_phase() {
        let t = now();
        let mut profile =
            BehaviorProfile::new(BehaviorType::YandereObsessive, ProfileParams::default(), t);
        profile.phase_history.push(PhaseHistoryEntry {
            phase: 1,
            entered_at: t,
            exited_at: t,
            interactions: 4,
            trigger_kinds: BTreeSet::new(),
            exit_reason: PhaseExitReason::NaturalProgression,
        });
        profile.current_phase = 2;
        profile.interactions_since_phase_start = 3;
        assert_eq!(profile.lifetime_interactions(), 7);
    }

    #[test]
    fn test_integrity_accepts_fresh_profile() {
        let profile =
            BehaviorProfile::new(BehaviorType::BorderlinePd, ProfileParams::default(), now());
        assert!(profile.check_integrity().is_ok());
    }

    #[test]
    fn test_integrity_rejects_inverted_timestamps() {
        let t = now();
        let mut profile =
            BehaviorProfile::new(BehaviorType::BorderlinePd, ProfileParams::default(), t);
        profile.phase_history.push(PhaseHistoryEntry {
            phase: 1,
            entered_at: t,
            exited_at: t - chrono::Duration::hours(1),
            interactions: 1,
            trigger_kinds: BTreeSet::new(),
            exit_reason: PhaseExitReason::NaturalProgression,
        });
        profile.current_phase = 2;
        assert!(profile.check_integrity().is_err());
    }

    #[test]
    fn test_integrity_rejects_phase_gap() {
        let t = now();
        let mut profile =
            BehaviorProfile::new(BehaviorType::Codependency, ProfileParams::default(), t);
        profile.phase_history.push(PhaseHistoryEntry {
            phase: 1,
            entered_at: t,
            exited_at: t,
            interactions: 1,
            trigger_kinds: BTreeSet::new(),
            exit_reason: PhaseExitReason::NaturalProgression,
        });
        // Phase jumped 1 -> 4 with a natural-progression exit.
        profile.current_phase = 4;
        assert!(profile.check_integrity().is_err());
    }

    #[test]
    fn test_integrity_accepts_reset_to_phase_one() {
        let t = now();
        let mut profile =
            BehaviorProfile::new(BehaviorType::YandereObsessive, ProfileParams::default(), t);
        profile.phase_history.push(PhaseHistoryEntry {
            phase: 5,
            entered_at: t,
            exited_at: t,
            interactions: 9,
            trigger_kinds: BTreeSet::new(),
            exit_reason: PhaseExitReason::Reset,
        });
        profile.current_phase = 1;
        assert!(profile.check_integrity().is_ok());
    }

    #[test]
    fn test_display_threshold() {
        let mut profile = BehaviorProfile::new(
            BehaviorType::AnxiousAttachment,
            ProfileParams::default(),
            now(),
        );
        profile.current_intensity = 0.29;
        assert!(!profile.is_displayed());
        profile.current_intensity = 0.30;
        assert!(profile.is_displayed());
    }
}
