//! Per-character progression rollup.
//!
//! [`ProgressionState`] is a derived view, computed from profile
//! snapshots at read time rather than maintained incrementally, so it
//! can never drift from the profiles it summarizes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::{BehaviorProfile, BehaviorType};

/// Externally supplied sentiment tallies for one character.
///
/// The engine stores these verbatim; it never infers sentiment from
/// trigger detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    /// Interactions flagged positive by the caller
    pub positive: u64,
    /// Interactions flagged negative by the caller
    pub negative: u64,
}

/// Rolled-up progression view for one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Interactions processed for this character
    pub total_interactions: u64,
    /// Externally recorded positive interactions
    pub positive_interactions: u64,
    /// Externally recorded negative interactions
    pub negative_interactions: u64,
    /// Current intensity per active behavior type
    pub current_intensities: BTreeMap<BehaviorType, f64>,
    /// Current phase per active behavior type
    pub current_phases: BTreeMap<BehaviorType, u32>,
}

impl ProgressionState {
    /// Builds the rollup from profile snapshots.
    ///
    /// Every active profile sees the same interaction stream, so the
    /// character's interaction total is the largest per-profile lifetime
    /// count (a later-activated profile has seen fewer). A character
    /// with no profiles rolls up to an all-zero state.
    #[must_use]
    pub fn from_profiles(profiles: &[BehaviorProfile], sentiment: SentimentCounts) -> Self {
        Self {
            total_interactions: profiles
                .iter()
                .map(BehaviorProfile::lifetime_interactions)
                .max()
                .unwrap_or(0),
            positive_interactions: sentiment.positive,
            negative_interactions: sentiment.negative,
            current_intensities: profiles
                .iter()
                .map(|p| (p.behavior_type, p.current_intensity))
                .collect(),
            current_phases: profiles
                .iter()
                .map(|p| (p.behavior_type, p.current_phase))
                .collect(),
        }
    }

    /// Whether the character has no progression data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_intensities.is_empty()
            && self.total_interactions == 0
            && self.positive_interactions == 0
            && self.negative_interactions == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::profile::ProfileParams;

    #[test]
    fn test_empty_profile_set_rolls_up_to_zero() {
        let state = ProgressionState::from_profiles(&[], SentimentCounts::default());
        assert!(state.is_empty());
        assert_eq!(state.total_interactions, 0);
        assert!(state.current_intensities.is_empty());
    }

    #[test]
    fn test_rollup_takes_max_interaction_count() {
        let t = Utc::now();
        let mut a = BehaviorProfile::new(BehaviorType::AnxiousAttachment, ProfileParams::default(), t);
        a.interactions_since_phase_start = 12;
        // Activated later; has seen fewer interactions.
        let mut b = BehaviorProfile::new(BehaviorType::YandereObsessive, ProfileParams::default(), t);
        b.interactions_since_phase_start = 4;
        let state = ProgressionState::from_profiles(&[a, b], SentimentCounts::default());
        assert_eq!(state.total_interactions, 12);
        assert_eq!(state.current_intensities.len(), 2);
    }

    #[test]
    fn test_sentiment_passes_through_verbatim() {
        let state = ProgressionState::from_profiles(
            &[],
            SentimentCounts {
                positive: 3,
                negative: 5,
            },
        );
        assert_eq!(state.positive_interactions, 3);
        assert_eq!(state.negative_interactions, 5);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_rollup_reflects_profile_state() {
        let t = Utc::now();
        let mut p = BehaviorProfile::new(BehaviorType::BorderlinePd, ProfileParams::default(), t);
        p.current_intensity = 0.72;
        p.current_phase = 3;
        let state = ProgressionState::from_profiles(&[p], SentimentCounts::default());
        assert!(
            (state.current_intensities[&BehaviorType::BorderlinePd] - 0.72).abs() < f64::EPSILON
        );
        assert_eq!(state.current_phases[&BehaviorType::BorderlinePd], 3);
    }
}
