//! Phase transition policy.
//!
//! Evaluated once per processed interaction, after intensity has been
//! updated. Advancing requires the advance threshold to hold at the end
//! of two consecutive interactions: the first arms the profile, the
//! second advances it. A spike that appears and decays within a single
//! interaction therefore never advances a phase. Regression fires as
//! soon as intensity drops to the regress threshold, which sits a fixed
//! margin below the advance threshold that was crossed on the way up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::schema::PhaseTable;
use crate::error::PhaseError;
use crate::profile::{BehaviorProfile, BehaviorType, PhaseExitReason, PhaseHistoryEntry};

/// A phase change produced by one policy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Behavior type whose profile transitioned
    pub behavior_type: BehaviorType,
    /// Phase before the transition
    pub from_phase: u32,
    /// Phase after the transition
    pub to_phase: u32,
    /// Why the transition happened
    pub reason: PhaseExitReason,
    /// When the transition happened
    pub at: DateTime<Utc>,
}

/// Evaluates the policy for one profile at the end of an interaction.
///
/// At most one phase step happens per interaction. When no transition
/// fires, the arming flag is refreshed from the current intensity.
///
/// # Errors
///
/// Returns [`PhaseError::PhaseOutOfRange`] when the profile occupies a
/// phase the table does not define.
pub fn step(
    profile: &mut BehaviorProfile,
    table: &PhaseTable,
    now: DateTime<Utc>,
) -> Result<Option<PhaseTransition>, PhaseError> {
    let phase = profile.current_phase;
    if phase > table.max_phase() {
        return Err(PhaseError::PhaseOutOfRange {
            behavior_type: profile.behavior_type,
            phase,
            max_phase: table.max_phase(),
        });
    }

    let intensity = profile.current_intensity;

    if let Some(advance) = table.advance_threshold(phase) {
        if intensity >= advance {
            if profile.advance_armed {
                return Ok(Some(transition(
                    profile,
                    phase + 1,
                    PhaseExitReason::NaturalProgression,
                    now,
                )));
            }
            // First interaction at or above the threshold: arm only.
            profile.advance_armed = true;
            return Ok(None);
        }
    }

    if let Some(regress) = table.regress_threshold(phase) {
        if intensity <= regress {
            return Ok(Some(transition(
                profile,
                phase - 1,
                PhaseExitReason::Regression,
                now,
            )));
        }
    }

    profile.advance_armed = false;
    Ok(None)
}

/// Returns a profile to phase 1, closing the open history entry with a
/// reset reason and settling intensity back to the baseline.
pub fn reset(profile: &mut BehaviorProfile, now: DateTime<Utc>) -> PhaseTransition {
    let from = profile.current_phase;
    let record = transition(profile, 1, PhaseExitReason::Reset, now);
    profile.current_intensity = profile.params.base_intensity;
    info!(
        behavior_type = %profile.behavior_type,
        from_phase = from,
        "phase reset"
    );
    record
}

fn transition(
    profile: &mut BehaviorProfile,
    to_phase: u32,
    reason: PhaseExitReason,
    now: DateTime<Utc>,
) -> PhaseTransition {
    let from_phase = profile.current_phase;
    // Callers may supply slightly out-of-order timestamps; history
    // entries must still close at or after they opened.
    let now = now.max(profile.phase_started_at);
    profile.phase_history.push(PhaseHistoryEntry {
        phase: from_phase,
        entered_at: profile.phase_started_at,
        exited_at: now,
        interactions: profile.interactions_since_phase_start,
        trigger_kinds: std::mem::take(&mut profile.open_phase_trigger_kinds),
        exit_reason: reason,
    });
    profile.current_phase = to_phase;
    profile.phase_started_at = now;
    profile.interactions_since_phase_start = 0;
    profile.advance_armed = false;
    info!(
        behavior_type = %profile.behavior_type,
        from_phase,
        to_phase,
        ?reason,
        "phase transition"
    );
    PhaseTransition {
        behavior_type: profile.behavior_type,
        from_phase,
        to_phase,
        reason,
        at: now,
    }
}

// ============================================================================
// Tests
// ============================================================================
