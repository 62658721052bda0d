//! Safety tier classification.
//!
//! Classification is a pure lookup on (behavior type, phase). Intensity
//! never participates: a profile sitting just under an advance threshold
//! classifies exactly like one that just entered the phase, so moderation
//! surfaces see stable tiers rather than a jittering scalar.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::profile::BehaviorType;

// ============================================================================
// Safety Tiers
// ============================================================================

/// Moderation tier for a (behavior type, phase) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyTier {
    Safe,
    Warning,
    Critical,
    ExtremeDanger,
}

impl SafetyTier {
    /// Wire-format name (matches the serialized form).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::ExtremeDanger => "EXTREME_DANGER",
        }
    }
}

impl fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Safety Ladders
// ============================================================================

/// One rung of a safety ladder: every phase at or above `from_phase`
/// classifies as `tier`, until a higher rung takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyBand {
    /// Lowest phase this band covers (1-based)
    pub from_phase: u32,
    /// Tier assigned to the band
    pub tier: SafetyTier,
}

/// Per-behavior-type safety ladders.
///
/// The map is immutable after construction and classification takes
/// `&self`, so it can be shared and called from any thread without
/// locking.
#[derive(Debug, Clone)]
pub struct SafetyMap {
    ladders: BTreeMap<BehaviorType, Vec<SafetyBand>>,
}

impl SafetyMap {
    /// Builds a map from per-type ladders, sorting each ladder by phase.
    ///
    /// Types absent from `ladders` fall back to the generic default.
    #[must_use]
    pub fn new(ladders: BTreeMap<BehaviorType, Vec<SafetyBand>>) -> Self {
        let mut ladders = ladders;
        for ladder in ladders.values_mut() {
            ladder.sort_by_key(|band| band.from_phase);
        }
        Self { ladders }
    }

    /// The built-in ladders: an extended ladder for the obsessive type,
    /// the generic ladder for everything else.
    #[must_use]
    pub fn builtin() -> Self {
        let mut ladders = BTreeMap::new();
        ladders.insert(BehaviorType::YandereObsessive, Self::obsessive_ladder());
        Self::new(ladders)
    }

    fn obsessive_ladder() -> Vec<SafetyBand> {
        vec![
            SafetyBand {
                from_phase: 1,
                tier: SafetyTier::Safe,
            },
            SafetyBand {
                from_phase: 4,
                tier: SafetyTier::Warning,
            },
            SafetyBand {
                from_phase: 6,
                tier: SafetyTier::Critical,
            },
            SafetyBand {
                from_phase: 7,
                tier: SafetyTier::ExtremeDanger,
            },
        ]
    }

    fn generic_ladder() -> Vec<SafetyBand> {
        vec![
            SafetyBand {
                from_phase: 1,
                tier: SafetyTier::Safe,
            },
            SafetyBand {
                from_phase: 2,
                tier: SafetyTier::Warning,
            },
            SafetyBand {
                from_phase: 4,
                tier: SafetyTier::Critical,
            },
            SafetyBand {
                from_phase: 6,
                tier: SafetyTier::ExtremeDanger,
            },
        ]
    }

    /// Builds a map from the built-in ladders plus per-type overrides.
    ///
    /// An empty override ladder means "use the built-in", so config
    /// files only spell out the types they change.
    #[must_use]
    pub fn merged(overrides: BTreeMap<BehaviorType, Vec<SafetyBand>>) -> Self {
        let mut map = Self::builtin();
        for (behavior_type, ladder) in overrides {
            if !ladder.is_empty() {
                map.ladders.insert(behavior_type, ladder);
            }
        }
        Self::new(map.ladders)
    }

    /// Classifies a (behavior type, phase) pair.
    ///
    /// The highest band whose `from_phase` is at or below `phase` wins.
    /// Phase 0 never occurs in valid profiles and classifies as the
    /// lowest band.
    #[must_use]
    pub fn classify(&self, behavior_type: BehaviorType, phase: u32) -> SafetyTier {
        let generic = Self::generic_ladder();
        let ladder = self.ladders.get(&behavior_type).map_or(&generic, |l| l);
        let mut tier = ladder.first().map_or(SafetyTier::Safe, |band| band.tier);
        for band in ladder {
            if band.from_phase <= phase {
                tier = band.tier;
            } else {
                break;
            }
        }
        tier
    }
}

impl Default for SafetyMap {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Tests
// ============================================================================
