//! Concurrent profile store.
//!
//! Profiles are grouped by character: one map entry holds every behavior
//! profile a character has, so writes for the same character are
//! serialized under the shard entry guard while distinct characters
//! never contend. Lock acquisition uses `try_entry` with a bounded
//! retry; exhaustion surfaces as [`ProfileError::Contended`] and the
//! update is not applied. Multi-profile mutations go through
//! [`ProfileStore::update_character`], which stages changes on a copy
//! and commits only when the whole mutation succeeds.

use std::collections::BTreeMap;
use std::thread;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::warn;

use crate::error::ProfileError;
use crate::profile::{BehaviorProfile, BehaviorType, CharacterId, ProfileParams};

/// Default number of `try_entry` attempts before reporting contention.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

type ProfileMap = BTreeMap<BehaviorType, BehaviorProfile>;

/// Concurrent map of behavior profiles, keyed by character.
#[derive(Debug)]
pub struct ProfileStore {
    characters: DashMap<CharacterId, ProfileMap>,
    max_attempts: u32,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    /// Creates an empty store with the default contention budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates an empty store with an explicit contention budget.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            characters: DashMap::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Number of profiles currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether the store holds no profiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a profile exists for the character and behavior type.
    #[must_use]
    pub fn contains(&self, character: &CharacterId, behavior_type: BehaviorType) -> bool {
        self.characters
            .get(character)
            .is_some_and(|entry| entry.value().contains_key(&behavior_type))
    }

    /// Creates a fresh profile at phase 1.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::AlreadyActive`] if the character already
    /// has a profile for the behavior type, and
    /// [`ProfileError::Contended`] if the shard lock could not be
    /// acquired within the retry budget.
    pub fn activate(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
        params: ProfileParams,
        now: DateTime<Utc>,
    ) -> Result<(), ProfileError> {
        match self.try_entry(character.clone())? {
            Entry::Occupied(mut entry) => {
                if entry.get().contains_key(&behavior_type) {
                    return Err(ProfileError::AlreadyActive {
                        character: character.clone(),
                        behavior_type,
                    });
                }
                entry
                    .get_mut()
                    .insert(behavior_type, BehaviorProfile::new(behavior_type, params, now));
                Ok(())
            }
            Entry::Vacant(slot) => {
                let mut profiles = ProfileMap::new();
                profiles.insert(behavior_type, BehaviorProfile::new(behavior_type, params, now));
                slot.insert(profiles);
                Ok(())
            }
        }
    }

    /// Returns a snapshot clone of one profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] if no profile exists for the
    /// character and behavior type.
    pub fn get(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
    ) -> Result<BehaviorProfile, ProfileError> {
        self.characters
            .get(character)
            .and_then(|entry| entry.value().get(&behavior_type).cloned())
            .ok_or_else(|| ProfileError::NotFound {
                character: character.clone(),
                behavior_type,
            })
    }

    /// Snapshot clones of every profile belonging to a character, in
    /// behavior type order.
    ///
    /// Empty for unknown characters; never an error.
    #[must_use]
    pub fn profiles_for(&self, character: &CharacterId) -> Vec<BehaviorProfile> {
        self.characters
            .get(character)
            .map_or_else(Vec::new, |entry| entry.value().values().cloned().collect())
    }

    /// Applies a mutation to one profile under the character's entry
    /// guard.
    ///
    /// The profile's phase history is integrity-checked before the
    /// closure runs; a corrupt profile is left untouched and reported.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] for unknown profiles,
    /// [`ProfileError::Contended`] when the retry budget is exhausted,
    /// and [`ProfileError::CorruptHistory`] when the integrity check
    /// fails.
    pub fn update<T>(
        &self,
        character: &CharacterId,
        behavior_type: BehaviorType,
        mutate: impl FnOnce(&mut BehaviorProfile) -> T,
    ) -> Result<T, ProfileError> {
        match self.try_entry(character.clone())? {
            Entry::Vacant(_) => Err(ProfileError::NotFound {
                character: character.clone(),
                behavior_type,
            }),
            Entry::Occupied(mut entry) => {
                let profile = entry.get_mut().get_mut(&behavior_type).ok_or_else(|| {
                    ProfileError::NotFound {
                        character: character.clone(),
                        behavior_type,
                    }
                })?;
                if let Err(detail) = profile.check_integrity() {
                    return Err(ProfileError::CorruptHistory {
                        character: character.clone(),
                        behavior_type,
                        detail,
                    });
                }
                Ok(mutate(profile))
            }
        }
    }

    /// Applies one mutation across every profile a character has. The
    /// changes are staged on a copy and committed only when the closure
    /// returns `Ok`; a failing closure leaves the stored profiles
    /// untouched, so the caller can retry the whole mutation.
    ///
    /// Every profile is integrity-checked before the closure runs. A
    /// character with no profiles runs the closure over an empty map and
    /// commits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Contended`] when the retry budget is
    /// exhausted and [`ProfileError::CorruptHistory`] when any profile
    /// fails its integrity check. The closure's own error comes back in
    /// the inner `Result`.
    pub fn update_character<T, E>(
        &self,
        character: &CharacterId,
        mutate: impl FnOnce(&mut ProfileMap) -> Result<T, E>,
    ) -> Result<Result<T, E>, ProfileError> {
        match self.try_entry(character.clone())? {
            Entry::Vacant(_) => {
                let mut staged = ProfileMap::new();
                Ok(mutate(&mut staged))
            }
            Entry::Occupied(mut entry) => {
                for (behavior_type, profile) in entry.get() {
                    if let Err(detail) = profile.check_integrity() {
                        return Err(ProfileError::CorruptHistory {
                            character: character.clone(),
                            behavior_type: *behavior_type,
                            detail,
                        });
                    }
                }
                let mut staged = entry.get().clone();
                let outcome = mutate(&mut staged);
                if outcome.is_ok() {
                    *entry.get_mut() = staged;
                }
                Ok(outcome)
            }
        }
    }

    fn try_entry(
        &self,
        character: CharacterId,
    ) -> Result<Entry<'_, CharacterId, ProfileMap>, ProfileError> {
        for attempt in 0..self.max_attempts {
            match self.characters.try_entry(character.clone()) {
                Some(entry) => return Ok(entry),
                None => {
                    if attempt + 1 < self.max_attempts {
                        thread::yield_now();
                    }
                }
            }
        }
        warn!(
            character = %character,
            attempts = self.max_attempts,
            "character shard contended, giving up"
        );
        Err(ProfileError::Contended {
            character,
            attempts: self.max_attempts,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
