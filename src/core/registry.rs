use std::collections::HashMap;

use crate::models::{Gender, PreferredGender, UserProfile};

/// Single source of truth for per-user profiles.
///
/// Profiles are created lazily on first interaction and kept for the process
/// lifetime; there is no eviction. All pairing-state transitions go through
/// the matchmaker, which owns this registry.
#[derive(Debug, Default)]
pub struct Registry {
    users: HashMap<String, UserProfile>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    /// Look up a profile, creating one with defaults if the user was never
    /// seen before. Idempotent.
    pub fn get_or_create(&mut self, user_id: &str) -> &mut UserProfile {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id))
    }

    pub fn get(&self, user_id: &str) -> Option<&UserProfile> {
        self.users.get(user_id)
    }

    /// Pure field update; does not touch pairing state.
    pub fn set_gender(&mut self, user_id: &str, gender: Gender) {
        self.get_or_create(user_id).gender = gender;
    }

    /// Pure field update; does not touch pairing state.
    pub fn set_preference(&mut self, user_id: &str, preference: PreferredGender) {
        self.get_or_create(user_id).preferred_gender = preference;
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserProfile> {
        self.users.values()
    }
}
