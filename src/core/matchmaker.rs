use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::core::{compat::mutually_compatible, pool::WaitingPool, registry::Registry};
use crate::models::{ChatState, MatchOutcome, ResetOutcome, SwapOutcome};

/// Errors surfaced by engine operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("user {0} is already in an active chat")]
    AlreadyInChat(String),
}

/// The pairing engine.
///
/// Owns the registry, the waiting pool and the active pair map, and is the
/// only place where chat-state transitions happen. One instance exists per
/// process, behind a single lock; every operation runs to completion under
/// that lock, so observers only ever see fully-applied states.
///
/// # Invariants
/// - a user id is in at most one of {waiting pool, pair map}
/// - the pair map is symmetric and never maps an id to itself
/// - `Searching` ⇔ pool membership, `Chatting` ⇔ pair-map membership
#[derive(Debug)]
pub struct Matchmaker {
    registry: Registry,
    pool: WaitingPool,
    pairs: HashMap<String, String>,
    enforce_preferences: bool,
}

impl Matchmaker {
    /// `enforce_preferences` selects the preference-aware matching policy.
    /// When false every preference is treated as `Any` and the earliest
    /// waiting user always wins.
    pub fn new(enforce_preferences: bool) -> Self {
        Self {
            registry: Registry::new(),
            pool: WaitingPool::new(),
            pairs: HashMap::new(),
            enforce_preferences,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Current partner of a user, if an active pairing exists.
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        self.pairs.get(user_id).map(|id| id.as_str())
    }

    pub fn waiting_count(&self) -> usize {
        self.pool.len()
    }

    pub fn active_pair_count(&self) -> usize {
        self.pairs.len() / 2
    }

    /// Try to pair the caller with the earliest-waiting compatible candidate.
    ///
    /// Fails with [`EngineError::AlreadyInChat`] if the caller is currently
    /// paired; this is checked before anything mutates. Otherwise either pairs
    /// the caller (`Matched`) or enqueues them (`Waiting`).
    pub fn start_search(&mut self, user_id: &str) -> Result<MatchOutcome, EngineError> {
        if self.pairs.contains_key(user_id) {
            return Err(EngineError::AlreadyInChat(user_id.to_string()));
        }
        Ok(self.search_unpaired(user_id))
    }

    /// The matching scan, for callers already known not to be paired.
    fn search_unpaired(&mut self, user_id: &str) -> MatchOutcome {
        let caller = self.registry.get_or_create(user_id).clone();

        let candidate = {
            let registry = &self.registry;
            let enforce = self.enforce_preferences;
            // The scan skips the caller's own id even if it is somehow queued.
            self.pool.first_match(user_id, |id| match registry.get(id) {
                Some(other) => !enforce || mutually_compatible(&caller, other),
                None => false,
            })
        };

        match candidate {
            Some(partner_id) => {
                self.pool.remove(&partner_id);
                self.pool.remove(user_id);
                self.link(user_id, &partner_id);
                MatchOutcome::Matched(partner_id)
            }
            None => {
                self.pool.push(user_id);
                self.registry.get_or_create(user_id).state = ChatState::Searching;
                tracing::debug!("User {} is waiting ({} in pool)", user_id, self.pool.len());
                MatchOutcome::Waiting
            }
        }
    }

    /// Record a symmetric pairing and move both users to `Chatting`.
    fn link(&mut self, a: &str, b: &str) {
        let session_id = Uuid::new_v4();
        self.pairs.insert(a.to_string(), b.to_string());
        self.pairs.insert(b.to_string(), a.to_string());

        let pa = self.registry.get_or_create(a);
        pa.state = ChatState::Chatting;
        pa.partner = Some(b.to_string());

        let pb = self.registry.get_or_create(b);
        pb.state = ChatState::Chatting;
        pb.partner = Some(a.to_string());

        tracing::info!("Paired {} with {} (session {})", a, b, session_id);
    }

    /// Remove the user from the waiting pool. Returns true iff the user was
    /// actually searching; a false return means nothing changed.
    pub fn cancel_search(&mut self, user_id: &str) -> bool {
        if !self.pool.remove(user_id) {
            return false;
        }
        self.registry.get_or_create(user_id).state = ChatState::Idle;
        tracing::debug!("User {} canceled search", user_id);
        true
    }

    /// Tear down the caller's active pairing, returning the former partner so
    /// the caller can notify them. Safe to call repeatedly: once the pairing
    /// is gone, further calls return None and mutate nothing.
    pub fn end_chat(&mut self, user_id: &str) -> Option<String> {
        let partner_id = self.pairs.remove(user_id)?;
        self.pairs.remove(&partner_id);
        self.reset_profile(user_id);
        self.reset_profile(&partner_id);
        tracing::info!("Chat between {} and {} ended", user_id, partner_id);
        Some(partner_id)
    }

    /// End the current chat (if any) and immediately search again, as one
    /// engine call. The transient idle state between the two steps is never
    /// observable from outside the lock.
    pub fn swap_partner(&mut self, user_id: &str) -> SwapOutcome {
        let previous_partner = self.end_chat(user_id);
        let outcome = self.search_unpaired(user_id);
        SwapOutcome {
            previous_partner,
            outcome,
        }
    }

    /// Return the user to idle from any state: tears down an active pairing,
    /// leaves the waiting pool. Used for the "start over" command and for
    /// cleaning up after a dangling relay.
    pub fn reset(&mut self, user_id: &str) -> ResetOutcome {
        let notified_partner = self.end_chat(user_id);
        let left_pool = self.pool.remove(user_id);
        let profile = self.registry.get_or_create(user_id);
        profile.state = ChatState::Idle;
        profile.partner = None;
        ResetOutcome {
            notified_partner,
            left_pool,
        }
    }

    fn reset_profile(&mut self, user_id: &str) {
        let profile = self.registry.get_or_create(user_id);
        profile.state = ChatState::Idle;
        profile.partner = None;
    }

    /// Full consistency audit of pool, pair map and profile states. Used by
    /// the test suite after every operation sequence.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for id in self.pool.iter() {
            if !seen.insert(id) {
                return Err(format!("{} queued twice", id));
            }
            if self.pairs.contains_key(id) {
                return Err(format!("{} is both waiting and paired", id));
            }
            match self.registry.get(id) {
                Some(p) if p.state == ChatState::Searching && p.partner.is_none() => {}
                _ => return Err(format!("{} queued without Searching state", id)),
            }
        }
        for (a, b) in &self.pairs {
            if a == b {
                return Err(format!("{} paired with itself", a));
            }
            if self.pairs.get(b) != Some(a) {
                return Err(format!("pairing {} -> {} is not symmetric", a, b));
            }
            match self.registry.get(a) {
                Some(p) if p.state == ChatState::Chatting && p.partner.as_deref() == Some(b.as_str()) => {}
                _ => return Err(format!("{} paired without Chatting state", a)),
            }
        }
        for profile in self.registry.iter() {
            let queued = self.pool.contains(&profile.user_id);
            let paired = self.pairs.contains_key(&profile.user_id);
            let expected = match profile.state {
                ChatState::Idle => !queued && !paired,
                ChatState::Searching => queued && !paired,
                ChatState::Chatting => paired && !queued,
            };
            if !expected {
                return Err(format!(
                    "{} has state {:?} but queued={} paired={}",
                    profile.user_id, profile.state, queued, paired
                ));
            }
        }
        Ok(())
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, PreferredGender};

    fn engine() -> Matchmaker {
        Matchmaker::new(true)
    }

    #[test]
    fn test_first_searcher_waits() {
        let mut mm = engine();
        assert_eq!(mm.start_search("a"), Ok(MatchOutcome::Waiting));
        assert_eq!(mm.registry().get("a").unwrap().state, ChatState::Searching);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_second_searcher_matches_first() {
        let mut mm = engine();
        assert_eq!(mm.start_search("a"), Ok(MatchOutcome::Waiting));
        assert_eq!(mm.start_search("b"), Ok(MatchOutcome::Matched("a".to_string())));

        let a = mm.registry().get("a").unwrap();
        let b = mm.registry().get("b").unwrap();
        assert_eq!(a.state, ChatState::Chatting);
        assert_eq!(b.state, ChatState::Chatting);
        assert_eq!(a.partner.as_deref(), Some("b"));
        assert_eq!(b.partner.as_deref(), Some("a"));
        assert_eq!(mm.waiting_count(), 0);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_fifo_pairing_with_three_users() {
        let mut mm = engine();
        assert_eq!(mm.start_search("a"), Ok(MatchOutcome::Waiting));
        assert_eq!(mm.start_search("b"), Ok(MatchOutcome::Matched("a".to_string())));
        assert_eq!(mm.start_search("c"), Ok(MatchOutcome::Waiting));

        assert_eq!(mm.waiting_count(), 1);
        assert_eq!(mm.registry().get("c").unwrap().state, ChatState::Searching);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_search_while_chatting_is_rejected() {
        let mut mm = engine();
        mm.start_search("a").unwrap();
        mm.start_search("b").unwrap();

        assert_eq!(
            mm.start_search("a"),
            Err(EngineError::AlreadyInChat("a".to_string()))
        );
        // nothing moved
        assert_eq!(mm.partner_of("a"), Some("b"));
        assert_eq!(mm.waiting_count(), 0);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_end_chat_is_symmetric_and_idempotent() {
        let mut mm = engine();
        mm.start_search("a").unwrap();
        mm.start_search("b").unwrap();

        assert_eq!(mm.end_chat("a"), Some("b".to_string()));
        assert_eq!(mm.registry().get("a").unwrap().state, ChatState::Idle);
        assert_eq!(mm.registry().get("b").unwrap().state, ChatState::Idle);
        assert!(mm.registry().get("b").unwrap().partner.is_none());

        assert_eq!(mm.end_chat("a"), None);
        assert_eq!(mm.end_chat("b"), None);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_cancel_search() {
        let mut mm = engine();
        mm.start_search("a").unwrap();
        assert!(mm.cancel_search("a"));
        assert_eq!(mm.registry().get("a").unwrap().state, ChatState::Idle);
        assert!(!mm.cancel_search("a"));
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_cancel_when_not_searching_changes_nothing() {
        let mut mm = engine();
        mm.start_search("a").unwrap();
        assert!(!mm.cancel_search("b"));
        assert_eq!(mm.registry().get("a").unwrap().state, ChatState::Searching);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_swap_partner_rematches_from_pool() {
        let mut mm = engine();
        mm.start_search("a").unwrap();
        mm.start_search("b").unwrap(); // a+b chatting
        mm.start_search("c").unwrap(); // c waiting

        let swap = mm.swap_partner("a");
        assert_eq!(swap.previous_partner, Some("b".to_string()));
        assert_eq!(swap.outcome, MatchOutcome::Matched("c".to_string()));

        assert_eq!(mm.registry().get("b").unwrap().state, ChatState::Idle);
        assert_eq!(mm.partner_of("a"), Some("c"));
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_swap_partner_without_chat_just_searches() {
        let mut mm = engine();
        let swap = mm.swap_partner("a");
        assert_eq!(swap.previous_partner, None);
        assert_eq!(swap.outcome, MatchOutcome::Waiting);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_preference_filtering_is_mutual() {
        let mut mm = engine();
        // m1 arrives first, accepts anyone
        mm.registry_mut().set_gender("m1", Gender::Male);
        mm.registry_mut().set_preference("m1", PreferredGender::Any);
        // m2 wants a female partner
        mm.registry_mut().set_gender("m2", Gender::Male);
        mm.registry_mut().set_preference("m2", PreferredGender::Female);
        mm.registry_mut().set_gender("f1", Gender::Female);
        mm.registry_mut().set_preference("f1", PreferredGender::Any);

        assert_eq!(mm.start_search("m1"), Ok(MatchOutcome::Waiting));
        // m1 arrived first but m2 must not match a male
        assert_eq!(mm.start_search("m2"), Ok(MatchOutcome::Waiting));
        // f1 matches the earliest compatible waiter, which is m1
        assert_eq!(mm.start_search("f1"), Ok(MatchOutcome::Matched("m1".to_string())));

        assert_eq!(mm.registry().get("m2").unwrap().state, ChatState::Searching);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_preferences_ignored_when_disabled() {
        let mut mm = Matchmaker::new(false);
        mm.registry_mut().set_gender("m1", Gender::Male);
        mm.registry_mut().set_preference("m1", PreferredGender::Any);
        mm.registry_mut().set_gender("m2", Gender::Male);
        mm.registry_mut().set_preference("m2", PreferredGender::Female);

        assert_eq!(mm.start_search("m1"), Ok(MatchOutcome::Waiting));
        assert_eq!(mm.start_search("m2"), Ok(MatchOutcome::Matched("m1".to_string())));
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_reset_tears_down_pair_and_pool() {
        let mut mm = engine();
        mm.start_search("a").unwrap();
        mm.start_search("b").unwrap();

        let reset = mm.reset("a");
        assert_eq!(reset.notified_partner, Some("b".to_string()));
        assert!(!reset.left_pool);
        assert_eq!(mm.registry().get("b").unwrap().state, ChatState::Idle);

        mm.start_search("c").unwrap();
        let reset = mm.reset("c");
        assert_eq!(reset.notified_partner, None);
        assert!(reset.left_pool);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn test_unknown_ids_are_not_errors() {
        let mut mm = engine();
        assert!(!mm.cancel_search("ghost"));
        assert_eq!(mm.end_chat("ghost"), None);
        assert_eq!(mm.partner_of("ghost"), None);
    }
}
