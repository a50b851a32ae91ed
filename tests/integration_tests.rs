// Integration tests for the pairing engine: full operation sequences with an
// invariant audit after every step.

use pairmatch::core::{EngineError, Matchmaker};
use pairmatch::models::{ChatState, Gender, MatchOutcome, PreferredGender};

fn engine_with(users: &[(&str, Gender, PreferredGender)]) -> Matchmaker {
    let mut mm = Matchmaker::new(true);
    for (id, gender, preference) in users {
        mm.registry_mut().set_gender(id, *gender);
        mm.registry_mut().set_preference(id, *preference);
    }
    mm
}

fn audit(mm: &Matchmaker) {
    if let Err(msg) = mm.check_invariants() {
        panic!("invariant violation: {}", msg);
    }
}

#[test]
fn test_pair_forms_in_arrival_order() {
    let mut mm = Matchmaker::new(true);

    assert_eq!(mm.start_search("a"), Ok(MatchOutcome::Waiting));
    audit(&mm);

    assert_eq!(mm.start_search("b"), Ok(MatchOutcome::Matched("a".to_string())));
    audit(&mm);

    // a's Waiting transitioned into Chatting via b's call
    let a = mm.registry().get("a").unwrap();
    assert_eq!(a.state, ChatState::Chatting);
    assert_eq!(a.partner.as_deref(), Some("b"));
}

#[test]
fn test_three_user_sequence() {
    let mut mm = Matchmaker::new(true);

    assert_eq!(mm.start_search("a"), Ok(MatchOutcome::Waiting));
    assert_eq!(mm.start_search("b"), Ok(MatchOutcome::Matched("a".to_string())));
    assert_eq!(mm.start_search("c"), Ok(MatchOutcome::Waiting));
    audit(&mm);

    assert_eq!(mm.waiting_count(), 1);
    assert_eq!(mm.active_pair_count(), 1);
    assert_eq!(mm.registry().get("c").unwrap().state, ChatState::Searching);
}

#[test]
fn test_end_chat_then_double_end() {
    let mut mm = Matchmaker::new(true);
    mm.start_search("x").unwrap();
    mm.start_search("y").unwrap();

    assert_eq!(mm.end_chat("x"), Some("y".to_string()));
    audit(&mm);

    for id in ["x", "y"] {
        let p = mm.registry().get(id).unwrap();
        assert_eq!(p.state, ChatState::Idle);
        assert!(p.partner.is_none());
    }

    // second call must be a quiet no-op
    assert_eq!(mm.end_chat("x"), None);
    audit(&mm);
}

#[test]
fn test_already_in_chat_does_not_mutate() {
    let mut mm = Matchmaker::new(true);
    mm.start_search("a").unwrap();
    mm.start_search("b").unwrap();
    mm.start_search("c").unwrap(); // c waits

    let err = mm.start_search("a").unwrap_err();
    assert_eq!(err, EngineError::AlreadyInChat("a".to_string()));
    audit(&mm);

    // neither the pool nor the pairing moved
    assert_eq!(mm.waiting_count(), 1);
    assert_eq!(mm.partner_of("a"), Some("b"));
    assert_eq!(mm.registry().get("c").unwrap().state, ChatState::Searching);
}

#[test]
fn test_preference_asymmetry_blocks_match() {
    // a male searcher who wants a female partner must never be matched with
    // a male candidate, even one that arrived first and accepts anyone
    let mut mm = engine_with(&[
        ("male_any", Gender::Male, PreferredGender::Any),
        ("male_wants_female", Gender::Male, PreferredGender::Female),
        ("female_any", Gender::Female, PreferredGender::Any),
    ]);

    assert_eq!(mm.start_search("male_any"), Ok(MatchOutcome::Waiting));
    assert_eq!(mm.start_search("male_wants_female"), Ok(MatchOutcome::Waiting));
    audit(&mm);

    // the female searcher skips nobody; earliest compatible candidate wins
    assert_eq!(
        mm.start_search("female_any"),
        Ok(MatchOutcome::Matched("male_any".to_string()))
    );
    audit(&mm);

    assert_eq!(
        mm.registry().get("male_wants_female").unwrap().state,
        ChatState::Searching
    );
}

#[test]
fn test_mutual_preferences_pair_across_pool() {
    let mut mm = engine_with(&[
        ("m1", Gender::Male, PreferredGender::Female),
        ("m2", Gender::Male, PreferredGender::Any),
        ("f1", Gender::Female, PreferredGender::Male),
    ]);

    mm.start_search("m1").unwrap();
    mm.start_search("m2").unwrap();
    assert_eq!(mm.waiting_count(), 2);

    // f1 matches m1: earliest arrival among mutually compatible candidates
    assert_eq!(mm.start_search("f1"), Ok(MatchOutcome::Matched("m1".to_string())));
    audit(&mm);
    assert_eq!(mm.waiting_count(), 1);
}

#[test]
fn test_swap_partner_full_cycle() {
    let mut mm = Matchmaker::new(true);
    mm.start_search("a").unwrap();
    mm.start_search("b").unwrap();
    mm.start_search("c").unwrap();

    let swap = mm.swap_partner("b");
    audit(&mm);
    assert_eq!(swap.previous_partner, Some("a".to_string()));
    assert_eq!(swap.outcome, MatchOutcome::Matched("c".to_string()));

    // the abandoned partner is idle and free to search again
    assert_eq!(mm.registry().get("a").unwrap().state, ChatState::Idle);
    assert_eq!(mm.start_search("a"), Ok(MatchOutcome::Waiting));
    audit(&mm);
}

#[test]
fn test_swap_with_empty_pool_leaves_user_waiting() {
    let mut mm = Matchmaker::new(true);
    mm.start_search("a").unwrap();
    mm.start_search("b").unwrap();

    let swap = mm.swap_partner("a");
    audit(&mm);
    assert_eq!(swap.previous_partner, Some("b".to_string()));
    // b went idle with the teardown, so nobody is left to match
    assert_eq!(swap.outcome, MatchOutcome::Waiting);
    assert_eq!(mm.registry().get("a").unwrap().state, ChatState::Searching);
}

#[test]
fn test_cancel_does_not_disturb_other_users() {
    let mut mm = Matchmaker::new(true);
    mm.start_search("a").unwrap();
    mm.start_search("b").unwrap(); // paired with a
    mm.start_search("c").unwrap(); // waiting

    assert!(!mm.cancel_search("zz"));
    audit(&mm);
    assert_eq!(mm.partner_of("a"), Some("b"));
    assert_eq!(mm.registry().get("c").unwrap().state, ChatState::Searching);

    assert!(mm.cancel_search("c"));
    audit(&mm);
    assert_eq!(mm.registry().get("c").unwrap().state, ChatState::Idle);
}

#[test]
fn test_unreachable_partner_teardown() {
    // delivery failure is handled by resetting the unreachable user, which
    // must release the partner symmetrically
    let mut mm = Matchmaker::new(true);
    mm.start_search("a").unwrap();
    mm.start_search("b").unwrap();

    let reset = mm.reset("b");
    audit(&mm);
    assert_eq!(reset.notified_partner, Some("a".to_string()));

    let a = mm.registry().get("a").unwrap();
    assert_eq!(a.state, ChatState::Idle);
    assert!(a.partner.is_none());
}

#[test]
fn test_long_mixed_sequence_preserves_invariants() {
    let mut mm = Matchmaker::new(true);
    let users = ["u0", "u1", "u2", "u3", "u4", "u5", "u6", "u7"];

    for id in users {
        let _ = mm.start_search(id);
        audit(&mm);
    }
    // 4 pairs formed, nobody waiting
    assert_eq!(mm.active_pair_count(), 4);
    assert_eq!(mm.waiting_count(), 0);

    mm.end_chat("u0");
    audit(&mm);
    let _ = mm.swap_partner("u2");
    audit(&mm);
    mm.reset("u4");
    audit(&mm);
    let _ = mm.start_search("u1");
    audit(&mm);
    mm.cancel_search("u1");
    audit(&mm);

    // a user can never end up paired with itself or in two places at once;
    // the audit above enforces it after every operation
}
