//! Undo/redo laws over the session wrappers.
//!
//! Run with: `cargo test -p encounter-core --test undo_properties`

use encounter_core::testing::{
    assert_fear, assert_no_dangling_refs, assert_state, sample_adversary_template,
    sample_character_draft, sample_environment_template, TestHarness,
};
use encounter_core::{
    CharacterDraft, EncounterConfig, EncounterSession, ThresholdsOverride, TrackerSelection,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Apply one of a handful of wrapped actions chosen by `choice`.
fn random_action(harness: &mut TestHarness, choice: u32) {
    let session = &mut harness.session;
    let first_adversary = session.state().adversaries.first().map(|a| a.id);
    let first_character = session.state().characters.first().map(|c| c.id);

    match choice {
        0 => {
            session.add_character(&sample_character_draft("Hero"));
        }
        1 => {
            session.add_adversary(&sample_adversary_template());
        }
        2 => {
            session.add_environment(&sample_environment_template());
        }
        3 => session.advance_round(),
        4 => {
            session.gain_fear(2);
        }
        5 => {
            session.spend_fear(1);
        }
        6 => {
            if let Some(id) = first_adversary {
                session.apply_adversary_damage(id, 12);
            }
        }
        7 => {
            if let Some(id) = first_character {
                session.handle_spotlight(Some(TrackerSelection::character(id)));
            }
        }
        8 => {
            if let Some(id) = first_character {
                session.update_character(id, |c| {
                    c.hp.adjust(-1);
                    c.add_condition("Vulnerable");
                });
            }
        }
        _ => {
            if let Some(id) = first_adversary {
                session.remove_item(TrackerSelection::adversary(id));
            }
        }
    }
}

#[test]
fn test_undo_redo_inverse_law() {
    setup();
    let mut rng = StdRng::seed_from_u64(1234);

    for _ in 0..20 {
        let mut harness = TestHarness::new();
        let steps = rng.gen_range(1..=40);
        for _ in 0..steps {
            random_action(&mut harness, rng.gen_range(0..10));
        }

        let after = harness.snapshot();
        let recorded = harness.session.undo_history().past_len();
        assert!(recorded <= steps);

        assert_eq!(harness.undo_all(), recorded);
        assert_eq!(harness.redo_all(), recorded);
        assert_state(&harness, &after);
        assert_no_dangling_refs(&harness);
    }
}

#[test]
fn test_undo_all_returns_to_empty() {
    setup();
    let mut harness = TestHarness::new();
    let initial = harness.snapshot();

    harness.character("Marlowe");
    let bear = harness.adversary();
    harness.environment();
    harness.session.gain_fear(4);
    harness.attack(bear);

    harness.undo_all();
    assert_state(&harness, &initial);
}

#[test]
fn test_redo_invalidation() {
    setup();
    let mut session = EncounterSession::default();
    session.add_character(&sample_character_draft("Marlowe"));
    session.advance_round();

    session.undo();
    assert!(session.can_redo());

    session.set_fear_pool(2);
    assert!(!session.can_redo());
    let before = session.state().clone();
    assert!(session.redo().is_none());
    assert_eq!(session.state(), &before);
}

#[test]
fn test_no_op_rollback() {
    setup();
    let mut session = EncounterSession::default();
    session.add_character(&sample_character_draft("Marlowe"));

    let characters = session.state().characters.clone();
    let past = session.undo_history().past_len();

    assert_eq!(session.add_character(&CharacterDraft::new("  ")), None);
    assert_eq!(session.state().characters, characters);
    assert_eq!(session.undo_history().past_len(), past);
}

#[test]
fn test_fear_atomicity() {
    setup();
    let mut harness = TestHarness::new();
    harness.session.set_fear_pool(3);

    assert!(!harness.session.spend_fear(5));
    assert_fear(&harness, 3);

    assert!(harness.session.spend_fear(2));
    assert_fear(&harness, 1);

    harness.session.undo();
    assert_fear(&harness, 3);
}

#[test]
fn test_removal_cascade() {
    setup();
    let mut harness = TestHarness::new();
    let a = harness.character("Marlowe");
    let b = harness.character("Ash");
    let a_sel = TrackerSelection::character(a);

    harness.session.handle_spotlight(Some(a_sel));
    harness.session.handle_spotlight(Some(TrackerSelection::character(b)));
    harness.session.handle_spotlight(Some(a_sel));
    harness.session.handle_select(Some(a_sel));

    assert!(harness.session.remove_item(a_sel));
    let state = harness.session.state();
    assert_eq!(state.spotlight, None);
    assert_eq!(state.selection, None);
    assert!(!state.spotlight_history.contains(&a_sel));
    assert_eq!(state.spotlight_history, vec![TrackerSelection::character(b)]);

    // The timeline is history, not a live reference
    let mentions = state
        .spotlight_timeline
        .iter()
        .filter(|e| e.selection == a_sel)
        .count();
    assert_eq!(mentions, 2);
    assert_no_dangling_refs(&harness);

    // Undo brings the references back with the entity
    harness.session.undo();
    let state = harness.session.state();
    assert_eq!(state.spotlight, Some(a_sel));
    assert_eq!(state.selection, Some(a_sel));
}

#[test]
fn test_undo_depth_is_bounded() {
    setup();
    let config = EncounterConfig::new().with_undo_depth(5);
    let mut session = EncounterSession::new(config);

    for _ in 0..12 {
        session.advance_round();
    }
    assert_eq!(session.undo_history().past_len(), 5);

    while session.undo().is_some() {}
    assert_eq!(session.state().round, 8);
}

#[test]
fn test_override_edits_are_undoable() {
    setup();
    let mut harness = TestHarness::new();
    let bear = harness.adversary();

    harness.session.update_adversary(bear, |a| {
        a.difficulty_override = Some(18);
        a.thresholds_override = Some(ThresholdsOverride {
            massive: Some(0),
            ..Default::default()
        });
    });
    let adversary = harness.session.roster().adversary(bear).unwrap();
    assert_eq!(adversary.effective_difficulty(), 18);
    assert!(adversary.has_modifications());

    harness.session.undo();
    let adversary = harness.session.roster().adversary(bear).unwrap();
    assert_eq!(adversary.effective_difficulty(), 14);
    assert!(!adversary.has_modifications());
}
