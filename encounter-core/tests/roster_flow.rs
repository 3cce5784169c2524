//! End-to-end encounter flows: catalog JSON in, roster state out.
//!
//! Run with: `cargo test -p encounter-core --test roster_flow`

use encounter_core::testing::{assert_hp, assert_no_dangling_refs, TestHarness};
use encounter_core::{
    AdversaryTemplate, AttackOverride, CharacterDraft, DamageSeverity, EffectiveThresholds,
    EncounterSession, EnvironmentTemplate, RollType, RosterState, Thresholds, TrackerKind,
    TrackerSelection, TrackerTab,
};
use tracing_subscriber::EnvFilter;

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const ADVERSARY_JSON: &str = r#"{
    "name": "Jagged Knife Lackey",
    "tier": 1,
    "role": "Minion",
    "description": "A thief with a rusty knife.",
    "motives": "Escape, profit",
    "difficulty": 9,
    "attack": { "name": "Knife", "modifier": -2, "range": "Melee", "damage": "2 phy" },
    "thresholds": "None",
    "hp": 1,
    "stress": 1,
    "features": [
        "Minion (3): Defeated when it takes any damage.",
        { "name": "Group Attack", "type": "Action", "description": "Spend a Fear to attack together." }
    ]
}"#;

const BRUISER_JSON: &str = r#"{
    "name": "Bear",
    "tier": 1,
    "role": "Bruiser",
    "difficulty": 13,
    "attack": { "name": "Claws", "modifier": "+1", "range": "Melee", "damage": "1d8+3 phy" },
    "thresholds": { "major": 8, "severe": 16 },
    "hp": 7,
    "stress": 2
}"#;

const ENVIRONMENT_JSON: &str = r#"{
    "name": "Raging River",
    "tier": 1,
    "type": "Traversal",
    "impulses": ["Bar crossing", "Carry away the unready"],
    "difficulty": 10,
    "features": [
        { "name": "Dangerous Crossing", "type": "Passive", "description": "Crossing requires a Progress Countdown (4)." },
        "Undertow: Spend a Fear to drag a PC downstream."
    ]
}"#;

#[test]
fn test_catalog_entries_load_and_track() {
    setup();
    let lackey: AdversaryTemplate = serde_json::from_str(ADVERSARY_JSON).unwrap();
    let river: EnvironmentTemplate = serde_json::from_str(ENVIRONMENT_JSON).unwrap();
    assert_eq!(lackey.attack.modifier, "-2");
    assert_eq!(lackey.thresholds, Thresholds::Text("None".to_string()));

    let mut session = EncounterSession::default();
    let lackey_id = session.add_adversary(&lackey);
    let river_id = session.add_environment(&river);

    let adversary = session.roster().adversary(lackey_id).unwrap();
    assert_eq!(adversary.effective_attack().modifier, -2);
    assert_eq!(
        adversary.effective_thresholds(),
        EffectiveThresholds::Text("None".to_string())
    );
    assert_eq!(adversary.effective_features()[0].name(), "Minion (3)");

    // Free-text thresholds mark nothing
    assert_eq!(session.apply_adversary_damage(lackey_id, 5), None);

    let environment = session.roster().environment(river_id).unwrap();
    assert_eq!(environment.features[1].name, "Undertow");
    assert_eq!(
        session.state().selection,
        Some(TrackerSelection::environment(river_id))
    );
}

#[test]
fn test_bruiser_override_scenario() {
    setup();
    let bear: AdversaryTemplate = serde_json::from_str(BRUISER_JSON).unwrap();
    let mut harness = TestHarness::new();
    let id = harness.session.add_adversary(&bear);

    harness.session.update_adversary(id, |a| a.difficulty_override = Some(15));
    let adversary = harness.session.roster().adversary(id).unwrap();
    assert_eq!(adversary.effective_difficulty(), 15);
    assert_eq!(adversary.source.difficulty, 13);
    assert!(adversary.has_modifications());
    assert_eq!(
        adversary.effective_thresholds(),
        EffectiveThresholds::Values {
            major: 8,
            severe: 16,
            massive: 32,
        }
    );

    harness.session.update_adversary(id, |a| a.difficulty_override = None);
    let adversary = harness.session.roster().adversary(id).unwrap();
    assert_eq!(adversary.effective_difficulty(), 13);
    assert!(!adversary.has_modifications());

    assert_eq!(
        harness.session.apply_adversary_damage(id, 8),
        Some(DamageSeverity::Major)
    );
    assert_eq!(
        harness.session.apply_adversary_damage(id, 3),
        Some(DamageSeverity::Minor)
    );
    assert_hp(&harness, id, 4, 7);
}

#[test]
fn test_full_round() {
    setup();
    let mut harness = TestHarness::new();
    let marlowe = harness.character("Marlowe");
    let ash = harness.character("Ash");
    let bear = harness.adversary();
    harness.session.set_active_tab(TrackerTab::Adversaries);

    harness
        .session
        .handle_spotlight(Some(TrackerSelection::character(marlowe)));
    harness
        .session
        .update_character(marlowe, |c| c.hp.adjust(-2));

    harness.session.gain_fear(1);
    assert!(harness.session.spend_fear(1));
    harness
        .session
        .handle_spotlight(Some(TrackerSelection::adversary(bear)));
    let (_, damage) = harness.attack(bear).unwrap();
    assert!((4..=11).contains(&damage));
    assert_eq!(harness.session.roster().adversaries_waiting().count(), 0);

    harness
        .session
        .handle_spotlight(Some(TrackerSelection::character(ash)));
    harness.session.advance_round();

    let state = harness.session.state();
    assert_eq!(state.round, 2);
    assert_eq!(state.spotlight_history.len(), 3);
    assert_eq!(state.spotlight_history[0], TrackerSelection::character(ash));
    assert_eq!(state.spotlight_timeline.len(), 3);
    assert!(state.spotlight_timeline.iter().all(|e| e.round == 1));
    assert_eq!(state.roll_history[0].roll_type, RollType::Damage);
    assert_eq!(state.roll_history[1].roll_type, RollType::Attack);
    assert_eq!(state.roll_history[1].kind, TrackerKind::Adversary);
    assert_eq!(harness.session.roster().adversaries_waiting().count(), 1);
    assert_hp(&harness, marlowe, 4, 6);
    assert_eq!(harness.session.active_tab(), TrackerTab::Adversaries);
    assert_no_dangling_refs(&harness);
}

#[test]
fn test_saved_state_round_trips_through_json() {
    setup();
    let mut harness = TestHarness::new();
    let hero = harness.character("Marlowe");
    let bear = harness.adversary();
    harness.environment();
    harness.session.update_adversary(bear, |a| {
        a.attack_override = Some(AttackOverride {
            modifier: Some("+4".to_string()),
            ..Default::default()
        });
    });
    harness
        .session
        .handle_spotlight(Some(TrackerSelection::character(hero)));
    harness.attack(bear);

    let saved = serde_json::to_string(harness.session.state()).unwrap();
    let loaded: RosterState = serde_json::from_str(&saved).unwrap();
    assert_eq!(&loaded, harness.session.state());

    let mut session = EncounterSession::default();
    session.load_state(loaded);
    assert_eq!(session.undo_history().past_len(), 1);
    assert_eq!(
        session.roster().adversary(bear).unwrap().effective_attack().modifier,
        4
    );
}

#[test]
fn test_bulk_setters_drop_stale_references() {
    setup();
    let mut harness = TestHarness::new();
    let hero = harness.character("Marlowe");
    let bear = harness.adversary();
    harness
        .session
        .handle_spotlight(Some(TrackerSelection::character(hero)));
    harness
        .session
        .handle_select(Some(TrackerSelection::character(hero)));

    harness.session.set_characters(Vec::new());
    let state = harness.session.state();
    assert_eq!(state.spotlight, None);
    assert_eq!(state.selection, None);
    assert!(state.spotlight_history.is_empty());
    assert_eq!(state.spotlight_timeline.len(), 1);
    assert_no_dangling_refs(&harness);

    // A history naming a missing participant is filtered on the way in
    harness.session.set_spotlight_history(vec![
        TrackerSelection::character(hero),
        TrackerSelection::adversary(bear),
    ]);
    assert_eq!(
        harness.session.state().spotlight_history,
        vec![TrackerSelection::adversary(bear)]
    );

    harness.session.undo();
    harness.session.undo();
    assert_eq!(harness.session.state().characters.len(), 1);
}

#[test]
fn test_draft_fields_are_trimmed() {
    setup();
    let mut session = EncounterSession::default();
    let id = session
        .add_character(
            &CharacterDraft::new("  Marlowe ")
                .with_evasion(" 11 ")
                .with_hp_max(" 7")
                .with_stress_max("five"),
        )
        .unwrap();

    let character = session.roster().character(id).unwrap();
    assert_eq!(character.name, "Marlowe");
    assert_eq!(character.evasion, Some(11));
    assert_eq!(character.hp.max, 7);
    assert_eq!(character.stress.max, 6);
}
