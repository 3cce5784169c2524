//! Scripted encounter walkthrough.
//!
//! Run with: `RUST_LOG=encounter_core=debug cargo run -p encounter-core --example run_encounter`

use encounter_core::testing::{sample_adversary_template, sample_environment_template};
use encounter_core::{
    CharacterDraft, EncounterConfig, EncounterSession, RosterState, TrackerSelection,
};
use rand::thread_rng;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Encounter Walkthrough ===\n");

    let config = EncounterConfig::new().with_initial_fear(2).with_max_fear(Some(12));
    let mut session = EncounterSession::new(config);
    let mut rng = thread_rng();

    let Some(hero) = session.add_character(&CharacterDraft::new("Marlowe").with_hp_max("6"))
    else {
        println!("Character rejected");
        return;
    };
    let bear = session.add_adversary(&sample_adversary_template());
    let bridge = session.add_environment(&sample_environment_template());
    print_roster(session.state());

    session.handle_spotlight(Some(TrackerSelection::adversary(bear)));
    if let Some(attack) = session.roll_adversary_attack(bear, &mut rng) {
        println!("Dire Bear attacks: {attack}");
    }
    if let Some(damage) = session.roll_adversary_damage(bear, &mut rng) {
        println!("Dire Bear deals: {damage}");
        session.update_character(hero, |c| c.hp.adjust(-2));
    }

    if session.spend_fear(1) {
        println!("GM spends a Fear");
    }
    if let Some(feature) = session
        .roster()
        .environment(bridge)
        .and_then(|e| e.features.first())
        .map(|f| f.id)
    {
        session.toggle_environment_feature(bridge, feature);
    }

    session.handle_spotlight(Some(TrackerSelection::character(hero)));
    if let Some(severity) = session.apply_adversary_damage(bear, 12) {
        println!("Marlowe hits the bear: {severity:?}");
    }
    session.advance_round();
    print_roster(session.state());

    println!("Undo: {:?}", session.undo_label());
    session.undo();
    println!("Round after undo: {}", session.state().round);
    session.redo();
    println!("Round after redo: {}", session.state().round);
}

fn print_roster(state: &RosterState) {
    println!("--- Round {} | Fear {} ---", state.round, state.fear_pool);
    for character in &state.characters {
        println!(
            "  {} HP {}/{} Stress {}/{}",
            character.name,
            character.hp.current,
            character.hp.max,
            character.stress.current,
            character.stress.max
        );
    }
    for adversary in &state.adversaries {
        println!(
            "  {} HP {}/{} Difficulty {}",
            adversary.name(),
            adversary.hp.current,
            adversary.hp.max,
            adversary.effective_difficulty()
        );
    }
    for environment in &state.environments {
        let active: Vec<_> = environment.active_features().map(|f| f.name.as_str()).collect();
        println!("  {} active: {active:?}", environment.name());
    }
    println!();
}
