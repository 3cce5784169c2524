//! Testing utilities for encounter scenarios.
//!
//! This module provides tools for integration testing:
//! - Sample catalog templates and character drafts
//! - `TestHarness` for scripted encounters with a seeded RNG
//! - Assertion helpers for verifying roster state

use crate::config::EncounterConfig;
use crate::roster::RosterState;
use crate::session::EncounterSession;
use crate::template::{
    AdversaryTemplate, AttackProfile, EnvironmentTemplate, FeatureTemplate, ThresholdValues,
    Thresholds,
};
use crate::tracker::{CharacterDraft, TrackerId};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A tier 1 bruiser with numeric thresholds of 9/17 and 7 HP.
pub fn sample_adversary_template() -> AdversaryTemplate {
    AdversaryTemplate {
        name: "Dire Bear".to_string(),
        tier: 1,
        role: "Bruiser".to_string(),
        description: "A hulking bear with matted fur and a scarred muzzle.".to_string(),
        motives: "Defend territory, maul intruders".to_string(),
        difficulty: 14,
        attack: AttackProfile {
            name: "Claws".to_string(),
            modifier: "+1".to_string(),
            range: "Melee".to_string(),
            damage: "1d8+3 phy".to_string(),
        },
        thresholds: Thresholds::Values(ThresholdValues::new(9, 17)),
        hp: 7,
        stress: 2,
        experiences: vec!["Ambusher +3".to_string()],
        features: vec![
            FeatureTemplate::detailed(
                "Overwhelming Force",
                Some("Passive"),
                "Targets who mark HP from the bear's attacks are knocked back to Close range.",
            ),
            FeatureTemplate::Text("Bite: Spend a Fear to make a bite attack.".to_string()),
        ],
    }
}

/// A tier 1 hazard environment with two features.
pub fn sample_environment_template() -> EnvironmentTemplate {
    EnvironmentTemplate {
        name: "Collapsing Bridge".to_string(),
        tier: 1,
        kind: "Traversal".to_string(),
        description: "A rope bridge sways over a river gorge.".to_string(),
        impulses: vec!["Snap".to_string(), "Sway".to_string()],
        difficulty: Some(12),
        potential_adversaries: vec!["Dire Bear".to_string()],
        features: vec![
            FeatureTemplate::detailed(
                "Fraying Ropes",
                Some("Action"),
                "Spend a Fear to snap a rope; everyone on the bridge makes an Agility roll.",
            ),
            FeatureTemplate::Text("High Winds: Ranged attacks have disadvantage.".to_string()),
        ],
    }
}

/// A character draft with 6 HP, 6 stress and evasion 10.
pub fn sample_character_draft(name: &str) -> CharacterDraft {
    CharacterDraft::new(name)
        .with_evasion("10")
        .with_hp_max("6")
        .with_stress_max("6")
}

/// Test harness for running encounter scenarios.
pub struct TestHarness {
    /// The session under test.
    pub session: EncounterSession,
    /// Deterministic RNG for attack and damage rolls.
    pub rng: StdRng,
}

impl TestHarness {
    /// Create an empty encounter with the default config.
    pub fn new() -> Self {
        Self::with_config(EncounterConfig::default())
    }

    pub fn with_config(config: EncounterConfig) -> Self {
        Self {
            session: EncounterSession::new(config),
            rng: StdRng::seed_from_u64(0xD1CE),
        }
    }

    /// Add a sample character under `name`.
    pub fn character(&mut self, name: &str) -> TrackerId {
        self.session
            .add_character(&sample_character_draft(name))
            .unwrap_or_else(|| panic!("character '{name}' was rejected"))
    }

    /// Add the sample adversary.
    pub fn adversary(&mut self) -> TrackerId {
        self.session.add_adversary(&sample_adversary_template())
    }

    /// Add the sample environment.
    pub fn environment(&mut self) -> TrackerId {
        self.session.add_environment(&sample_environment_template())
    }

    /// Roll the adversary's attack and then its damage.
    pub fn attack(&mut self, id: TrackerId) -> Option<(i32, i32)> {
        let attack = self.session.roll_adversary_attack(id, &mut self.rng)?;
        let damage = self.session.roll_adversary_damage(id, &mut self.rng)?;
        Some((attack.total, damage.total))
    }

    /// Clone of the current roster.
    pub fn snapshot(&self) -> RosterState {
        self.session.state().clone()
    }

    /// Undo until history runs out. Returns how many steps were undone.
    pub fn undo_all(&mut self) -> usize {
        let mut steps = 0;
        while self.session.undo().is_some() {
            steps += 1;
        }
        steps
    }

    /// Redo until the redo stack runs out.
    pub fn redo_all(&mut self) -> usize {
        let mut steps = 0;
        while self.session.redo().is_some() {
            steps += 1;
        }
        steps
    }

    /// Current HP of a character or adversary as (current, max).
    pub fn hp(&self, id: TrackerId) -> Option<(u32, u32)> {
        let roster = self.session.roster();
        roster
            .character(id)
            .map(|c| c.hp)
            .or_else(|| roster.adversary(id).map(|a| a.hp))
            .map(|hp| (hp.current, hp.max))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the roster equals `expected` exactly.
#[track_caller]
pub fn assert_state(harness: &TestHarness, expected: &RosterState) {
    assert!(
        harness.session.state() == expected,
        "Roster differs from expected snapshot:\n  got: {:?}\n  expected: {:?}",
        harness.session.state(),
        expected
    );
}

/// Assert HP for a character or adversary.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, id: TrackerId, current: u32, max: u32) {
    let actual = harness.hp(id);
    assert_eq!(
        actual,
        Some((current, max)),
        "Expected HP {current}/{max}, got {actual:?}"
    );
}

/// Assert the fear pool value.
#[track_caller]
pub fn assert_fear(harness: &TestHarness, expected: u32) {
    let actual = harness.session.state().fear_pool;
    assert_eq!(actual, expected, "Expected fear {expected}, got {actual}");
}

/// Assert that no selection or spotlight reference points at a missing
/// participant.
#[track_caller]
pub fn assert_no_dangling_refs(harness: &TestHarness) {
    let state = harness.session.state();
    if let Some(selection) = state.selection {
        assert!(state.contains(selection), "Dangling selection {selection:?}");
    }
    if let Some(spotlight) = state.spotlight {
        assert!(state.contains(spotlight), "Dangling spotlight {spotlight:?}");
    }
    for entry in &state.spotlight_history {
        assert!(state.contains(*entry), "Dangling spotlight history entry {entry:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerSelection;

    #[test]
    fn test_sample_fixtures() {
        let template = sample_adversary_template();
        assert_eq!(template.thresholds, Thresholds::Values(ThresholdValues::new(9, 17)));
        assert_eq!(template.features[1].name(), "Bite");
        assert!(!sample_environment_template().features.is_empty());
    }

    #[test]
    fn test_harness_damage_and_undo() {
        let mut harness = TestHarness::new();
        let bear = harness.adversary();
        assert_hp(&harness, bear, 7, 7);

        harness.session.apply_adversary_damage(bear, 10);
        assert_hp(&harness, bear, 5, 7);

        assert_eq!(harness.undo_all(), 2);
        assert!(harness.session.state().is_empty());
        assert_eq!(harness.redo_all(), 2);
        assert_hp(&harness, bear, 5, 7);
    }

    #[test]
    fn test_harness_attack_is_seeded() {
        let mut first = TestHarness::new();
        let mut second = TestHarness::new();
        let a = first.adversary();
        let b = second.adversary();

        assert_eq!(first.attack(a), second.attack(b));
        assert_eq!(first.session.state().roll_history.len(), 2);
        assert!(first.attack(TrackerId::new()).is_none());
    }

    #[test]
    fn test_dangling_refs_after_remove() {
        let mut harness = TestHarness::new();
        let hero = harness.character("Marlowe");
        harness.session.handle_spotlight(Some(TrackerSelection::character(hero)));
        harness.session.remove_item(TrackerSelection::character(hero));

        assert_no_dangling_refs(&harness);
        assert_fear(&harness, 0);
    }
}
