//! EncounterSession - the primary public API for the combat roster.
//!
//! This module wraps the [`RosterStore`] and the [`UndoEngine`] into a
//! single surface. Every roster mutator is exposed here behind an undo
//! checkpoint: the checkpoint is pushed before the action runs, and popped
//! again if the action turns out to be a no-op (blank character name, fear
//! the pool cannot cover, unknown id).

use crate::config::EncounterConfig;
use crate::dice::RollOutcome;
use crate::overrides::DamageSeverity;
use crate::roster::{RosterState, RosterStore};
use crate::template::{AdversaryTemplate, EnvironmentTemplate};
use crate::tracker::{
    AdversaryTracker, CharacterDraft, CharacterTracker, EnvironmentTracker, FeatureId,
    RollHistoryEntry, SpotlightHistoryEntry, TrackerId, TrackerSelection,
};
use crate::undo::{UndoEngine, UndoMeta};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tells the undo wrapper whether an action changed anything.
pub trait ActionOutcome {
    fn is_noop(&self) -> bool;
}

impl ActionOutcome for bool {
    fn is_noop(&self) -> bool {
        !*self
    }
}

impl<T> ActionOutcome for Option<T> {
    fn is_noop(&self) -> bool {
        self.is_none()
    }
}

impl ActionOutcome for () {
    fn is_noop(&self) -> bool {
        false
    }
}

/// Adding a participant from a template always succeeds.
impl ActionOutcome for TrackerId {
    fn is_noop(&self) -> bool {
        false
    }
}

/// Which participant list the UI is showing. Not part of undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackerTab {
    #[default]
    Characters,
    Adversaries,
    Environments,
}

/// A combat encounter.
///
/// This is the main entry point for hosts. It manages:
/// - The roster (participants, selection, spotlight, logs, round, fear)
/// - Undo/redo over every roster mutation
/// - Purely presentational state that undo ignores
#[derive(Debug, Clone)]
pub struct EncounterSession {
    roster: RosterStore,
    undo: UndoEngine,
    active_tab: TrackerTab,
}

impl EncounterSession {
    /// Create an empty encounter.
    pub fn new(config: EncounterConfig) -> Self {
        let undo = UndoEngine::new(config.limits.max_undo_depth);
        Self {
            roster: RosterStore::new(config),
            undo,
            active_tab: TrackerTab::default(),
        }
    }

    /// Push a checkpoint, run `action`, and drop the checkpoint again if the
    /// action did nothing.
    fn tracked<T: ActionOutcome>(
        &mut self,
        label: &str,
        action: impl FnOnce(&mut RosterStore) -> T,
    ) -> T {
        self.undo.push_undo(label, &self.roster);
        let outcome = action(&mut self.roster);
        if outcome.is_noop() {
            self.undo.pop_undo();
            tracing::debug!(label, "no-op action, checkpoint dropped");
        }
        outcome
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// The roster state. Read-only; mutate through the session.
    pub fn state(&self) -> &RosterState {
        self.roster.state()
    }

    /// The roster, for its query helpers.
    pub fn roster(&self) -> &RosterStore {
        &self.roster
    }

    pub fn undo_history(&self) -> &UndoEngine {
        &self.undo
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.undo.redo_label()
    }

    pub fn active_tab(&self) -> TrackerTab {
        self.active_tab
    }

    /// Switch tabs. Never recorded in undo history.
    pub fn set_active_tab(&mut self, tab: TrackerTab) {
        self.active_tab = tab;
    }

    // =========================================================================
    // Undo / Redo
    // =========================================================================

    pub fn undo(&mut self) -> Option<UndoMeta> {
        self.undo.undo(&mut self.roster)
    }

    pub fn redo(&mut self) -> Option<UndoMeta> {
        self.undo.redo(&mut self.roster)
    }

    pub fn clear_history(&mut self) {
        self.undo.clear_history();
    }

    /// Replace the whole roster, e.g. when loading a saved encounter. The
    /// incoming state is fitted to this session's limits, and the load
    /// itself can be undone.
    pub fn load_state(&mut self, state: RosterState) {
        self.tracked("Load encounter", |r| r.load(state))
    }

    /// Empty the roster and start a fresh undo history.
    pub fn reset(&mut self) {
        let state = RosterState::new(self.roster.config());
        self.roster.restore(state);
        self.undo.clear_history();
    }

    // =========================================================================
    // Participants
    // =========================================================================

    /// Add a character. `None` (and no history entry) for a blank name.
    pub fn add_character(&mut self, draft: &CharacterDraft) -> Option<TrackerId> {
        self.tracked("Add character", |r| r.add_character(draft))
    }

    pub fn add_adversary(&mut self, template: &AdversaryTemplate) -> TrackerId {
        self.tracked("Add adversary", |r| r.add_adversary(template))
    }

    pub fn add_environment(&mut self, template: &EnvironmentTemplate) -> TrackerId {
        self.tracked("Add environment", |r| r.add_environment(template))
    }

    pub fn update_character(
        &mut self,
        id: TrackerId,
        updater: impl FnOnce(&mut CharacterTracker),
    ) -> bool {
        self.tracked("Update character", |r| r.update_character(id, updater))
    }

    pub fn update_adversary(
        &mut self,
        id: TrackerId,
        updater: impl FnOnce(&mut AdversaryTracker),
    ) -> bool {
        self.tracked("Update adversary", |r| r.update_adversary(id, updater))
    }

    pub fn update_environment(
        &mut self,
        id: TrackerId,
        updater: impl FnOnce(&mut EnvironmentTracker),
    ) -> bool {
        self.tracked("Update environment", |r| r.update_environment(id, updater))
    }

    pub fn remove_item(&mut self, item: TrackerSelection) -> bool {
        let label = format!("Remove {}", item.kind);
        self.tracked(&label, |r| r.remove_item(item))
    }

    // =========================================================================
    // Selection and Spotlight
    // =========================================================================

    pub fn handle_select(&mut self, item: Option<TrackerSelection>) -> bool {
        self.tracked("Select", |r| r.handle_select(item))
    }

    pub fn handle_spotlight(&mut self, item: Option<TrackerSelection>) -> bool {
        self.tracked("Spotlight", |r| r.handle_spotlight(item))
    }

    // =========================================================================
    // Rounds and Fear
    // =========================================================================

    pub fn advance_round(&mut self) {
        self.tracked("Advance round", |r| r.advance_round())
    }

    pub fn mark_adversary_acted(&mut self, id: TrackerId) -> bool {
        self.tracked("Mark acted", |r| r.mark_adversary_acted(id))
    }

    /// Spend fear. `false` (and no history entry) if the pool is too small.
    pub fn spend_fear(&mut self, amount: u32) -> bool {
        self.tracked("Spend fear", |r| r.spend_fear(amount))
    }

    /// Gain fear up to the cap. Returns the amount gained; gaining nothing
    /// leaves no history entry.
    pub fn gain_fear(&mut self, amount: u32) -> u32 {
        self.tracked("Gain fear", |r| Some(r.gain_fear(amount)).filter(|g| *g > 0))
            .unwrap_or(0)
    }

    pub fn set_fear_pool(&mut self, value: u32) {
        self.tracked("Set fear", |r| r.set_fear_pool(value))
    }

    pub fn set_max_fear(&mut self, max_fear: Option<u32>) {
        self.tracked("Set max fear", |r| r.set_max_fear(max_fear))
    }

    pub fn set_massive_damage(&mut self, enabled: bool) {
        self.tracked("Toggle massive damage", |r| r.set_massive_damage(enabled))
    }

    // =========================================================================
    // Rolls and Damage
    // =========================================================================

    pub fn add_roll_to_history(&mut self, entry: RollHistoryEntry) {
        self.tracked("Record roll", |r| r.add_roll_to_history(entry))
    }

    pub fn roll_adversary_attack<R: Rng>(
        &mut self,
        id: TrackerId,
        rng: &mut R,
    ) -> Option<RollOutcome> {
        self.tracked("Attack roll", |r| r.roll_adversary_attack(id, rng))
    }

    pub fn roll_adversary_damage<R: Rng>(
        &mut self,
        id: TrackerId,
        rng: &mut R,
    ) -> Option<RollOutcome> {
        self.tracked("Damage roll", |r| r.roll_adversary_damage(id, rng))
    }

    pub fn apply_adversary_damage(&mut self, id: TrackerId, damage: u32) -> Option<DamageSeverity> {
        self.tracked("Apply damage", |r| r.apply_adversary_damage(id, damage))
    }

    // =========================================================================
    // Environments
    // =========================================================================

    pub fn toggle_environment_feature(&mut self, id: TrackerId, feature_id: FeatureId) -> bool {
        self.tracked("Toggle feature", |r| {
            r.toggle_environment_feature(id, feature_id)
        })
    }

    pub fn tick_environment_countdown(&mut self, id: TrackerId) -> bool {
        self.tracked("Tick countdown", |r| r.tick_environment_countdown(id))
    }

    // =========================================================================
    // Bulk Setters
    // =========================================================================

    pub fn set_characters(&mut self, characters: Vec<CharacterTracker>) {
        self.tracked("Set characters", |r| r.set_characters(characters))
    }

    pub fn set_adversaries(&mut self, adversaries: Vec<AdversaryTracker>) {
        self.tracked("Set adversaries", |r| r.set_adversaries(adversaries))
    }

    pub fn set_environments(&mut self, environments: Vec<EnvironmentTracker>) {
        self.tracked("Set environments", |r| r.set_environments(environments))
    }

    pub fn set_spotlight_history(&mut self, history: Vec<TrackerSelection>) {
        self.tracked("Set spotlight history", |r| r.set_spotlight_history(history))
    }

    pub fn set_spotlight_timeline(&mut self, timeline: Vec<SpotlightHistoryEntry>) {
        self.tracked("Set spotlight timeline", |r| {
            r.set_spotlight_timeline(timeline)
        })
    }

    pub fn set_roll_history(&mut self, history: Vec<RollHistoryEntry>) {
        self.tracked("Set roll history", |r| r.set_roll_history(history))
    }

    pub fn set_round(&mut self, round: u32) {
        self.tracked("Set round", |r| r.set_round(round))
    }
}

impl Default for EncounterSession {
    fn default() -> Self {
        Self::new(EncounterConfig::default())
    }
}
