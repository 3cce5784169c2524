//! The combat roster.
//!
//! `RosterStore` owns every participant collection plus selection,
//! spotlight, the bounded logs, the round counter and the fear pool. All of
//! that lives in one [`RosterState`] value so a snapshot is a single clone.
//!
//! Mutators never fail loudly. A rejected or unmatched operation returns
//! `None`/`false` and leaves the state untouched; callers (the undo wrapper
//! in particular) rely on that signal.

use crate::config::{EncounterConfig, RosterLimits};
use crate::dice::{self, DiceExpression, RollOutcome};
use crate::overrides::{damage_severity, DamageSeverity};
use crate::template::{AdversaryTemplate, EnvironmentTemplate};
use crate::tracker::{
    AdversaryTracker, CharacterDraft, CharacterTracker, EnvironmentTracker, FeatureId,
    RollHistoryEntry, RollType, SpotlightHistoryEntry, TrackerId, TrackerKind, TrackerRef,
    TrackerSelection,
};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Every mutable field of the roster. Cloning it is a full, independent
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterState {
    pub characters: Vec<CharacterTracker>,
    pub adversaries: Vec<AdversaryTracker>,
    pub environments: Vec<EnvironmentTracker>,

    /// What the detail panel shows.
    pub selection: Option<TrackerSelection>,
    /// Who has narrative focus.
    pub spotlight: Option<TrackerSelection>,

    /// Recently spotlighted participants, most recent first, no duplicates.
    pub spotlight_history: Vec<TrackerSelection>,
    /// Every spotlight event, oldest first.
    pub spotlight_timeline: Vec<SpotlightHistoryEntry>,
    /// Recorded rolls, most recent first.
    pub roll_history: Vec<RollHistoryEntry>,

    pub round: u32,
    pub fear_pool: u32,
    pub max_fear: Option<u32>,

    /// Optional rule: hits at or above the massive threshold mark 4 HP.
    pub massive_damage: bool,
}

impl RosterState {
    /// An empty roster at round 1.
    pub fn new(config: &EncounterConfig) -> Self {
        let fear_pool = match config.max_fear {
            Some(max) => config.initial_fear.min(max),
            None => config.initial_fear,
        };
        Self {
            characters: Vec::new(),
            adversaries: Vec::new(),
            environments: Vec::new(),
            selection: None,
            spotlight: None,
            spotlight_history: Vec::new(),
            spotlight_timeline: Vec::new(),
            roll_history: Vec::new(),
            round: 1,
            fear_pool,
            max_fear: config.max_fear,
            massive_damage: false,
        }
    }

    pub fn resolve(&self, selection: TrackerSelection) -> Option<TrackerRef<'_>> {
        match selection.kind {
            TrackerKind::Character => {
                find(&self.characters, selection.id).map(TrackerRef::Character)
            }
            TrackerKind::Adversary => {
                find(&self.adversaries, selection.id).map(TrackerRef::Adversary)
            }
            TrackerKind::Environment => {
                find(&self.environments, selection.id).map(TrackerRef::Environment)
            }
        }
    }

    pub fn contains(&self, selection: TrackerSelection) -> bool {
        self.resolve(selection).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.adversaries.is_empty() && self.environments.is_empty()
    }
}

impl Default for RosterState {
    fn default() -> Self {
        Self::new(&EncounterConfig::default())
    }
}

// ============================================================================
// Collection helpers
// ============================================================================

/// A participant stored in one of the roster's collections.
trait Tracked {
    fn tracker_id(&self) -> TrackerId;
    fn restore_id(&mut self, id: TrackerId);
}

macro_rules! impl_tracked {
    ($($ty:ty),*) => {$(
        impl Tracked for $ty {
            fn tracker_id(&self) -> TrackerId {
                self.id
            }

            fn restore_id(&mut self, id: TrackerId) {
                self.id = id;
            }
        }
    )*};
}

impl_tracked!(CharacterTracker, AdversaryTracker, EnvironmentTracker);

fn find<T: Tracked>(items: &[T], id: TrackerId) -> Option<&T> {
    items.iter().find(|item| item.tracker_id() == id)
}

fn find_mut<T: Tracked>(items: &mut [T], id: TrackerId) -> Option<&mut T> {
    items.iter_mut().find(|item| item.tracker_id() == id)
}

/// Apply `updater` to the item with `id`. Returns false when there is none.
fn update_in<T: Tracked>(items: &mut [T], id: TrackerId, updater: impl FnOnce(&mut T)) -> bool {
    let Some(item) = find_mut(items, id) else {
        return false;
    };
    updater(item);
    if item.tracker_id() != id {
        tracing::warn!(%id, "updater changed a tracker id, restoring it");
        item.restore_id(id);
    }
    true
}

fn remove_from<T: Tracked>(items: &mut Vec<T>, id: TrackerId) -> bool {
    let before = items.len();
    items.retain(|item| item.tracker_id() != id);
    items.len() != before
}

// ============================================================================
// Roster Store
// ============================================================================

/// Owner of the roster state and its direct (non-undoable) mutators.
///
/// Hosts normally go through [`crate::session::EncounterSession`], which
/// wraps every mutator here with an undo checkpoint.
#[derive(Debug, Clone)]
pub struct RosterStore {
    state: RosterState,
    config: EncounterConfig,
}

impl RosterStore {
    pub fn new(config: EncounterConfig) -> Self {
        Self {
            state: RosterState::new(&config),
            config,
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> RosterState {
        self.state.clone()
    }

    /// Replace the whole state with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: RosterState) {
        self.state = snapshot;
    }

    /// Replace the whole state with one from outside (a saved encounter).
    ///
    /// Unlike [`restore`](Self::restore), the incoming state is brought in
    /// line with this roster's limits: logs are cut to their caps, the fear
    /// pool is clamped, and references to missing participants are dropped.
    pub fn load(&mut self, state: RosterState) {
        let limits = self.config.limits;
        self.state = state;

        self.state.roll_history.truncate(limits.roll_history_cap);
        let timeline = &mut self.state.spotlight_timeline;
        if timeline.len() > limits.spotlight_timeline_cap {
            let excess = timeline.len() - limits.spotlight_timeline_cap;
            timeline.drain(..excess);
        }
        let mut recent = Vec::with_capacity(limits.recent_spotlight_cap);
        for selection in self.state.spotlight_history.drain(..) {
            if !recent.contains(&selection) {
                recent.push(selection);
            }
        }
        recent.truncate(limits.recent_spotlight_cap);
        self.state.spotlight_history = recent;

        self.state.fear_pool = self.state.fear_pool.min(self.fear_cap());
        self.prune_stale_references();
        tracing::debug!(
            characters = self.state.characters.len(),
            adversaries = self.state.adversaries.len(),
            environments = self.state.environments.len(),
            "loaded roster"
        );
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn limits(&self) -> &RosterLimits {
        &self.config.limits
    }

    pub fn characters(&self) -> &[CharacterTracker] {
        &self.state.characters
    }

    pub fn adversaries(&self) -> &[AdversaryTracker] {
        &self.state.adversaries
    }

    pub fn environments(&self) -> &[EnvironmentTracker] {
        &self.state.environments
    }

    pub fn character(&self, id: TrackerId) -> Option<&CharacterTracker> {
        find(&self.state.characters, id)
    }

    pub fn adversary(&self, id: TrackerId) -> Option<&AdversaryTracker> {
        find(&self.state.adversaries, id)
    }

    pub fn environment(&self, id: TrackerId) -> Option<&EnvironmentTracker> {
        find(&self.state.environments, id)
    }

    pub fn resolve(&self, selection: TrackerSelection) -> Option<TrackerRef<'_>> {
        self.state.resolve(selection)
    }

    /// The selected participant, if the selection still points at one.
    pub fn selected(&self) -> Option<TrackerRef<'_>> {
        self.state.selection.and_then(|s| self.resolve(s))
    }

    /// The spotlighted participant, if the spotlight still points at one.
    pub fn spotlighted(&self) -> Option<TrackerRef<'_>> {
        self.state.spotlight.and_then(|s| self.resolve(s))
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn fear_pool(&self) -> u32 {
        self.state.fear_pool
    }

    pub fn max_fear(&self) -> Option<u32> {
        self.state.max_fear
    }

    /// Adversaries that have not acted this round and are still standing.
    pub fn adversaries_waiting(&self) -> impl Iterator<Item = &AdversaryTracker> {
        self.state
            .adversaries
            .iter()
            .filter(|a| !a.has_acted && !a.is_defeated())
    }

    // =========================================================================
    // Participants
    // =========================================================================

    /// Add a character from form input and select it.
    ///
    /// Returns `None` without touching the state if the name is blank.
    pub fn add_character(&mut self, draft: &CharacterDraft) -> Option<TrackerId> {
        let character = match CharacterTracker::from_draft(
            draft,
            self.config.default_character_hp,
            self.config.default_character_stress,
        ) {
            Ok(character) => character,
            Err(e) => {
                tracing::debug!(error = %e, "rejected character draft");
                return None;
            }
        };

        let id = character.id;
        tracing::debug!(%id, name = %character.name, "added character");
        self.state.characters.push(character);
        self.state.selection = Some(TrackerSelection::character(id));
        Some(id)
    }

    /// Add an adversary built from a catalog entry and select it.
    pub fn add_adversary(&mut self, template: &AdversaryTemplate) -> TrackerId {
        let adversary = AdversaryTracker::from_template(template);
        let id = adversary.id;
        tracing::debug!(%id, name = %template.name, "added adversary");
        self.state.adversaries.push(adversary);
        self.state.selection = Some(TrackerSelection::adversary(id));
        id
    }

    /// Add an environment built from a catalog entry and select it.
    pub fn add_environment(&mut self, template: &EnvironmentTemplate) -> TrackerId {
        let environment = EnvironmentTracker::from_template(template);
        let id = environment.id;
        tracing::debug!(%id, name = %template.name, "added environment");
        self.state.environments.push(environment);
        self.state.selection = Some(TrackerSelection::environment(id));
        id
    }

    pub fn update_character(
        &mut self,
        id: TrackerId,
        updater: impl FnOnce(&mut CharacterTracker),
    ) -> bool {
        update_in(&mut self.state.characters, id, updater)
    }

    pub fn update_adversary(
        &mut self,
        id: TrackerId,
        updater: impl FnOnce(&mut AdversaryTracker),
    ) -> bool {
        update_in(&mut self.state.adversaries, id, updater)
    }

    pub fn update_environment(
        &mut self,
        id: TrackerId,
        updater: impl FnOnce(&mut EnvironmentTracker),
    ) -> bool {
        update_in(&mut self.state.environments, id, updater)
    }

    /// Remove a participant and every live reference to it.
    ///
    /// The spotlight timeline and roll history are records of what happened
    /// and keep their entries.
    pub fn remove_item(&mut self, item: TrackerSelection) -> bool {
        let removed = match item.kind {
            TrackerKind::Character => remove_from(&mut self.state.characters, item.id),
            TrackerKind::Adversary => remove_from(&mut self.state.adversaries, item.id),
            TrackerKind::Environment => remove_from(&mut self.state.environments, item.id),
        };
        if !removed {
            return false;
        }

        if self.state.selection == Some(item) {
            self.state.selection = None;
        }
        if self.state.spotlight == Some(item) {
            self.state.spotlight = None;
        }
        self.state.spotlight_history.retain(|s| *s != item);

        tracing::debug!(kind = %item.kind, id = %item.id, "removed participant");
        true
    }

    // =========================================================================
    // Selection and Spotlight
    // =========================================================================

    /// Point the selection at `item`, or clear it with `None`.
    ///
    /// A reference to a participant that does not exist is rejected, and so
    /// is a selection that would not change anything.
    pub fn handle_select(&mut self, item: Option<TrackerSelection>) -> bool {
        if item == self.state.selection {
            return false;
        }
        if let Some(selection) = item {
            if !self.state.contains(selection) {
                return false;
            }
        }
        self.state.selection = item;
        true
    }

    /// Give `item` the spotlight, or clear it with `None`.
    ///
    /// Spotlighting records the participant in the recent list (deduplicated)
    /// and appends a timeline entry carrying its current name and the round.
    pub fn handle_spotlight(&mut self, item: Option<TrackerSelection>) -> bool {
        let Some(selection) = item else {
            return self.state.spotlight.take().is_some();
        };
        let Some(entity_name) = self.resolve(selection).map(|r| r.name().to_string()) else {
            return false;
        };

        let limits = self.config.limits;
        self.state.spotlight = Some(selection);

        let recent = &mut self.state.spotlight_history;
        recent.retain(|s| *s != selection);
        recent.insert(0, selection);
        recent.truncate(limits.recent_spotlight_cap);

        let timeline = &mut self.state.spotlight_timeline;
        timeline.push(SpotlightHistoryEntry {
            selection,
            timestamp: Utc::now(),
            round: self.state.round,
            entity_name,
        });
        if timeline.len() > limits.spotlight_timeline_cap {
            let excess = timeline.len() - limits.spotlight_timeline_cap;
            timeline.drain(..excess);
        }

        tracing::debug!(kind = %selection.kind, id = %selection.id, "spotlight");
        true
    }

    // =========================================================================
    // Rounds
    // =========================================================================

    /// Move to the next round. Every adversary becomes ready to act again.
    pub fn advance_round(&mut self) {
        self.state.round = self.state.round.saturating_add(1);
        for adversary in &mut self.state.adversaries {
            adversary.has_acted = false;
        }
        tracing::debug!(round = self.state.round, "advanced round");
    }

    /// Mark an adversary as having acted. False if unknown or already acted.
    pub fn mark_adversary_acted(&mut self, id: TrackerId) -> bool {
        match find_mut(&mut self.state.adversaries, id) {
            Some(adversary) if !adversary.has_acted => {
                adversary.has_acted = true;
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Fear
    // =========================================================================

    fn fear_cap(&self) -> u32 {
        self.state.max_fear.unwrap_or(u32::MAX)
    }

    /// Spend fear if the pool covers it. Leaves the pool alone otherwise.
    pub fn spend_fear(&mut self, amount: u32) -> bool {
        if amount > self.state.fear_pool {
            tracing::debug!(amount, pool = self.state.fear_pool, "not enough fear");
            return false;
        }
        self.state.fear_pool -= amount;
        true
    }

    /// Add fear up to the cap. Returns how much was actually added.
    pub fn gain_fear(&mut self, amount: u32) -> u32 {
        let next = self.state.fear_pool.saturating_add(amount).min(self.fear_cap());
        let gained = next.saturating_sub(self.state.fear_pool);
        self.state.fear_pool = next.max(self.state.fear_pool);
        gained
    }

    /// Set the pool directly, clamped to the cap.
    pub fn set_fear_pool(&mut self, value: u32) {
        self.state.fear_pool = value.min(self.fear_cap());
    }

    /// Change the cap. The pool is clamped to the new cap.
    pub fn set_max_fear(&mut self, max_fear: Option<u32>) {
        self.state.max_fear = max_fear;
        self.state.fear_pool = self.state.fear_pool.min(self.fear_cap());
    }

    pub fn set_massive_damage(&mut self, enabled: bool) {
        self.state.massive_damage = enabled;
    }

    // =========================================================================
    // Rolls and Damage
    // =========================================================================

    /// Record a roll, most recent first. The oldest entries fall off past
    /// the cap.
    pub fn add_roll_to_history(&mut self, entry: RollHistoryEntry) {
        let history = &mut self.state.roll_history;
        history.insert(0, entry);
        history.truncate(self.config.limits.roll_history_cap);
    }

    /// Roll an adversary's effective attack, cache it on the adversary, mark
    /// it as having acted and record the roll.
    pub fn roll_adversary_attack<R: Rng>(
        &mut self,
        id: TrackerId,
        rng: &mut R,
    ) -> Option<RollOutcome> {
        let round = self.state.round;
        let adversary = find_mut(&mut self.state.adversaries, id)?;
        let outcome = dice::roll_d20(adversary.effective_attack().modifier, rng);

        adversary.last_attack_roll = Some(outcome.clone());
        adversary.has_acted = true;
        let entry = RollHistoryEntry::new(
            TrackerKind::Adversary,
            adversary.name(),
            RollType::Attack,
            outcome.total,
            round,
        )
        .with_flags(outcome.is_critical(), outcome.is_fumble());

        self.add_roll_to_history(entry);
        Some(outcome)
    }

    /// Roll an adversary's effective damage and record it. `None` when the
    /// adversary is unknown or its damage text has no dice in it.
    pub fn roll_adversary_damage<R: Rng>(
        &mut self,
        id: TrackerId,
        rng: &mut R,
    ) -> Option<RollOutcome> {
        let round = self.state.round;
        let adversary = find_mut(&mut self.state.adversaries, id)?;
        let damage = adversary.effective_attack().damage;
        let expression = match DiceExpression::parse_leading(&damage) {
            Ok(expression) => expression,
            Err(e) => {
                tracing::debug!(error = %e, %damage, "damage is not rollable");
                return None;
            }
        };
        let outcome = expression.roll_with_rng(rng);

        adversary.last_damage_roll = Some(outcome.clone());
        let entry = RollHistoryEntry::new(
            TrackerKind::Adversary,
            adversary.name(),
            RollType::Damage,
            outcome.total,
            round,
        );

        self.add_roll_to_history(entry);
        Some(outcome)
    }

    /// Mark hit points on an adversary according to its effective
    /// thresholds.
    ///
    /// Returns `None` when nothing is marked: unknown adversary, free-text
    /// thresholds, or zero damage.
    pub fn apply_adversary_damage(
        &mut self,
        id: TrackerId,
        damage: u32,
    ) -> Option<DamageSeverity> {
        let massive = self.state.massive_damage;
        let adversary = find_mut(&mut self.state.adversaries, id)?;
        let severity = damage_severity(&adversary.effective_thresholds(), damage, massive)?;
        if severity == DamageSeverity::None {
            return None;
        }

        adversary.hp.adjust(-(severity.hp_marked() as i32));
        tracing::debug!(%id, damage, ?severity, hp = adversary.hp.current, "adversary took damage");
        Some(severity)
    }

    // =========================================================================
    // Environments
    // =========================================================================

    pub fn toggle_environment_feature(&mut self, id: TrackerId, feature_id: FeatureId) -> bool {
        find_mut(&mut self.state.environments, id)
            .map(|e| e.toggle_feature(feature_id))
            .unwrap_or(false)
    }

    /// Count an environment's countdown down by one. False if it has no
    /// countdown or the countdown already ran out.
    pub fn tick_environment_countdown(&mut self, id: TrackerId) -> bool {
        find_mut(&mut self.state.environments, id)
            .and_then(|e| e.countdown.as_mut())
            .map(|c| c.tick())
            .unwrap_or(false)
    }

    // =========================================================================
    // Bulk Setters
    // =========================================================================

    pub fn set_characters(&mut self, characters: Vec<CharacterTracker>) {
        self.state.characters = characters;
        self.prune_stale_references();
    }

    pub fn set_adversaries(&mut self, adversaries: Vec<AdversaryTracker>) {
        self.state.adversaries = adversaries;
        self.prune_stale_references();
    }

    pub fn set_environments(&mut self, environments: Vec<EnvironmentTracker>) {
        self.state.environments = environments;
        self.prune_stale_references();
    }

    pub fn set_spotlight_history(&mut self, mut history: Vec<TrackerSelection>) {
        history.truncate(self.config.limits.recent_spotlight_cap);
        self.state.spotlight_history = history;
        self.prune_stale_references();
    }

    pub fn set_spotlight_timeline(&mut self, mut timeline: Vec<SpotlightHistoryEntry>) {
        let cap = self.config.limits.spotlight_timeline_cap;
        if timeline.len() > cap {
            timeline.drain(..timeline.len() - cap);
        }
        self.state.spotlight_timeline = timeline;
    }

    pub fn set_roll_history(&mut self, mut history: Vec<RollHistoryEntry>) {
        history.truncate(self.config.limits.roll_history_cap);
        self.state.roll_history = history;
    }

    pub fn set_round(&mut self, round: u32) {
        self.state.round = round;
    }

    /// Drop selection, spotlight and recent-spotlight entries whose target
    /// is gone.
    fn prune_stale_references(&mut self) {
        let state = &self.state;
        let selection = state.selection.filter(|s| state.contains(*s));
        let spotlight = state.spotlight.filter(|s| state.contains(*s));
        let history: Vec<_> = state
            .spotlight_history
            .iter()
            .copied()
            .filter(|s| state.contains(*s))
            .collect();

        self.state.selection = selection;
        self.state.spotlight = spotlight;
        self.state.spotlight_history = history;
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new(EncounterConfig::default())
    }
}
