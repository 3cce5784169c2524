//! Combat participant types.
//!
//! Contains the three tracked participant kinds (characters, adversaries,
//! environments), the weak references used for selection and spotlight, and
//! the denormalized log entries kept by the roster.

use crate::dice::RollOutcome;
use crate::overrides::{AttackOverride, ThresholdsOverride};
use crate::template::{AdversaryTemplate, EnvironmentTemplate, FeatureTemplate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a tracked participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerId(pub Uuid);

impl TrackerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a normalized environment feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub Uuid);

impl FeatureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FeatureId {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// References
// ============================================================================

/// Discriminant of the participant union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerKind {
    Character,
    Adversary,
    Environment,
}

impl TrackerKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerKind::Character => "character",
            TrackerKind::Adversary => "adversary",
            TrackerKind::Environment => "environment",
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Weak `{kind, id}` reference to a participant.
///
/// Never trusted on its own: every read goes back through the roster's
/// collections, so a reference to a removed participant resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerSelection {
    pub kind: TrackerKind,
    pub id: TrackerId,
}

impl TrackerSelection {
    pub fn new(kind: TrackerKind, id: TrackerId) -> Self {
        Self { kind, id }
    }

    pub fn character(id: TrackerId) -> Self {
        Self::new(TrackerKind::Character, id)
    }

    pub fn adversary(id: TrackerId) -> Self {
        Self::new(TrackerKind::Adversary, id)
    }

    pub fn environment(id: TrackerId) -> Self {
        Self::new(TrackerKind::Environment, id)
    }
}

/// A borrowed participant of any kind.
#[derive(Debug, Clone, Copy)]
pub enum TrackerRef<'a> {
    Character(&'a CharacterTracker),
    Adversary(&'a AdversaryTracker),
    Environment(&'a EnvironmentTracker),
}

impl<'a> TrackerRef<'a> {
    pub fn id(&self) -> TrackerId {
        match self {
            TrackerRef::Character(c) => c.id,
            TrackerRef::Adversary(a) => a.id,
            TrackerRef::Environment(e) => e.id,
        }
    }

    pub fn kind(&self) -> TrackerKind {
        match self {
            TrackerRef::Character(_) => TrackerKind::Character,
            TrackerRef::Adversary(_) => TrackerKind::Adversary,
            TrackerRef::Environment(_) => TrackerKind::Environment,
        }
    }

    /// Display name at the time of the call.
    pub fn name(&self) -> &'a str {
        match self {
            TrackerRef::Character(c) => &c.name,
            TrackerRef::Adversary(a) => &a.source.name,
            TrackerRef::Environment(e) => &e.source.name,
        }
    }

    pub fn selection(&self) -> TrackerSelection {
        TrackerSelection::new(self.kind(), self.id())
    }
}

// ============================================================================
// Meters
// ============================================================================

/// A bounded resource track such as hit points or stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub current: u32,
    pub max: u32,
}

impl Meter {
    /// A full meter.
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Shift `current` by `delta`, clamped to `0..=max`.
    pub fn adjust(&mut self, delta: i32) {
        let next = i64::from(self.current) + i64::from(delta);
        self.current = next.clamp(0, i64::from(self.max)) as u32;
    }

    /// Change the maximum, clamping `current` into the new range.
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = self.current.min(max);
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn is_full(&self) -> bool {
        self.current == self.max
    }
}

// ============================================================================
// Characters
// ============================================================================

/// Errors from validating a character draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Character name is blank")]
    BlankName,

    #[error("Invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Raw form input for a new character. All fields are unparsed strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterDraft {
    pub name: String,
    pub evasion: String,
    pub hp_max: String,
    pub stress_max: String,
}

impl CharacterDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_evasion(mut self, evasion: impl Into<String>) -> Self {
        self.evasion = evasion.into();
        self
    }

    pub fn with_hp_max(mut self, hp_max: impl Into<String>) -> Self {
        self.hp_max = hp_max.into();
        self
    }

    pub fn with_stress_max(mut self, stress_max: impl Into<String>) -> Self {
        self.stress_max = stress_max.into();
        self
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, DraftError> {
    raw.trim().parse().map_err(|_| DraftError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// A player character in the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterTracker {
    pub id: TrackerId,
    pub name: String,
    pub evasion: Option<i32>,
    pub hp: Meter,
    pub stress: Meter,
    pub conditions: Vec<String>,
    pub notes: String,
}

impl CharacterTracker {
    pub fn new(name: impl Into<String>, hp_max: u32, stress_max: u32) -> Self {
        Self {
            id: TrackerId::new(),
            name: name.into(),
            evasion: None,
            hp: Meter::new(hp_max),
            stress: Meter::new(stress_max),
            conditions: Vec::new(),
            notes: String::new(),
        }
    }

    /// Build a character from form input.
    ///
    /// A blank name is the only hard failure. Unparseable numbers fall back
    /// to the given defaults (or no evasion).
    pub fn from_draft(
        draft: &CharacterDraft,
        default_hp: u32,
        default_stress: u32,
    ) -> Result<Self, DraftError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DraftError::BlankName);
        }

        let evasion = if draft.evasion.trim().is_empty() {
            None
        } else {
            parse_field::<i32>("evasion", &draft.evasion)
                .inspect_err(|e| tracing::debug!(error = %e, "ignoring evasion"))
                .ok()
        };
        let hp_max = parse_field::<u32>("hp max", &draft.hp_max)
            .inspect_err(|e| tracing::debug!(error = %e, default_hp, "using default hp"))
            .unwrap_or(default_hp);
        let stress_max = parse_field::<u32>("stress max", &draft.stress_max)
            .inspect_err(|e| tracing::debug!(error = %e, default_stress, "using default stress"))
            .unwrap_or(default_stress);

        let mut character = Self::new(name, hp_max, stress_max);
        character.evasion = evasion;
        Ok(character)
    }

    /// Add a condition label. Returns false if it was already present.
    pub fn add_condition(&mut self, label: impl Into<String>) -> bool {
        add_condition(&mut self.conditions, label.into())
    }

    /// Remove a condition label. Returns false if it was not present.
    pub fn remove_condition(&mut self, label: &str) -> bool {
        remove_condition(&mut self.conditions, label)
    }

    pub fn selection(&self) -> TrackerSelection {
        TrackerSelection::character(self.id)
    }
}

fn add_condition(conditions: &mut Vec<String>, label: String) -> bool {
    if conditions.contains(&label) {
        return false;
    }
    conditions.push(label);
    true
}

fn remove_condition(conditions: &mut Vec<String>, label: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c != label);
    conditions.len() != before
}

// ============================================================================
// Adversaries
// ============================================================================

/// An adversary instance built from a catalog template.
///
/// `source` is never modified. Per-encounter changes go in the `*_override`
/// fields; see [`crate::overrides`] for how they combine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdversaryTracker {
    pub id: TrackerId,
    pub source: AdversaryTemplate,
    pub hp: Meter,
    pub stress: Meter,
    pub conditions: Vec<String>,
    pub notes: String,
    /// Cleared on every round advance.
    pub has_acted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_override: Option<AttackOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds_override: Option<ThresholdsOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features_override: Option<Vec<FeatureTemplate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_override: Option<i32>,

    #[serde(default)]
    pub last_attack_roll: Option<RollOutcome>,
    #[serde(default)]
    pub last_damage_roll: Option<RollOutcome>,
}

impl AdversaryTracker {
    pub fn from_template(template: &AdversaryTemplate) -> Self {
        Self {
            id: TrackerId::new(),
            source: template.clone(),
            hp: Meter::new(template.hp),
            stress: Meter::new(template.stress),
            conditions: Vec::new(),
            notes: String::new(),
            has_acted: false,
            attack_override: None,
            thresholds_override: None,
            features_override: None,
            difficulty_override: None,
            last_attack_roll: None,
            last_damage_roll: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    /// Whether the adversary has no hit points left.
    pub fn is_defeated(&self) -> bool {
        self.hp.is_empty()
    }

    pub fn add_condition(&mut self, label: impl Into<String>) -> bool {
        add_condition(&mut self.conditions, label.into())
    }

    pub fn remove_condition(&mut self, label: &str) -> bool {
        remove_condition(&mut self.conditions, label)
    }

    pub fn selection(&self) -> TrackerSelection {
        TrackerSelection::adversary(self.id)
    }
}

// ============================================================================
// Environments
// ============================================================================

/// An environment feature, normalized once when the environment is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentFeature {
    pub id: FeatureId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub active: bool,
}

impl From<&FeatureTemplate> for EnvironmentFeature {
    fn from(template: &FeatureTemplate) -> Self {
        Self {
            id: FeatureId::new(),
            name: template.name().to_string(),
            description: template.description().to_string(),
            kind: template.kind().map(str::to_string),
            active: false,
        }
    }
}

/// A countdown die on an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub start: u32,
    pub current: u32,
}

impl Countdown {
    pub fn new(start: u32) -> Self {
        Self {
            start,
            current: start,
        }
    }

    /// Count down by one. Returns false if already at zero.
    pub fn tick(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.current == 0
    }

    pub fn reset(&mut self) {
        self.current = self.start;
    }
}

/// An environment (scene hazard, event, location) in the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentTracker {
    pub id: TrackerId,
    pub source: EnvironmentTemplate,
    pub notes: String,
    pub features: Vec<EnvironmentFeature>,
    #[serde(default)]
    pub countdown: Option<Countdown>,
}

impl EnvironmentTracker {
    pub fn from_template(template: &EnvironmentTemplate) -> Self {
        Self {
            id: TrackerId::new(),
            source: template.clone(),
            notes: String::new(),
            features: template.features.iter().map(EnvironmentFeature::from).collect(),
            countdown: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    /// Flip a feature's `active` flag. Returns false for an unknown feature.
    pub fn toggle_feature(&mut self, feature_id: FeatureId) -> bool {
        match self.features.iter_mut().find(|f| f.id == feature_id) {
            Some(feature) => {
                feature.active = !feature.active;
                true
            }
            None => false,
        }
    }

    pub fn active_features(&self) -> impl Iterator<Item = &EnvironmentFeature> {
        self.features.iter().filter(|f| f.active)
    }

    pub fn selection(&self) -> TrackerSelection {
        TrackerSelection::environment(self.id)
    }
}

// ============================================================================
// Log Entries
// ============================================================================

/// A spotlight event. The name is copied when the spotlight is given, so
/// the entry survives renames and removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotlightHistoryEntry {
    pub selection: TrackerSelection,
    pub timestamp: DateTime<Utc>,
    pub round: u32,
    pub entity_name: String,
}

/// What a logged roll was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollType {
    Attack,
    Damage,
    Check,
}

/// A recorded roll, independent of any live participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollHistoryEntry {
    pub id: Uuid,
    pub kind: TrackerKind,
    pub entity_name: String,
    pub roll_type: RollType,
    pub total: i32,
    pub critical: bool,
    pub fumble: bool,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
}

impl RollHistoryEntry {
    pub fn new(
        kind: TrackerKind,
        entity_name: impl Into<String>,
        roll_type: RollType,
        total: i32,
        round: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            entity_name: entity_name.into(),
            roll_type,
            total,
            critical: false,
            fumble: false,
            round,
            timestamp: Utc::now(),
        }
    }

    pub fn with_flags(mut self, critical: bool, fumble: bool) -> Self {
        self.critical = critical;
        self.fumble = fumble;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_adversary_template, sample_environment_template};

    #[test]
    fn test_meter_clamps() {
        let mut hp = Meter::new(6);
        hp.adjust(-4);
        assert_eq!(hp.current, 2);

        hp.adjust(-10);
        assert_eq!(hp.current, 0);
        assert!(hp.is_empty());

        hp.adjust(100);
        assert_eq!(hp.current, 6);
        assert!(hp.is_full());

        hp.set_max(4);
        assert_eq!(hp.current, 4);
    }

    #[test]
    fn test_draft_trims_and_parses() {
        let draft = CharacterDraft::new("  Marlowe ")
            .with_evasion(" 11 ")
            .with_hp_max("7")
            .with_stress_max("5");
        let character = CharacterTracker::from_draft(&draft, 6, 6).unwrap();

        assert_eq!(character.name, "Marlowe");
        assert_eq!(character.evasion, Some(11));
        assert_eq!(character.hp, Meter { current: 7, max: 7 });
        assert_eq!(character.stress, Meter { current: 5, max: 5 });
    }

    #[test]
    fn test_draft_falls_back_to_defaults() {
        let draft = CharacterDraft::new("Ash")
            .with_evasion("quick")
            .with_hp_max("lots");
        let character = CharacterTracker::from_draft(&draft, 6, 4).unwrap();

        assert_eq!(character.evasion, None);
        assert_eq!(character.hp.max, 6);
        assert_eq!(character.stress.max, 4);
    }

    #[test]
    fn test_draft_blank_name() {
        let draft = CharacterDraft::new("   ").with_hp_max("6");
        assert_eq!(
            CharacterTracker::from_draft(&draft, 6, 6),
            Err(DraftError::BlankName)
        );
    }

    #[test]
    fn test_conditions_dedup() {
        let mut character = CharacterTracker::new("Ash", 6, 6);
        assert!(character.add_condition("Vulnerable"));
        assert!(!character.add_condition("Vulnerable"));
        assert_eq!(character.conditions.len(), 1);

        assert!(character.remove_condition("Vulnerable"));
        assert!(!character.remove_condition("Vulnerable"));
    }

    #[test]
    fn test_adversary_starts_full() {
        let template = sample_adversary_template();
        let adversary = AdversaryTracker::from_template(&template);

        assert_eq!(adversary.hp, Meter::new(template.hp));
        assert_eq!(adversary.stress, Meter::new(template.stress));
        assert!(!adversary.has_acted);
        assert_eq!(adversary.source, template);
    }

    #[test]
    fn test_environment_features_normalized_once() {
        let template = sample_environment_template();
        let mut environment = EnvironmentTracker::from_template(&template);

        assert_eq!(environment.features.len(), template.features.len());
        assert!(environment.features.iter().all(|f| !f.active));

        let first = environment.features[0].clone();
        assert!(environment.toggle_feature(first.id));
        assert_eq!(environment.active_features().count(), 1);

        // The feature keeps its id across toggles
        assert_eq!(environment.features[0].id, first.id);
        assert!(!environment.toggle_feature(FeatureId::new()));
    }

    #[test]
    fn test_countdown() {
        let mut countdown = Countdown::new(2);
        assert!(countdown.tick());
        assert!(countdown.tick());
        assert!(countdown.is_triggered());
        assert!(!countdown.tick());

        countdown.reset();
        assert_eq!(countdown.current, 2);
    }

    #[test]
    fn test_tracker_ref_name() {
        let adversary = AdversaryTracker::from_template(&sample_adversary_template());
        let item = TrackerRef::Adversary(&adversary);

        assert_eq!(item.kind(), TrackerKind::Adversary);
        assert_eq!(item.name(), adversary.source.name);
        assert_eq!(item.selection(), adversary.selection());
    }
}
