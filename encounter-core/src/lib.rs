//! Combat roster engine for tabletop encounters.
//!
//! This crate provides:
//! - Participant trackers (characters, adversaries, environments)
//! - Per-encounter overrides resolved against read-only catalog templates
//! - Selection, spotlight, rounds, the fear pool and roll history
//! - Snapshot-based undo/redo over every roster mutation
//!
//! # Quick Start
//!
//! ```ignore
//! use encounter_core::{CharacterDraft, EncounterConfig, EncounterSession, TrackerSelection};
//!
//! let mut session = EncounterSession::new(EncounterConfig::new().with_max_fear(Some(12)));
//!
//! let hero = session.add_character(&CharacterDraft::new("Marlowe").with_hp_max("6")).unwrap();
//! let bear = session.add_adversary(&catalog.adversary("Dire Bear"));
//!
//! session.handle_spotlight(Some(TrackerSelection::character(hero)));
//! session.apply_adversary_damage(bear, 10);
//!
//! session.undo();
//! ```

pub mod config;
pub mod dice;
pub mod overrides;
pub mod roster;
pub mod session;
pub mod template;
pub mod testing;
pub mod tracker;
pub mod undo;

// Primary public API
pub use config::{EncounterConfig, RosterLimits};
pub use dice::{DiceError, DiceExpression, RollOutcome};
pub use overrides::{
    AttackOverride, DamageSeverity, EffectiveAttack, EffectiveThresholds, ThresholdsOverride,
};
pub use roster::{RosterState, RosterStore};
pub use session::{ActionOutcome, EncounterSession, TrackerTab};
pub use template::{
    AdversaryTemplate, AttackProfile, EnvironmentTemplate, FeatureTemplate, ThresholdValues,
    Thresholds,
};
pub use testing::TestHarness;
pub use tracker::{
    AdversaryTracker, CharacterDraft, CharacterTracker, Countdown, DraftError,
    EnvironmentFeature, EnvironmentTracker, FeatureId, Meter, RollHistoryEntry, RollType,
    SpotlightHistoryEntry, TrackerId, TrackerKind, TrackerRef, TrackerSelection,
};
pub use undo::{UndoEngine, UndoMeta};
