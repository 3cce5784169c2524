//! Encounter configuration.
//!
//! The log caps and the undo depth are UX tuning values. They are kept
//! configurable rather than baked into the roster.

use serde::{Deserialize, Serialize};

/// Number of entries kept in the "recent spotlight" list.
pub const DEFAULT_RECENT_SPOTLIGHT_CAP: usize = 5;

/// Number of entries kept in the spotlight timeline.
pub const DEFAULT_SPOTLIGHT_TIMELINE_CAP: usize = 50;

/// Number of entries kept in the roll history.
pub const DEFAULT_ROLL_HISTORY_CAP: usize = 100;

/// Depth of both the undo and the redo stacks.
pub const MAX_UNDO_DEPTH: usize = 50;

/// Hit points given to a character whose draft has no usable value.
pub const DEFAULT_CHARACTER_HP: u32 = 6;

/// Stress slots given to a character whose draft has no usable value.
pub const DEFAULT_CHARACTER_STRESS: u32 = 6;

/// Fear cap used unless the host configures another one.
pub const DEFAULT_MAX_FEAR: u32 = 12;

/// Length caps for the roster's bounded logs and the undo stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterLimits {
    pub recent_spotlight_cap: usize,
    pub spotlight_timeline_cap: usize,
    pub roll_history_cap: usize,
    pub max_undo_depth: usize,
}

impl Default for RosterLimits {
    fn default() -> Self {
        Self {
            recent_spotlight_cap: DEFAULT_RECENT_SPOTLIGHT_CAP,
            spotlight_timeline_cap: DEFAULT_SPOTLIGHT_TIMELINE_CAP,
            roll_history_cap: DEFAULT_ROLL_HISTORY_CAP,
            max_undo_depth: MAX_UNDO_DEPTH,
        }
    }
}

/// Configuration for a new encounter session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncounterConfig {
    /// Log and undo caps.
    pub limits: RosterLimits,

    /// Fallback max HP for characters.
    pub default_character_hp: u32,

    /// Fallback max stress for characters.
    pub default_character_stress: u32,

    /// Fear available when the encounter starts.
    pub initial_fear: u32,

    /// Upper bound for the fear pool, `None` for unbounded.
    pub max_fear: Option<u32>,
}

impl EncounterConfig {
    /// Create a config with the default caps.
    pub fn new() -> Self {
        Self {
            limits: RosterLimits::default(),
            default_character_hp: DEFAULT_CHARACTER_HP,
            default_character_stress: DEFAULT_CHARACTER_STRESS,
            initial_fear: 0,
            max_fear: Some(DEFAULT_MAX_FEAR),
        }
    }

    /// Replace all caps at once.
    pub fn with_limits(mut self, limits: RosterLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the undo/redo depth.
    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.limits.max_undo_depth = depth;
        self
    }

    /// Set the roll history cap.
    pub fn with_roll_history_cap(mut self, cap: usize) -> Self {
        self.limits.roll_history_cap = cap;
        self
    }

    /// Set fallback HP and stress for character drafts.
    pub fn with_character_defaults(mut self, hp: u32, stress: u32) -> Self {
        self.default_character_hp = hp;
        self.default_character_stress = stress;
        self
    }

    /// Set the starting fear pool.
    pub fn with_initial_fear(mut self, fear: u32) -> Self {
        self.initial_fear = fear;
        self
    }

    /// Set the fear cap (`None` removes it).
    pub fn with_max_fear(mut self, max_fear: Option<u32>) -> Self {
        self.max_fear = max_fear;
        self
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self::new()
    }
}
