//! Effective adversary values.
//!
//! An adversary carries its catalog template unchanged plus optional,
//! partial overrides. Readers never look at `source` directly for combat
//! numbers; they ask for the effective value, which takes each overridden
//! sub-field and falls back to the template for the rest.

use crate::template::{FeatureTemplate, ThresholdValues, Thresholds};
use crate::tracker::AdversaryTracker;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Partial replacement for an adversary's attack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttackOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<String>,
}

/// Partial replacement for an adversary's damage thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThresholdsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severe: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub massive: Option<i32>,
}

/// Attack after overrides, with the modifier already parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveAttack {
    pub name: String,
    pub modifier: i32,
    pub range: String,
    pub damage: String,
}

/// Thresholds after overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EffectiveThresholds {
    /// Free-text thresholds, passed through unchanged.
    Text(String),
    Values { major: i32, severe: i32, massive: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdParseError {
    #[error("Expected \"major/severe\", found {0:?}")]
    Shape(String),
    #[error("Threshold {0:?} is not a whole number")]
    NotANumber(String),
}

// ============================================================================
// Parsing
// ============================================================================

/// Map the unicode minus sign to ASCII and drop a leading `+`.
pub fn normalize_modifier(raw: &str) -> String {
    let normalized = raw.trim().replace('\u{2212}', "-");
    match normalized.strip_prefix('+') {
        Some(rest) => rest.trim_start().to_string(),
        None => normalized,
    }
}

/// Parse an attack modifier. Anything unparseable counts as 0.
pub fn parse_modifier(raw: &str) -> i32 {
    normalize_modifier(raw).parse().unwrap_or(0)
}

fn split_thresholds(text: &str) -> Result<ThresholdValues, ThresholdParseError> {
    let (major, severe) = text
        .split_once('/')
        .ok_or_else(|| ThresholdParseError::Shape(text.to_string()))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|_| ThresholdParseError::NotANumber(part.trim().to_string()))
    };
    Ok(ThresholdValues::new(parse(major)?, parse(severe)?))
}

/// Read `"major/severe"` text thresholds.
///
/// Text that does not match is legal (e.g. `"None (Minion)"`) and comes back
/// unchanged as [`Thresholds::Text`].
pub fn parse_thresholds(text: &str) -> Thresholds {
    match split_thresholds(text) {
        Ok(values) => Thresholds::Values(values),
        Err(e) => {
            tracing::trace!(error = %e, "keeping free-text thresholds");
            Thresholds::Text(text.to_string())
        }
    }
}

// ============================================================================
// Damage Severity
// ============================================================================

/// How hard a hit lands against an adversary's thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DamageSeverity {
    None,
    Minor,
    Major,
    Severe,
    Massive,
}

impl DamageSeverity {
    /// Hit points marked by a hit of this severity.
    pub fn hp_marked(&self) -> u32 {
        match self {
            DamageSeverity::None => 0,
            DamageSeverity::Minor => 1,
            DamageSeverity::Major => 2,
            DamageSeverity::Severe => 3,
            DamageSeverity::Massive => 4,
        }
    }
}

/// Classify `damage` against effective thresholds.
///
/// Returns `None` for free-text thresholds. The massive tier only applies
/// when the optional massive damage rule is enabled.
pub fn damage_severity(
    thresholds: &EffectiveThresholds,
    damage: u32,
    massive_enabled: bool,
) -> Option<DamageSeverity> {
    let EffectiveThresholds::Values {
        major,
        severe,
        massive,
    } = *thresholds
    else {
        return None;
    };

    let damage = i64::from(damage);
    let severity = if damage == 0 {
        DamageSeverity::None
    } else if massive_enabled && damage >= i64::from(massive) {
        DamageSeverity::Massive
    } else if damage >= i64::from(severe) {
        DamageSeverity::Severe
    } else if damage >= i64::from(major) {
        DamageSeverity::Major
    } else {
        DamageSeverity::Minor
    };
    Some(severity)
}

// ============================================================================
// Resolution
// ============================================================================

impl AdversaryTracker {
    pub fn effective_attack(&self) -> EffectiveAttack {
        let source = &self.source.attack;
        let o = self.attack_override.as_ref();
        let pick = |field: Option<&String>, fallback: &String| field.unwrap_or(fallback).clone();

        EffectiveAttack {
            name: pick(o.and_then(|o| o.name.as_ref()), &source.name),
            modifier: parse_modifier(
                o.and_then(|o| o.modifier.as_deref())
                    .unwrap_or(source.modifier.as_str()),
            ),
            range: pick(o.and_then(|o| o.range.as_ref()), &source.range),
            damage: pick(o.and_then(|o| o.damage.as_ref()), &source.damage),
        }
    }

    pub fn effective_thresholds(&self) -> EffectiveThresholds {
        let base = match &self.source.thresholds {
            Thresholds::Values(values) => *values,
            Thresholds::Text(text) => match parse_thresholds(text) {
                Thresholds::Values(values) => values,
                Thresholds::Text(original) => return EffectiveThresholds::Text(original),
            },
        };
        let o = self.thresholds_override.unwrap_or_default();

        let major = o.major.unwrap_or(base.major);
        let severe = o.severe.unwrap_or(base.severe);
        let massive = o
            .massive
            .or(base.massive)
            .unwrap_or_else(|| severe.saturating_mul(2));

        EffectiveThresholds::Values {
            major,
            severe,
            massive,
        }
    }

    /// Overridden features replace the catalog list wholesale.
    pub fn effective_features(&self) -> &[FeatureTemplate] {
        self.features_override
            .as_deref()
            .unwrap_or(&self.source.features)
    }

    pub fn effective_difficulty(&self) -> i32 {
        self.difficulty_override.unwrap_or(self.source.difficulty)
    }

    /// True when any override is set, even one equal to the template value.
    pub fn has_modifications(&self) -> bool {
        self.attack_override.is_some()
            || self.thresholds_override.is_some()
            || self.features_override.is_some()
            || self.difficulty_override.is_some()
    }

    /// Drop every override.
    pub fn clear_overrides(&mut self) {
        self.attack_override = None;
        self.thresholds_override = None;
        self.features_override = None;
        self.difficulty_override = None;
    }
}
