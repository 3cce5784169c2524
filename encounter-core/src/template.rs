//! Catalog templates for adversaries and environments.
//!
//! Templates are read-only inputs. The roster copies them into trackers and
//! never mutates them; per-encounter changes live in override fields on the
//! tracker instead.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Attacks and Thresholds
// ============================================================================

/// An adversary's standard attack as printed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackProfile {
    pub name: String,
    /// Raw modifier text, e.g. `"+3"` or `"−1"` (unicode minus).
    #[serde(deserialize_with = "number_or_string")]
    pub modifier: String,
    pub range: String,
    /// Damage notation, e.g. `"2d8+3 phy"`.
    pub damage: String,
}

/// Damage thresholds: either structured breakpoints or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Thresholds {
    Values(ThresholdValues),
    Text(String),
}

/// Structured damage breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdValues {
    pub major: i32,
    pub severe: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub massive: Option<i32>,
}

impl ThresholdValues {
    pub fn new(major: i32, severe: i32) -> Self {
        Self {
            major,
            severe,
            massive: None,
        }
    }
}

// ============================================================================
// Features
// ============================================================================

/// A catalog feature: a bare string or a named entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureTemplate {
    Text(String),
    Detailed {
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default)]
        description: String,
    },
}

impl FeatureTemplate {
    /// Create a named feature.
    pub fn detailed(
        name: impl Into<String>,
        kind: Option<&str>,
        description: impl Into<String>,
    ) -> Self {
        FeatureTemplate::Detailed {
            name: name.into(),
            kind: kind.map(str::to_string),
            description: description.into(),
        }
    }

    /// Feature name. Bare strings of the form `"Name: text"` use the part
    /// before the first colon.
    pub fn name(&self) -> &str {
        match self {
            FeatureTemplate::Text(text) => match text.split_once(':') {
                Some((name, _)) => name.trim(),
                None => text.trim(),
            },
            FeatureTemplate::Detailed { name, .. } => name,
        }
    }

    /// Feature text without the name.
    pub fn description(&self) -> &str {
        match self {
            FeatureTemplate::Text(text) => match text.split_once(':') {
                Some((_, description)) => description.trim(),
                None => "",
            },
            FeatureTemplate::Detailed { description, .. } => description,
        }
    }

    /// Feature type (action, reaction, passive), if the catalog gives one.
    pub fn kind(&self) -> Option<&str> {
        match self {
            FeatureTemplate::Text(_) => None,
            FeatureTemplate::Detailed { kind, .. } => kind.as_deref(),
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Catalog entry for an adversary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdversaryTemplate {
    pub name: String,
    pub tier: u8,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub motives: String,
    pub difficulty: i32,
    pub attack: AttackProfile,
    pub thresholds: Thresholds,
    pub hp: u32,
    pub stress: u32,
    #[serde(default)]
    pub experiences: Vec<String>,
    #[serde(default)]
    pub features: Vec<FeatureTemplate>,
}

/// Catalog entry for an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentTemplate {
    pub name: String,
    pub tier: u8,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impulses: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub potential_adversaries: Vec<String>,
    #[serde(default)]
    pub features: Vec<FeatureTemplate>,
}

/// Catalogs print modifiers both as numbers and as strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n >= 0 => format!("+{n}"),
        Raw::Number(n) => n.to_string(),
        Raw::Text(text) => text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adversary_from_catalog_json() {
        let json = r#"{
            "name": "Bear",
            "tier": 1,
            "role": "Bruiser",
            "difficulty": 14,
            "attack": {"name": "Claws", "modifier": 1, "range": "Melee", "damage": "1d8+3 phy"},
            "thresholds": {"major": 9, "severe": 17},
            "hp": 7,
            "stress": 2,
            "features": [
                "Overwhelming Force: Targets who mark HP are knocked back.",
                {"name": "Bite", "type": "Action", "description": "Mark a Stress to bite."}
            ]
        }"#;

        let template: AdversaryTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.attack.modifier, "+1");
        assert_eq!(template.thresholds, Thresholds::Values(ThresholdValues::new(9, 17)));
        assert_eq!(template.features.len(), 2);
        assert_eq!(template.features[0].name(), "Overwhelming Force");
        assert_eq!(template.features[1].kind(), Some("Action"));
        assert!(template.description.is_empty());
    }

    #[test]
    fn test_free_text_thresholds_stay_text() {
        let thresholds: Thresholds = serde_json::from_str(r#""None (Minion)""#).unwrap();
        assert_eq!(thresholds, Thresholds::Text("None (Minion)".to_string()));
    }

    #[test]
    fn test_negative_numeric_modifier() {
        let attack: AttackProfile = serde_json::from_str(
            r#"{"name": "Slam", "modifier": -2, "range": "Melee", "damage": "1d6"}"#,
        )
        .unwrap();
        assert_eq!(attack.modifier, "-2");
    }

    #[test]
    fn test_text_feature_without_colon() {
        let feature = FeatureTemplate::Text("Relentless (2)".to_string());
        assert_eq!(feature.name(), "Relentless (2)");
        assert_eq!(feature.description(), "");
        assert_eq!(feature.kind(), None);
    }

    #[test]
    fn test_environment_type_field() {
        let json = r#"{
            "name": "Collapsing Bridge",
            "tier": 2,
            "type": "Event",
            "impulses": ["Crumble", "Separate the party"],
            "features": ["Falling Stones: Everyone on the bridge marks a Stress."]
        }"#;

        let template: EnvironmentTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.kind, "Event");
        assert_eq!(template.difficulty, None);
        assert_eq!(template.impulses.len(), 2);
    }
}
