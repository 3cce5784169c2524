//! Dice notation for adversary rolls.
//!
//! Supports `XdY+Z` expressions with any number of dice terms and flat
//! modifiers. Catalog damage strings carry a trailing damage type
//! (`"1d12+2 phy"`); [`DiceExpression::parse_leading`] reads just the dice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many dice: {0}")]
    TooManyDice(u64),
}

/// Most dice a single expression may roll.
pub const MAX_DICE: u64 = 100;

/// Die sizes found on adversary and environment stat blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// One `XdY` term of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub die_type: DieType,
}

/// A parsed dice expression (e.g., `2d8+3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
    pub original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase().replace('\u{2212}', "-");
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_component(&current, sign, &mut components, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            Self::parse_component(&current, sign, &mut components, &mut modifier)?;
        }

        if components.is_empty() && modifier == 0 {
            return Err(DiceError::NoDice);
        }

        let dice: u64 = components.iter().map(|c| u64::from(c.count)).sum();
        if dice > MAX_DICE {
            return Err(DiceError::TooManyDice(dice));
        }

        Ok(DiceExpression {
            components,
            modifier,
            original: notation,
        })
    }

    /// Parse the first whitespace-separated token, ignoring trailing text
    /// such as a damage type.
    pub fn parse_leading(text: &str) -> Result<Self, DiceError> {
        let token = text.split_whitespace().next().ok_or(DiceError::NoDice)?;
        Self::parse(token)
    }

    fn parse_component(
        s: &str,
        sign: i32,
        components: &mut Vec<DiceComponent>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        if let Some(d_pos) = s.find('d') {
            let count_str = &s[..d_pos];
            let sides_str = &s[d_pos + 1..];

            let count: u32 = if count_str.is_empty() {
                1
            } else {
                count_str
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
            };
            let sides: u32 = sides_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            let die_type = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

            if sign < 0 {
                return Err(DiceError::InvalidNotation(s.to_string()));
            }
            components.push(DiceComponent { count, die_type });
        } else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier = sign
                .checked_mul(value)
                .and_then(|v| modifier.checked_add(v))
                .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;
        }

        Ok(())
    }

    /// Roll with the given RNG.
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollOutcome {
        let rolls: Vec<u32> = self
            .components
            .iter()
            .flat_map(|c| std::iter::repeat(c.die_type).take(c.count as usize))
            .map(|die| rng.gen_range(1..=die.sides()))
            .collect();

        let dice_total: i32 = rolls.iter().map(|&r| r as i32).sum();

        // Natural results only mean something for a lone d20
        let d20 = match self.components.as_slice() {
            [DiceComponent {
                count: 1,
                die_type: DieType::D20,
            }] => rolls.first().copied(),
            _ => None,
        };

        RollOutcome {
            notation: self.original.clone(),
            rolls,
            modifier: self.modifier,
            total: dice_total.saturating_add(self.modifier),
            natural_20: d20 == Some(20),
            natural_1: d20 == Some(1),
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// The result of a roll, cached on the adversary and summarized in the
/// roll history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollOutcome {
    pub notation: String,
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
    pub natural_20: bool,
    pub natural_1: bool,
}

impl RollOutcome {
    pub fn is_critical(&self) -> bool {
        self.natural_20
    }

    pub fn is_fumble(&self) -> bool {
        self.natural_1
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rolls = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match self.modifier {
            0 => write!(f, "[{rolls}] = {}", self.total),
            m if m > 0 => write!(f, "[{rolls}] + {m} = {}", self.total),
            m => write!(f, "[{rolls}] - {} = {}", m.abs(), self.total),
        }
    }
}

/// Roll a d20 plus a flat modifier.
pub fn roll_d20<R: Rng>(modifier: i32, rng: &mut R) -> RollOutcome {
    DiceExpression {
        components: vec![DiceComponent {
            count: 1,
            die_type: DieType::D20,
        }],
        modifier,
        original: format!("1d20{modifier:+}"),
    }
    .roll_with_rng(rng)
}
