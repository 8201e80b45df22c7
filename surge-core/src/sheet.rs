//! Character sheet attribute access.
//!
//! The host's attribute store is the system of record. Values arrive as
//! strings; this module names the attributes the rules read and turns raw
//! values into integers.

use crate::host::HostError;
use crate::resource::ResourceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current hit points (`current`) and maximum hit points (`max`).
pub const HP: &str = "hp";
/// Spendable hit dice (`current`) and the hit dice pool (`max`).
pub const HIT_DICE: &str = "hit_dice";
/// Faces on the character's hit die.
pub const HIT_DIE_SIZE: &str = "hitdietype";
pub const LEVEL: &str = "level";
/// Raw constitution score; the modifier is derived.
pub const CONSTITUTION: &str = "constitution";
/// Healing surge readiness, created on first use.
pub const HEALING_SURGE: &str = "healing_surge";
/// Display name override for the journal.
pub const NAME: &str = "name";
/// `"1"` when the sheet is an NPC sheet.
pub const NPC: &str = "npc";

/// Opaque key into the host's attribute store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Which half of an attribute to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Current,
    Max,
}

/// Attribute storage on the remote character sheet.
pub trait AttributeStore {
    /// Read one half of an attribute. `None` when the attribute does not exist.
    fn read_attribute(
        &self,
        character: &CharacterId,
        name: &str,
        kind: AttributeKind,
    ) -> Result<Option<String>, HostError>;

    /// Write an attribute, creating it if absent. A `max` of `None` leaves
    /// the stored maximum untouched.
    fn write_attribute(
        &self,
        character: &CharacterId,
        name: &str,
        current: &str,
        max: Option<&str>,
    ) -> Result<(), HostError>;
}

/// Sheet reference notation, `hp` or `hp|max`.
pub fn attribute_label(name: &str, kind: AttributeKind) -> String {
    match kind {
        AttributeKind::Current => name.to_string(),
        AttributeKind::Max => format!("{name}|max"),
    }
}

/// Read a value that must be present and non-empty.
pub fn read_required<S: AttributeStore + ?Sized>(
    store: &S,
    character: &CharacterId,
    name: &str,
    kind: AttributeKind,
) -> Result<String, ResourceError> {
    match store.read_attribute(character, name, kind)? {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ResourceError::AttributeMissing(attribute_label(name, kind))),
    }
}

/// Read a required integer attribute.
pub fn read_required_int<S: AttributeStore + ?Sized>(
    store: &S,
    character: &CharacterId,
    name: &str,
    kind: AttributeKind,
) -> Result<i32, ResourceError> {
    let value = read_required(store, character, name, kind)?;
    value
        .parse::<i32>()
        .map_err(|_| ResourceError::AttributeInvalid {
            name: attribute_label(name, kind),
            value,
        })
}

/// Standard ability modifier: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i32) -> i32 {
    // Halving any i32 score minus ten stays within i32.
    (i64::from(score) - 10).div_euclid(2) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier_floors_negative_scores() {
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(14), 2);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn test_ability_modifier_extreme_scores() {
        assert_eq!(ability_modifier(i32::MIN), -1_073_741_829);
        assert_eq!(ability_modifier(i32::MAX), 1_073_741_818);
    }

    #[test]
    fn test_attribute_label() {
        assert_eq!(attribute_label(HP, AttributeKind::Current), "hp");
        assert_eq!(attribute_label(HP, AttributeKind::Max), "hp|max");
    }
}
