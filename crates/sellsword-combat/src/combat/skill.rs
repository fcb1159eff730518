//! Skill catalog
//!
//! Each combatant has a single `row1` skill slot holding one of a small fixed
//! set of passive or initiative effects. Effects are applied by the turn
//! engine at their hook points; this module only names them and their
//! constants.

use serde::{Deserialize, Deserializer, Serialize};

/// Every Nth attack of an `oil_concentrated` user is empowered
pub const CONCENTRATED_EVERY: u32 = 3;
/// Damage modifier of an empowered attack
pub const CONCENTRATED_MODIFIER: f64 = 1.1;
/// Every Nth landed hit of an `oil_refined` user heals it
pub const REFINED_EVERY: u32 = 5;
/// HP restored by an `oil_refined` heal
pub const REFINED_HEAL: i32 = 5;
/// Charges granted by `elvish_flicker` on first relevance
pub const FLICKER_CHARGES: u8 = 3;
/// Speed multiplier while flicker charges remain
pub const FLICKER_SPEED_MULTIPLIER: f64 = 2.0;
/// Charges granted by `elvish_mindset` on first relevance
pub const MINDSET_CHARGES: u8 = 3;

/// The skill catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    /// Attacker passive: every 3rd attack deals x1.1 damage
    OilConcentrated,
    /// Attacker passive: every 5th landed hit heals 5 HP
    OilRefined,
    /// Initiative: doubled speed for the first 3 actions
    ElvishFlicker,
    /// Defensive: negates the first 3 incoming hits
    ElvishMindset,
}

impl SkillId {
    /// All catalog entries
    pub fn all() -> &'static [SkillId] {
        &[
            Self::OilConcentrated,
            Self::OilRefined,
            Self::ElvishFlicker,
            Self::ElvishMindset,
        ]
    }

    /// Stored identifier (e.g. `"elvish_flicker"`)
    pub fn key(self) -> &'static str {
        match self {
            Self::OilConcentrated => "oil_concentrated",
            Self::OilRefined => "oil_refined",
            Self::ElvishFlicker => "elvish_flicker",
            Self::ElvishMindset => "elvish_mindset",
        }
    }

    /// Parse a stored identifier; unknown identifiers yield `None`
    pub fn parse(key: &str) -> Option<SkillId> {
        Self::all().iter().copied().find(|s| s.key() == key)
    }
}

/// Skill slots of a combatant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default, deserialize_with = "lenient_skill")]
    pub row1: Option<SkillId>,
}

impl SkillSet {
    pub fn with_row1(skill: SkillId) -> Self {
        Self { row1: Some(skill) }
    }
}

/// Unknown or malformed skill ids become "no skill" instead of a decode error
fn lenient_skill<'de, D>(deserializer: D) -> Result<Option<SkillId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(SkillId::parse))
}
