use serde::{Deserialize, Serialize};

use sellsword_combat::{Inventory, Item, Lore, TroopCombatDelta, TroopUpdate};
use sellsword_core::SessionId;

/// The player's company profile: gold, the shared inventory, and the
/// sessions whose rewards were already paid out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub gold: u64,
    pub inventory: Inventory,
    pub credited_sessions: Vec<SessionId>,
}

impl Profile {
    /// Credit a battle's gold and loot once. Returns false if this session
    /// was already credited.
    pub fn credit(&mut self, session_id: &SessionId, gold: u64, items: &[Item]) -> bool {
        if self.credited_sessions.contains(session_id) {
            return false;
        }
        self.gold = self.gold.saturating_add(gold);
        self.inventory.merge(items.iter().cloned());
        self.credited_sessions.push(session_id.clone());
        true
    }
}

/// Partial troop document sent as a PATCH body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroopPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_gauge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battle_kills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat_hit_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat_attack_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_combat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lore: Option<Lore>,
}

impl From<&TroopCombatDelta> for TroopPatch {
    fn from(delta: &TroopCombatDelta) -> Self {
        Self {
            current_hp: Some(delta.current_hp),
            action_gauge: Some(delta.action_gauge),
            battle_kills: Some(delta.battle_kills),
            combat_hit_count: Some(delta.combat_hit_count),
            combat_attack_count: Some(delta.combat_attack_count),
            in_combat: Some(delta.in_combat),
            ..Default::default()
        }
    }
}

impl From<&TroopUpdate> for TroopPatch {
    fn from(update: &TroopUpdate) -> Self {
        Self {
            current_hp: Some(update.current_hp),
            action_gauge: Some(0.0),
            battle_kills: Some(0),
            combat_hit_count: Some(0),
            combat_attack_count: Some(0),
            in_combat: Some(false),
            level: Some(update.level),
            xp: Some(update.xp),
            lore: Some(update.lore),
        }
    }
}

/// List response of the document API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList<T> {
    #[serde(default = "Vec::new")]
    pub documents: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sellsword_combat::ItemRarity;
    use sellsword_core::TroopId;

    #[test]
    fn test_profile_credit_once() {
        let mut profile = Profile::default();
        let session = SessionId::generate();
        let pelt = Item::material("wolf_pelt", "Wolf Pelt", ItemRarity::Common);
        assert!(profile.credit(&session, 15, &[pelt.clone()]));
        assert!(!profile.credit(&session, 15, &[pelt]));
        assert_eq!(profile.gold, 15);
        assert_eq!(profile.inventory.len(), 1);
    }

    #[test]
    fn test_delta_patch_fields() {
        let delta = TroopCombatDelta {
            troop_id: TroopId::new("a"),
            current_hp: 40,
            action_gauge: 12.0,
            battle_kills: 1,
            combat_hit_count: 3,
            combat_attack_count: 4,
            in_combat: true,
        };
        let json = serde_json::to_value(TroopPatch::from(&delta)).unwrap();
        assert_eq!(json["currentHp"], 40);
        assert_eq!(json["inCombat"], true);
        assert!(json.get("troopId").is_none());
        assert!(json.get("level").is_none());
    }

    #[test]
    fn test_update_patch_resets_combat_fields() {
        let update = TroopUpdate {
            troop_id: TroopId::new("a"),
            current_hp: 70,
            level: 3,
            xp: 300,
            lore: Lore::default(),
            leveled_up: false,
        };
        let json = serde_json::to_value(TroopPatch::from(&update)).unwrap();
        assert_eq!(json["inCombat"], false);
        assert_eq!(json["battleKills"], 0);
        assert_eq!(json["level"], 3);
        assert_eq!(json["lore"]["missionsWon"], 0);
    }

    #[test]
    fn test_profile_partial_document() {
        let profile: Profile = serde_json::from_str(r#"{"gold": 40}"#).unwrap();
        assert_eq!(profile.gold, 40);
        assert!(profile.inventory.is_empty());
    }
}
