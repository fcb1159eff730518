//! Tavern recruits
//!
//! Rolls level-1 troops with randomized base stats.

use rand::seq::SliceRandom;
use rand::Rng;

use sellsword_core::TroopId;

use super::stats::BaseStats;
use super::troop::Troop;
use crate::combat::skill::SkillId;

const FIRST_NAMES: &[&str] = &[
    "Aldric", "Brannoc", "Cerys", "Dagna", "Edric", "Fenna", "Garrick", "Hild", "Isolde", "Jorund",
    "Kesta", "Leofric", "Maren", "Nyle", "Osric", "Perrin", "Rowena", "Sigrun", "Tamsin", "Wulfric",
];

/// Chance that a recruit arrives with a row1 skill
const SKILLED_RECRUIT_CHANCE: f64 = 0.25;

/// Roll a fresh recruit
pub fn generate_recruit<R: Rng + ?Sized>(rng: &mut R) -> Troop {
    let name = FIRST_NAMES.choose(rng).copied().unwrap_or("Recruit");
    let base = BaseStats::new(
        rng.gen_range(80..=120) as f64,
        rng.gen_range(8..=13) as f64,
        rng.gen_range(1..=4) as f64,
        rng.gen_range(8..=12) as f64,
    );
    let mut troop = Troop::new(TroopId::generate(), name, base);
    if rng.gen_bool(SKILLED_RECRUIT_CHANCE) {
        troop.skills.row1 = SkillId::all().choose(rng).copied();
    }
    troop
}
