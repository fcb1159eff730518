//! Turn engine
//!
//! Tick-based simulation over a [`CombatContext`]. Each tick every living
//! fighter gains gauge equal to its speed; fighters at 100 or more act in
//! gauge order, attacking a random living opponent. The engine is pure and
//! synchronous: randomness comes in through the `rng` argument and
//! persistence is left to the caller via [`TickReport`] and the snapshot
//! helpers.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::{CombatContext, Side};
use super::enemy::Enemy;
use super::error::CombatError;
use super::log::{BattleEvent, BattleLog, BattleOutcome};
use super::session::TroopCombatDelta;
use crate::combat::damage::roll_damage;
use crate::combat::skill::{
    SkillId, CONCENTRATED_EVERY, CONCENTRATED_MODIFIER, MINDSET_CHARGES, REFINED_EVERY, REFINED_HEAL,
};

/// Gauge spent per action
pub const ACTION_COST: f64 = 100.0;

/// Lifecycle of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleState {
    Idle,
    Fighting,
    Victory,
    Defeat,
}

impl BattleState {
    /// Allowed moves: idle to fighting, fighting to either terminal state
    pub fn can_transition_to(self, next: BattleState) -> bool {
        matches!(
            (self, next),
            (BattleState::Idle, BattleState::Fighting)
                | (BattleState::Fighting, BattleState::Victory)
                | (BattleState::Fighting, BattleState::Defeat)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BattleState::Victory | BattleState::Defeat)
    }

    pub fn outcome(self) -> Option<BattleOutcome> {
        match self {
            BattleState::Victory => Some(BattleOutcome::Victory),
            BattleState::Defeat => Some(BattleOutcome::Defeat),
            BattleState::Idle | BattleState::Fighting => None,
        }
    }
}

impl From<BattleOutcome> for BattleState {
    fn from(outcome: BattleOutcome) -> Self {
        match outcome {
            BattleOutcome::Victory => BattleState::Victory,
            BattleOutcome::Defeat => BattleState::Defeat,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<BattleEvent>,
    /// Arena indices of fighters that acted or were targeted
    pub changed: Vec<usize>,
    /// Set on the tick that ended the battle
    pub outcome: Option<BattleOutcome>,
}

/// Drives one battle from start to a terminal state
#[derive(Debug, Clone)]
pub struct TurnEngine {
    state: BattleState,
    context: CombatContext,
    tick: u64,
    log: BattleLog,
    closed_remotely: bool,
}

impl TurnEngine {
    /// An idle engine. `tick` is the persisted counter when resuming.
    pub fn new(context: CombatContext, log: BattleLog, tick: u64) -> Self {
        Self {
            state: BattleState::Idle,
            context,
            tick,
            log,
            closed_remotely: false,
        }
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.state.outcome()
    }

    pub fn context(&self) -> &CombatContext {
        &self.context
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    fn transition(&mut self, next: BattleState) -> Result<(), CombatError> {
        if !self.state.can_transition_to(next) {
            return Err(CombatError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Battle state {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), CombatError> {
        self.transition(BattleState::Fighting)
    }

    /// Outcome implied by the arena: a troop wipe is a defeat even if the
    /// enemies are gone too
    pub fn check_termination(&self) -> Option<BattleOutcome> {
        if self.context.side_wiped(Side::Troops) {
            Some(BattleOutcome::Defeat)
        } else if self.context.side_wiped(Side::Enemies) {
            Some(BattleOutcome::Victory)
        } else {
            None
        }
    }

    /// Advance the battle by one tick. A no-op unless fighting.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickReport {
        if self.state != BattleState::Fighting {
            return TickReport {
                tick: self.tick,
                ..Default::default()
            };
        }

        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..Default::default()
        };

        for fighter in self.context.fighters_mut() {
            if fighter.is_alive() {
                let gain = fighter.gauge_gain();
                fighter.gauge += gain;
            }
        }

        for actor in self.select_actors() {
            let Some(fighter) = self.context.get_mut(actor) else {
                continue;
            };
            // Killed earlier this tick
            if !fighter.is_alive() {
                continue;
            }
            fighter.gauge -= ACTION_COST;
            let side = fighter.side();

            let opponents = self.context.living(side.opponent());
            let Some(&target) = opponents.choose(rng) else {
                // Nobody left to fight; termination below picks the outcome
                break;
            };

            report.events.extend(self.attack(actor, target, rng));
            if let Some(fighter) = self.context.get_mut(actor) {
                fighter.consume_flicker();
            }
            for index in [actor, target] {
                if !report.changed.contains(&index) {
                    report.changed.push(index);
                }
            }
        }

        if let Some(outcome) = self.check_termination() {
            self.state = outcome.into();
            debug!("Battle ended at tick {}: {:?}", self.tick, outcome);
            report.events.push(BattleEvent::Ended { outcome });
            report.outcome = Some(outcome);
        }

        for event in &report.events {
            self.log.record(event);
        }
        report
    }

    /// Living fighters with a full gauge, in acting order: gauge descending,
    /// then effective speed descending, then arena order
    fn select_actors(&self) -> Vec<usize> {
        let fighters = self.context.fighters();
        let mut ready: Vec<usize> = fighters
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_alive() && f.gauge >= ACTION_COST)
            .map(|(i, _)| i)
            .collect();
        ready.sort_by(|&a, &b| {
            let (fa, fb) = (&fighters[a], &fighters[b]);
            fb.gauge
                .total_cmp(&fa.gauge)
                .then(fb.stats.spd.cmp(&fa.stats.spd))
                .then(a.cmp(&b))
        });
        ready
    }

    /// Resolve one attack, applying skill effects on both sides
    fn attack<R: Rng + ?Sized>(&mut self, attacker: usize, target: usize, rng: &mut R) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        let fighters = self.context.fighters_mut();
        let valid = attacker != target
            && fighters.get(attacker).is_some_and(|f| f.is_alive())
            && fighters.get(target).is_some_and(|f| f.is_alive());
        if !valid {
            return events;
        }

        let a = &mut fighters[attacker];
        a.counters.attacks = a.counters.attacks.saturating_add(1);
        let empowered = a.skill == Some(SkillId::OilConcentrated)
            && a.counters.attacks % CONCENTRATED_EVERY == 0;
        let attacker_name = a.name.clone();
        let ap = a.stats.ap;

        let t = &mut fighters[target];
        if t.skill == Some(SkillId::ElvishMindset) {
            let name = &t.name;
            let charges = t.counters.mindset_charges.get_or_insert_with(|| {
                debug!("{} gains {} mindset charges", name, MINDSET_CHARGES);
                MINDSET_CHARGES
            });
            if *charges > 0 {
                *charges -= 1;
                events.push(BattleEvent::Blocked {
                    attacker: attacker_name,
                    target: t.name.clone(),
                });
                return events;
            }
        }

        let modifier = if empowered { CONCENTRATED_MODIFIER } else { 1.0 };
        let roll = roll_damage(rng, ap, modifier, t.stats.def);
        t.current_hp -= roll.amount;
        let killed = t.current_hp <= 0;
        if killed {
            t.current_hp = 0;
        }
        let target_name = t.name.clone();
        events.push(BattleEvent::Attack {
            attacker: attacker_name.clone(),
            target: target_name.clone(),
            damage: roll.amount,
            empowered,
        });

        let a = &mut fighters[attacker];
        a.counters.hits = a.counters.hits.saturating_add(1);
        if a.skill == Some(SkillId::OilRefined) && a.counters.hits % REFINED_EVERY == 0 {
            let healed = REFINED_HEAL.min(a.stats.max_hp - a.current_hp).max(0);
            if healed > 0 {
                a.current_hp += healed;
                events.push(BattleEvent::Healed {
                    name: attacker_name,
                    amount: healed,
                });
            }
        }
        if killed {
            a.counters.kills = a.counters.kills.saturating_add(1);
            events.push(BattleEvent::Died { name: target_name });
        }
        events
    }

    /// The stored session was closed elsewhere. Ends a running battle as a
    /// victory without asking for another resolution.
    pub fn observe_session_closed(&mut self) -> bool {
        if self.state != BattleState::Fighting {
            return false;
        }
        self.state = BattleState::Victory;
        self.closed_remotely = true;
        debug!("Session closed remotely at tick {}", self.tick);
        true
    }

    /// Ended locally and still needs the resolution handler
    pub fn resolution_required(&self) -> bool {
        self.state.is_terminal() && !self.closed_remotely
    }

    /// Current enemy records in spawn order
    pub fn enemy_snapshot(&self) -> Vec<Enemy> {
        self.context
            .fighters()
            .iter()
            .filter_map(|f| f.to_enemy())
            .collect()
    }

    /// Combat field deltas for the troops at `indices`; enemies are skipped
    pub fn troop_deltas(&self, indices: &[usize]) -> Vec<TroopCombatDelta> {
        indices
            .iter()
            .filter_map(|&i| self.context.get(i))
            .filter_map(TroopCombatDelta::from_fighter)
            .collect()
    }

    /// Deltas for every participating troop
    pub fn all_troop_deltas(&self) -> Vec<TroopCombatDelta> {
        self.troop_deltas(&self.context.troop_indices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::skill::SkillSet;
    use crate::roster::stats::BaseStats;
    use crate::roster::troop::Troop;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sellsword_core::TroopId;

    fn troop(id: &str) -> Troop {
        Troop::new(TroopId::new(id), id, BaseStats::new(100.0, 10.0, 2.0, 10.0))
    }

    fn dummy() -> Enemy {
        // Never acts, never dies
        Enemy::new("Dummy", 100_000, 1, 0, 0)
    }

    fn engine(troops: &[Troop], enemies: &[Enemy]) -> TurnEngine {
        let mut engine = TurnEngine::new(CombatContext::new(troops, enemies), BattleLog::default(), 0);
        engine.start().unwrap();
        engine
    }

    fn run_to_end(engine: &mut TurnEngine, rng: &mut StdRng, max_ticks: u32) -> Option<BattleOutcome> {
        for _ in 0..max_ticks {
            if let Some(outcome) = engine.tick(rng).outcome {
                return Some(outcome);
            }
        }
        None
    }

    #[test]
    fn test_state_transitions() {
        assert!(BattleState::Idle.can_transition_to(BattleState::Fighting));
        assert!(BattleState::Fighting.can_transition_to(BattleState::Defeat));
        assert!(!BattleState::Idle.can_transition_to(BattleState::Victory));
        assert!(!BattleState::Victory.can_transition_to(BattleState::Fighting));
        assert!(!BattleState::Defeat.can_transition_to(BattleState::Victory));

        let mut e = engine(&[troop("a")], &[dummy()]);
        assert_eq!(
            e.start(),
            Err(CombatError::InvalidTransition {
                from: BattleState::Fighting,
                to: BattleState::Fighting
            })
        );
    }

    #[test]
    fn test_idle_engine_does_not_tick() {
        let mut e = TurnEngine::new(
            CombatContext::new(&[troop("a")], &[dummy()]),
            BattleLog::default(),
            7,
        );
        let mut rng = StdRng::seed_from_u64(1);
        let report = e.tick(&mut rng);
        assert_eq!(report.tick, 7);
        assert!(report.events.is_empty());
        assert_eq!(e.tick_count(), 7);
    }

    #[test]
    fn test_single_troop_beats_wolf() {
        let wolf = Enemy::new("Wolf", 40, 8, 0, 8);
        for seed in 0..20 {
            let mut e = engine(&[troop("t1")], &[wolf.clone()]);
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = run_to_end(&mut e, &mut rng, 200);
            assert_eq!(outcome, Some(BattleOutcome::Victory));
            assert!((40..=50).contains(&e.tick_count()), "ended at {}", e.tick_count());

            let deltas = e.all_troop_deltas();
            assert_eq!(deltas.len(), 1);
            assert_eq!(deltas[0].battle_kills, 1);
            assert!(deltas[0].current_hp > 0);

            let deaths = e.log().iter().filter(|l| l.contains("died!")).count();
            assert_eq!(deaths, 1);
        }
    }

    #[test]
    fn test_terminal_engine_ignores_ticks() {
        let mut e = engine(&[troop("t1")], &[Enemy::new("Rat", 1, 1, 0, 0)]);
        let mut rng = StdRng::seed_from_u64(2);
        run_to_end(&mut e, &mut rng, 50);
        let ticks = e.tick_count();
        let lines = e.log().len();
        let report = e.tick(&mut rng);
        assert_eq!(report.outcome, None);
        assert_eq!(e.tick_count(), ticks);
        assert_eq!(e.log().len(), lines);
    }

    #[test]
    fn test_simultaneous_wipe_is_defeat() {
        let mut t = troop("t1");
        t.current_hp = Some(0);
        let mut wolf = Enemy::new("Wolf", 40, 8, 0, 8);
        wolf.current_hp = 0;
        let mut e = engine(&[t], &[wolf]);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(e.check_termination(), Some(BattleOutcome::Defeat));
        assert_eq!(e.tick(&mut rng).outcome, Some(BattleOutcome::Defeat));
        assert_eq!(e.state(), BattleState::Defeat);
    }

    #[test]
    fn test_troop_wipe_is_defeat() {
        let mut weak = troop("t1");
        weak.base_stats = BaseStats::new(5.0, 1.0, 0.0, 1.0);
        let ogre = Enemy::new("Ogre", 500, 50, 10, 30);
        let mut e = engine(&[weak], &[ogre]);
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(run_to_end(&mut e, &mut rng, 100), Some(BattleOutcome::Defeat));
        assert!(e.resolution_required());
    }

    #[test]
    fn test_concentrated_every_third_attack() {
        let mut t = troop("t1");
        t.skills = SkillSet::with_row1(SkillId::OilConcentrated);
        let mut e = engine(&[t], &[dummy()]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut boosted = Vec::new();
        for n in 1..=9 {
            for event in e.attack(0, 1, &mut rng) {
                if let BattleEvent::Attack { empowered: true, .. } = event {
                    boosted.push(n);
                }
            }
        }
        assert_eq!(boosted, vec![3, 6, 9]);
    }

    #[test]
    fn test_mindset_blocks_first_three_hits() {
        let mut t = troop("t1");
        t.skills = SkillSet::with_row1(SkillId::ElvishMindset);
        let wolf = Enemy::new("Wolf", 40, 8, 0, 8);
        let mut e = engine(&[t], &[wolf]);
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..3 {
            let events = e.attack(1, 0, &mut rng);
            assert!(matches!(events.as_slice(), [BattleEvent::Blocked { .. }]));
            assert_eq!(e.context().fighters()[0].current_hp, 100);
        }
        // Blocked hits never count as landed
        assert_eq!(e.context().fighters()[1].counters.hits, 0);

        let events = e.attack(1, 0, &mut rng);
        assert!(matches!(events.as_slice(), [BattleEvent::Attack { .. }]));
        assert!(e.context().fighters()[0].current_hp < 100);
        assert_eq!(e.context().fighters()[0].counters.mindset_charges, Some(0));
    }

    #[test]
    fn test_refined_heals_every_fifth_hit() {
        let mut t = troop("t1");
        t.skills = SkillSet::with_row1(SkillId::OilRefined);
        t.current_hp = Some(50);
        let mut e = engine(&[t], &[dummy()]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..4 {
            e.attack(0, 1, &mut rng);
        }
        assert_eq!(e.context().fighters()[0].current_hp, 50);
        let events = e.attack(0, 1, &mut rng);
        assert!(events.contains(&BattleEvent::Healed {
            name: "t1".into(),
            amount: REFINED_HEAL
        }));
        assert_eq!(e.context().fighters()[0].current_hp, 55);
    }

    #[test]
    fn test_refined_heal_capped_at_max() {
        let mut t = troop("t1");
        t.skills = SkillSet::with_row1(SkillId::OilRefined);
        t.current_hp = Some(98);
        let mut e = engine(&[t], &[dummy()]);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..5 {
            e.attack(0, 1, &mut rng);
        }
        assert_eq!(e.context().fighters()[0].current_hp, 100);
    }

    #[test]
    fn test_flicker_doubles_first_three_actions() {
        let mut t = troop("t1");
        t.skills = SkillSet::with_row1(SkillId::ElvishFlicker);
        let mut e = engine(&[t], &[dummy()]);
        let mut rng = StdRng::seed_from_u64(9);

        let mut acted = Vec::new();
        for _ in 0..30 {
            let report = e.tick(&mut rng);
            if report.changed.contains(&0) {
                acted.push(report.tick);
            }
        }
        assert_eq!(acted, vec![5, 10, 15, 25]);
        assert_eq!(e.context().fighters()[0].counters.flicker_charges, Some(0));
    }

    #[test]
    fn test_tie_break_by_speed_then_arena_order() {
        let slow = troop("slow");
        let mut fast = troop("fast");
        fast.base_stats.spd = 12.0;
        let mut twin = troop("twin");
        twin.base_stats.spd = 12.0;

        let mut ctx = CombatContext::new(&[slow, fast, twin], &[dummy()]);
        for f in ctx.fighters_mut().iter_mut().take(3) {
            f.gauge = 100.0;
        }
        let e = TurnEngine::new(ctx, BattleLog::default(), 0);
        assert_eq!(e.select_actors(), vec![1, 2, 0]);
    }

    #[test]
    fn test_higher_gauge_acts_first() {
        let mut ctx = CombatContext::new(&[troop("a"), troop("b")], &[dummy()]);
        ctx.fighters_mut()[0].gauge = 100.0;
        ctx.fighters_mut()[1].gauge = 130.0;
        let e = TurnEngine::new(ctx, BattleLog::default(), 0);
        assert_eq!(e.select_actors(), vec![1, 0]);
    }

    #[test]
    fn test_remote_close_skips_resolution() {
        let mut e = engine(&[troop("t1")], &[dummy()]);
        assert!(e.observe_session_closed());
        assert_eq!(e.state(), BattleState::Victory);
        assert!(!e.resolution_required());
        assert!(!e.observe_session_closed());
    }

    #[test]
    fn test_changed_indices_and_deltas() {
        let mut ctx = CombatContext::new(&[troop("a"), troop("b")], &[dummy()]);
        ctx.fighters_mut()[1].gauge = 95.0;
        let mut e = TurnEngine::new(ctx, BattleLog::default(), 0);
        e.start().unwrap();
        let mut rng = StdRng::seed_from_u64(10);
        let report = e.tick(&mut rng);
        assert_eq!(report.changed, vec![1, 2]);
        let deltas = e.troop_deltas(&report.changed);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].troop_id, TroopId::new("b"));
        assert_eq!(deltas[0].combat_attack_count, 1);
        assert!(deltas[0].in_combat);
    }

    #[test]
    fn test_counters_saturate() {
        let mut t = troop("t1");
        t.combat_attack_count = u32::MAX;
        t.combat_hit_count = u32::MAX;
        t.battle_kills = u32::MAX;
        let mut e = engine(&[t], &[Enemy::new("Rat", 1, 1, 0, 0)]);
        let mut rng = StdRng::seed_from_u64(12);
        let events = e.attack(0, 1, &mut rng);
        assert!(events.contains(&BattleEvent::Died { name: "Rat".into() }));
        let counters = e.context().fighters()[0].counters;
        assert_eq!(counters.attacks, u32::MAX);
        assert_eq!(counters.hits, u32::MAX);
        assert_eq!(counters.kills, u32::MAX);
    }

    #[test]
    fn test_enemy_snapshot_tracks_damage() {
        let mut e = engine(&[troop("t1")], &[dummy()]);
        let mut rng = StdRng::seed_from_u64(11);
        e.attack(0, 1, &mut rng);
        let snapshot = e.enemy_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].current_hp < 100_000);
    }
}
