//! Async battle runner
//!
//! Drives a [`TurnEngine`] on a tokio interval. Per-tick writes go through a
//! single ordered writer task so an older snapshot never lands after a newer
//! one; the loop never waits on them. Consumers follow the fight through a
//! `watch` channel of [`BattleSnapshot`]s and steer it with a
//! [`BattleControl`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use sellsword_combat::battle::{ResumeOutcome, Side};
use sellsword_combat::{
    find_mission, generate_enemies, launch, plan_resolution, resume, BattleOutcome, BattleState,
    CombatSession, Launch, LootTable, MissionParams, ResolutionPlan, RewardRules, SessionProgress,
    Troop, TroopCombatDelta, TurnEngine, DEFAULT_LOG_CAPACITY,
};
use sellsword_core::{SessionId, TickCadence, TroopId};

use crate::commit::{commit_resolution, recover_pending_resolution};
use crate::error::BattleError;
use crate::retry::RetryPolicy;
use crate::store::BattleStore;

/// Default number of ticks between checks of the stored session
pub const DEFAULT_REMOTE_POLL_TICKS: u64 = 5;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub cadence: TickCadence,
    /// Poll the stored session every N ticks; 0 disables polling
    pub remote_poll_every: u64,
    pub log_capacity: usize,
    pub rewards: RewardRules,
    pub retry: RetryPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cadence: TickCadence::default(),
            remote_poll_every: DEFAULT_REMOTE_POLL_TICKS,
            log_capacity: DEFAULT_LOG_CAPACITY,
            rewards: RewardRules::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Single-flight guard for resolution. Engaged at most once per session and
/// only released when a different session begins.
#[derive(Debug, Default)]
pub struct ResolutionLock {
    session: Mutex<Option<SessionId>>,
    engaged: AtomicBool,
}

impl ResolutionLock {
    /// Bind the lock to `session_id`, releasing it if it belonged to another
    /// session
    pub fn begin(&self, session_id: &SessionId) {
        let mut current = self.session.lock();
        if current.as_ref() != Some(session_id) {
            *current = Some(session_id.clone());
            self.engaged.store(false, Ordering::Release);
        }
    }

    /// Returns true for exactly one caller per session
    pub fn try_acquire(&self) -> bool {
        self.engaged
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }
}

/// What the view can ask of a running battle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub leave: bool,
    pub auto_battle: bool,
}

/// Cloneable handle for leaving the battlefield and toggling auto-battle
#[derive(Debug, Clone)]
pub struct BattleControl {
    tx: Arc<watch::Sender<ControlState>>,
}

impl BattleControl {
    /// Stop the loop after the current tick. The session stays active and
    /// can be resumed.
    pub fn leave(&self) {
        self.tx.send_modify(|s| s.leave = true);
    }

    pub fn set_auto(&self, enabled: bool) {
        self.tx.send_modify(|s| s.auto_battle = enabled);
    }

    pub fn is_auto(&self) -> bool {
        self.tx.borrow().auto_battle
    }

    pub fn has_left(&self) -> bool {
        self.tx.borrow().leave
    }
}

/// One fighter as shown to the view
#[derive(Debug, Clone, PartialEq)]
pub struct FighterSnapshot {
    pub name: String,
    pub side: Side,
    pub current_hp: i32,
    pub max_hp: i32,
    pub gauge: f64,
}

/// Read-only view of the battle between ticks
#[derive(Debug, Clone, PartialEq)]
pub struct BattleSnapshot {
    pub session_id: Option<SessionId>,
    pub tick: u64,
    pub state: BattleState,
    pub fighters: Vec<FighterSnapshot>,
    pub log: Vec<String>,
}

impl Default for BattleSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            tick: 0,
            state: BattleState::Idle,
            fighters: Vec::new(),
            log: Vec::new(),
        }
    }
}

impl BattleSnapshot {
    pub fn capture(engine: &TurnEngine, session_id: &SessionId) -> Self {
        Self {
            session_id: Some(session_id.clone()),
            tick: engine.tick_count(),
            state: engine.state(),
            fighters: engine
                .context()
                .fighters()
                .iter()
                .map(|f| FighterSnapshot {
                    name: f.name.clone(),
                    side: f.side(),
                    current_hp: f.current_hp,
                    max_hp: f.stats.max_hp,
                    gauge: f.gauge,
                })
                .collect(),
            log: engine.log().to_vec(),
        }
    }
}

/// A battle ready to be run
#[derive(Debug)]
pub struct ActiveBattle {
    pub engine: TurnEngine,
    pub session: CombatSession,
    /// Participant records as of launch or resume
    pub troops: Vec<Troop>,
    pub loot: LootTable,
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEnd {
    /// Ended here and the resolution was committed
    Resolved(ResolutionPlan),
    /// Another client closed the session
    ClosedRemotely,
    /// Resolution was already under way for this session
    AlreadyResolving,
    /// The player left; the session is still active
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleSummary {
    pub session_id: SessionId,
    pub ticks: u64,
    pub outcome: Option<BattleOutcome>,
    pub end: BattleEnd,
}

/// How the tick loop stopped
enum LoopExit {
    Finished,
    End(BattleEnd),
}

struct WriteJob {
    progress: SessionProgress,
    deltas: Vec<TroopCombatDelta>,
}

/// Ordered, fire-and-forget writer for per-tick snapshots
struct SnapshotWriter {
    tx: mpsc::UnboundedSender<WriteJob>,
    handle: JoinHandle<()>,
}

impl SnapshotWriter {
    fn spawn(store: Arc<dyn BattleStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteJob>();
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = store.save_progress(&job.progress).await {
                    warn!("Failed to save tick {}: {}", job.progress.tick, e);
                }
                for delta in &job.deltas {
                    if let Err(e) = store.apply_troop_delta(delta).await {
                        warn!("Failed to save troop {}: {}", delta.troop_id, e);
                    }
                }
            }
        });
        Self { tx, handle }
    }

    fn send(&self, job: WriteJob) {
        if self.tx.send(job).is_err() {
            warn!("Snapshot writer stopped, dropping tick write");
        }
    }

    /// Flush everything queued so far
    async fn finish(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!("Snapshot writer failed: {}", e);
        }
    }
}

/// The first `size` available troops of the roster
pub fn select_party(roster: &[Troop], size: usize) -> Vec<TroopId> {
    roster
        .iter()
        .filter(|t| t.is_available())
        .take(size)
        .map(|t| t.id.clone())
        .collect()
}

pub struct BattleRunner {
    store: Arc<dyn BattleStore>,
    config: RunnerConfig,
    rng: StdRng,
    lock: ResolutionLock,
    control: Arc<watch::Sender<ControlState>>,
    snapshots: watch::Sender<BattleSnapshot>,
}

impl BattleRunner {
    pub fn new(store: Arc<dyn BattleStore>, config: RunnerConfig, rng: StdRng) -> Self {
        let (control, _) = watch::channel(ControlState::default());
        let (snapshots, _) = watch::channel(BattleSnapshot::default());
        Self {
            store,
            config,
            rng,
            lock: ResolutionLock::default(),
            control: Arc::new(control),
            snapshots,
        }
    }

    pub fn control(&self) -> BattleControl {
        BattleControl {
            tx: Arc::clone(&self.control),
        }
    }

    pub fn snapshots(&self) -> watch::Receiver<BattleSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn BattleStore> {
        &self.store
    }

    /// Finish a resolution that a previous run left uncommitted
    pub async fn recover_pending_resolution(&self) -> Result<Option<ResolutionPlan>, BattleError> {
        recover_pending_resolution(&self.store, self.config.retry).await
    }

    /// Launch `mission` with the selected troops and persist the new session
    pub async fn start_mission(
        &mut self,
        mission: &MissionParams,
        selection: &[TroopId],
    ) -> Result<ActiveBattle, BattleError> {
        let roster = self.store.load_troops().await?;
        let enemies = generate_enemies(mission, &mut self.rng);
        let Launch {
            engine,
            mut session,
            troops,
        } = launch(&roster, selection, enemies, self.config.log_capacity)?;
        session.mission_id = Some(mission.id.clone());

        self.lock.begin(&session.id);
        self.control.send_modify(|s| s.leave = false);

        self.store.save_session(&session).await?;
        for delta in engine.all_troop_deltas() {
            self.store.apply_troop_delta(&delta).await?;
        }

        info!(
            "Launched {} with {} troops against {} enemies",
            mission.name,
            troops.len(),
            session.enemies.len()
        );
        Ok(ActiveBattle {
            engine,
            session,
            troops,
            loot: mission.loot.clone(),
        })
    }

    /// Pick up the stored session if it is still active
    pub async fn resume(&mut self) -> Result<Option<ActiveBattle>, BattleError> {
        let Some(mut session) = self.store.load_session().await? else {
            return Ok(None);
        };
        let roster = self.store.load_troops().await?;

        match resume(&session, &roster, self.config.log_capacity) {
            ResumeOutcome::Resumed {
                engine,
                troops,
                dropped,
            } => {
                if !dropped.is_empty() {
                    warn!("{} troops of session {} are gone", dropped.len(), session.id);
                }
                self.lock.begin(&session.id);
                self.control.send_modify(|s| s.leave = false);
                let loot = session
                    .mission_id
                    .as_deref()
                    .and_then(find_mission)
                    .map(|m| m.loot)
                    .unwrap_or_default();
                Ok(Some(ActiveBattle {
                    engine,
                    session,
                    troops,
                    loot,
                }))
            }
            ResumeOutcome::Abandoned { dropped } => {
                warn!(
                    "Closing session {}: all {} troops are gone",
                    session.id,
                    dropped.len()
                );
                session.active = false;
                self.store.save_session(&session).await?;
                Ok(None)
            }
            ResumeOutcome::Closed => Ok(None),
        }
    }

    /// Run the battle until it ends, is closed elsewhere, or the player
    /// leaves. A battle that ends here is resolved and committed.
    pub async fn run(&mut self, battle: ActiveBattle) -> Result<BattleSummary, BattleError> {
        let ActiveBattle {
            mut engine,
            mut session,
            troops,
            loot,
        } = battle;
        let poll_every = self.config.remote_poll_every;

        let writer = SnapshotWriter::spawn(Arc::clone(&self.store));
        let mut interval = tokio::time::interval(self.config.cadence.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;
        self.snapshots
            .send_replace(BattleSnapshot::capture(&engine, &session.id));

        let exit = loop {
            interval.tick().await;

            let leave = self.control.borrow().leave;
            if leave {
                info!("Left the battlefield at tick {}", engine.tick_count());
                break LoopExit::End(BattleEnd::Left);
            }
            if self.lock.is_engaged() {
                break LoopExit::End(BattleEnd::AlreadyResolving);
            }

            let report = engine.tick(&mut self.rng);
            session.record_tick(&engine);
            writer.send(WriteJob {
                progress: session.progress(),
                deltas: engine.troop_deltas(&report.changed),
            });
            self.snapshots
                .send_replace(BattleSnapshot::capture(&engine, &session.id));

            if let Some(outcome) = report.outcome {
                info!("Battle over at tick {}: {:?}", report.tick, outcome);
                break LoopExit::Finished;
            }

            if poll_every > 0 && engine.tick_count() % poll_every == 0 {
                match self.store.load_session().await {
                    Ok(Some(stored)) if stored.id != session.id || !stored.active => {
                        engine.observe_session_closed();
                        info!("Session {} was closed elsewhere", session.id);
                        self.snapshots
                            .send_replace(BattleSnapshot::capture(&engine, &session.id));
                        break LoopExit::End(BattleEnd::ClosedRemotely);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to poll session {}: {}", session.id, e),
                }
            }
        };

        // Queued tick writes must land before the resolution closes the
        // session
        writer.finish().await;

        let end = match exit {
            LoopExit::Finished => self.resolve(&engine, &mut session, &troops, &loot).await?,
            LoopExit::End(end) => end,
        };

        Ok(BattleSummary {
            session_id: session.id.clone(),
            ticks: engine.tick_count(),
            outcome: engine.outcome(),
            end,
        })
    }

    async fn resolve(
        &mut self,
        engine: &TurnEngine,
        session: &mut CombatSession,
        troops: &[Troop],
        loot: &LootTable,
    ) -> Result<BattleEnd, BattleError> {
        if !engine.resolution_required() {
            return Ok(BattleEnd::ClosedRemotely);
        }
        if !self.lock.try_acquire() {
            debug!("Resolution of session {} already under way", session.id);
            return Ok(BattleEnd::AlreadyResolving);
        }

        let plan = plan_resolution(
            engine,
            session.id.clone(),
            troops,
            loot,
            &self.config.rewards,
            &mut self.rng,
        )?;
        if plan.outcome == BattleOutcome::Defeat {
            self.control.send_modify(|s| s.auto_battle = false);
            info!("Defeat: auto-battle cancelled");
        }
        commit_resolution(&self.store, session, plan.clone(), self.config.retry).await?;
        Ok(BattleEnd::Resolved(plan))
    }

    /// Fight `mission` back to back while auto-battle stays enabled. Always
    /// runs at least one battle; stops after a defeat, when no troops are
    /// available, or after `max_battles`.
    pub async fn run_auto(
        &mut self,
        mission: &MissionParams,
        party_size: usize,
        max_battles: Option<u32>,
    ) -> Result<Vec<BattleSummary>, BattleError> {
        let mut summaries = Vec::new();
        loop {
            if max_battles.is_some_and(|max| summaries.len() as u32 >= max) {
                break;
            }
            let roster = self.store.load_troops().await?;
            let party = select_party(&roster, party_size);
            if party.is_empty() {
                info!("No troops available for {}", mission.name);
                break;
            }

            let battle = self.start_mission(mission, &party).await?;
            let summary = self.run(battle).await?;
            let finished = matches!(summary.end, BattleEnd::Resolved(_));
            summaries.push(summary);

            if !finished || !self.control().is_auto() {
                break;
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use rand::SeedableRng;
    use sellsword_combat::battle::{DropTier, LootEntry};
    use sellsword_combat::{
        BaseStats, CombatError, EnemyTemplate, Item, ItemRarity, SkillId, SkillSet,
    };
    use std::time::Duration;

    fn troop(id: &str) -> Troop {
        Troop::new(TroopId::new(id), id, BaseStats::new(100.0, 10.0, 2.0, 10.0))
    }

    fn mission(enemy: EnemyTemplate) -> MissionParams {
        MissionParams {
            id: "test_mission".into(),
            name: "Test Mission".into(),
            enemy,
            spawn_min: 1,
            spawn_max: 1,
            loot: LootTable::new(vec![LootEntry::new(
                Item::material("wolf_pelt", "Wolf Pelt", ItemRarity::Common),
                1.0,
                DropTier::Base,
            )]),
        }
    }

    fn wolf_mission() -> MissionParams {
        mission(EnemyTemplate::new("Wolf", 40, 8, 0, 8))
    }

    fn dummy_mission() -> MissionParams {
        mission(EnemyTemplate::new("Dummy", 100_000, 1, 0, 0))
    }

    fn build_runner(memory: &Arc<InMemoryStore>) -> BattleRunner {
        let store: Arc<dyn BattleStore> = memory.clone();
        let config = RunnerConfig {
            cadence: TickCadence::from_millis(1).unwrap(),
            retry: RetryPolicy {
                attempts: 3,
                backoff_ms: 1,
            },
            ..Default::default()
        };
        BattleRunner::new(store, config, StdRng::seed_from_u64(21))
    }

    #[test]
    fn test_resolution_lock_single_flight() {
        let lock = ResolutionLock::default();
        let first = SessionId::generate();
        lock.begin(&first);
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());

        // Same session: stays engaged
        lock.begin(&first);
        assert!(lock.is_engaged());

        lock.begin(&SessionId::generate());
        assert!(!lock.is_engaged());
        assert!(lock.try_acquire());
    }

    #[test]
    fn test_select_party_skips_unavailable() {
        let mut dead = troop("dead");
        dead.current_hp = Some(0);
        let roster = vec![dead, troop("a"), troop("b"), troop("c")];
        assert_eq!(
            select_party(&roster, 2),
            vec![TroopId::new("a"), TroopId::new("b")]
        );
    }

    #[tokio::test]
    async fn test_battle_runs_to_victory() {
        let memory = Arc::new(InMemoryStore::with_troops(vec![troop("t1")]));
        let mut runner = build_runner(&memory);
        let snapshots = runner.snapshots();

        let battle = runner
            .start_mission(&wolf_mission(), &[TroopId::new("t1")])
            .await
            .unwrap();
        assert!(memory.troop(&TroopId::new("t1")).unwrap().in_combat);

        let summary = runner.run(battle).await.unwrap();
        assert_eq!(summary.outcome, Some(BattleOutcome::Victory));
        assert!(matches!(summary.end, BattleEnd::Resolved(_)));

        let t1 = memory.troop(&TroopId::new("t1")).unwrap();
        assert!(!t1.in_combat);
        assert_eq!(t1.xp, 20);
        assert_eq!(t1.lore.missions_won, 1);
        assert_eq!(t1.lore.kills, 1);
        assert_eq!(t1.battle_kills, 0);

        let profile = memory.profile();
        assert_eq!(profile.gold, 15);
        assert_eq!(profile.inventory.len(), 1);

        let stored = memory.session().unwrap();
        assert!(!stored.active);
        assert!(stored.resolution.unwrap().committed);
        assert_eq!(stored.tick, summary.ticks);
        assert_eq!(stored.log.iter().filter(|l| l.contains("died!")).count(), 1);

        assert_eq!(snapshots.borrow().state, BattleState::Victory);
    }

    #[tokio::test]
    async fn test_defeat_deletes_party_and_stops_auto() {
        let mut weak = troop("weak");
        weak.base_stats = BaseStats::new(5.0, 1.0, 0.0, 1.0);
        let memory = Arc::new(InMemoryStore::with_troops(vec![weak]));
        let mut runner = build_runner(&memory);
        runner.control().set_auto(true);

        let ogres = mission(EnemyTemplate::new("Ogre", 500, 50, 10, 30));
        let summaries = runner.run_auto(&ogres, 3, Some(5)).await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].outcome, Some(BattleOutcome::Defeat));
        assert!(memory.troops().is_empty());
        assert_eq!(memory.profile().gold, 0);
        assert!(!runner.control().is_auto());
    }

    #[tokio::test]
    async fn test_auto_battle_chains_victories() {
        let memory = Arc::new(InMemoryStore::with_troops(vec![troop("a"), troop("b")]));
        let mut runner = build_runner(&memory);
        runner.control().set_auto(true);

        let rats = mission(EnemyTemplate::new("Rat", 5, 1, 0, 1));
        let summaries = runner.run_auto(&rats, 2, Some(3)).await.unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(memory.profile().gold, 45);
        assert!(memory.troops().iter().all(|t| t.lore.missions_won == 3));
    }

    #[tokio::test]
    async fn test_remote_close_stops_without_rewards() {
        let memory = Arc::new(InMemoryStore::with_troops(vec![troop("t1")]));
        let mut runner = build_runner(&memory);
        let battle = runner
            .start_mission(&dummy_mission(), &[TroopId::new("t1")])
            .await
            .unwrap();

        let closer = Arc::clone(&memory);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            closer.close_session();
        });

        let summary = runner.run(battle).await.unwrap();
        assert_eq!(summary.end, BattleEnd::ClosedRemotely);
        assert_eq!(summary.outcome, Some(BattleOutcome::Victory));
        assert_eq!(memory.profile().gold, 0);
        assert!(memory.session().unwrap().resolution.is_none());
    }

    #[tokio::test]
    async fn test_leave_keeps_session_resumable() {
        let memory = Arc::new(InMemoryStore::with_troops(vec![troop("t1")]));
        let mut runner = build_runner(&memory);
        let battle = runner
            .start_mission(&wolf_mission(), &[TroopId::new("t1")])
            .await
            .unwrap();
        runner.control().leave();

        let summary = runner.run(battle).await.unwrap();
        assert_eq!(summary.end, BattleEnd::Left);
        assert!(memory.session().unwrap().active);

        // A fresh runner picks the fight back up and finishes it
        let mut second = build_runner(&memory);
        let battle = second.resume().await.unwrap().expect("session should resume");
        let summary = second.run(battle).await.unwrap();
        assert_eq!(summary.outcome, Some(BattleOutcome::Victory));
        assert_eq!(memory.profile().gold, 15);
        assert!(!memory.session().unwrap().active);
    }

    #[tokio::test]
    async fn test_spent_charges_survive_a_reconnect() {
        let mut elf = troop("t1");
        elf.skills = SkillSet::with_row1(SkillId::ElvishMindset);
        let memory = Arc::new(InMemoryStore::with_troops(vec![elf]));
        let mut runner = build_runner(&memory);
        let tough_wolf = mission(EnemyTemplate::new("Wolf", 100_000, 8, 0, 10));
        let battle = runner
            .start_mission(&tough_wolf, &[TroopId::new("t1")])
            .await
            .unwrap();

        let control = runner.control();
        let mut snapshots = runner.snapshots();
        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                if snapshots.borrow_and_update().tick >= 25 {
                    control.leave();
                    break;
                }
            }
        });
        let summary = runner.run(battle).await.unwrap();
        assert_eq!(summary.end, BattleEnd::Left);

        let stored = memory.session().unwrap();
        assert_eq!(stored.counters.len(), 2);
        let charges = stored.counters[0].counters.mindset_charges;
        assert!(matches!(charges, Some(c) if c < 3), "charges {charges:?}");
        assert!(stored.counters[1].counters.attacks >= 2);

        let mut second = build_runner(&memory);
        let battle = second.resume().await.unwrap().expect("session should resume");
        let fighters = battle.engine.context().fighters();
        assert_eq!(fighters[0].counters, stored.counters[0].counters);
        assert_eq!(fighters[1].counters, stored.counters[1].counters);
    }

    #[tokio::test]
    async fn test_resume_abandons_orphaned_session() {
        let memory = Arc::new(InMemoryStore::with_troops(vec![troop("t1")]));
        let mut runner = build_runner(&memory);
        runner
            .start_mission(&wolf_mission(), &[TroopId::new("t1")])
            .await
            .unwrap();
        memory.delete_troop(&TroopId::new("t1")).await.unwrap();

        assert!(runner.resume().await.unwrap().is_none());
        let stored = memory.session().unwrap();
        assert!(!stored.active);
        assert!(stored.resolution.is_none());
    }

    #[tokio::test]
    async fn test_empty_selection_creates_no_session() {
        let memory = Arc::new(InMemoryStore::with_troops(vec![troop("t1")]));
        let mut runner = build_runner(&memory);
        let err = runner
            .start_mission(&wolf_mission(), &[TroopId::new("ghost")])
            .await
            .unwrap_err();
        assert!(matches!(err, BattleError::Combat(CombatError::EmptyRoster)));
        assert!(memory.session().is_none());
    }
}
