//! Committing a resolution plan
//!
//! The plan is stored on the session before anything else is written, so a
//! crash or a failed write can always be finished later by replaying the
//! same plan. Every step is idempotent: updates carry absolute values,
//! deletes ignore missing troops, and rewards are keyed by session id.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use sellsword_combat::{CombatSession, ResolutionPlan, ResolutionRecord};

use crate::error::{BattleError, StoreError};
use crate::retry::RetryPolicy;
use crate::store::BattleStore;

/// Close `session` with `plan` and write everything the plan describes
pub async fn commit_resolution(
    store: &Arc<dyn BattleStore>,
    session: &mut CombatSession,
    plan: ResolutionPlan,
    retry: RetryPolicy,
) -> Result<(), BattleError> {
    session.active = false;
    session.resolution = Some(ResolutionRecord {
        plan: plan.clone(),
        committed: false,
    });
    let pending: &CombatSession = session;
    retry
        .run("store resolution plan", || store.save_session(pending))
        .await?;

    replay_plan(store, &plan, retry).await?;
    mark_committed(store, session, retry).await
}

/// Finish the resolution left pending on the stored session, if any.
/// Returns the replayed plan.
pub async fn recover_pending_resolution(
    store: &Arc<dyn BattleStore>,
    retry: RetryPolicy,
) -> Result<Option<ResolutionPlan>, BattleError> {
    let Some(mut session) = store.load_session().await? else {
        return Ok(None);
    };
    let Some(plan) = session.pending_plan().cloned() else {
        return Ok(None);
    };
    session.active = false;

    info!("Recovering pending resolution of session {}", session.id);
    replay_plan(store, &plan, retry).await?;
    mark_committed(store, &mut session, retry).await?;
    Ok(Some(plan))
}

/// Apply every write of `plan`. Troop writes run concurrently; rewards are
/// credited afterwards whatever happened to them.
pub async fn replay_plan(
    store: &Arc<dyn BattleStore>,
    plan: &ResolutionPlan,
    retry: RetryPolicy,
) -> Result<(), BattleError> {
    let mut tasks: JoinSet<(String, Result<(), StoreError>)> = JoinSet::new();

    for update in plan.updates.iter().cloned() {
        let store = Arc::clone(store);
        tasks.spawn(async move {
            let label = format!("troop {}", update.troop_id);
            let result = retry
                .run(&label, || store.apply_troop_update(&update))
                .await;
            (label, result)
        });
    }
    for id in plan.fallen.iter().cloned() {
        let store = Arc::clone(store);
        tasks.spawn(async move {
            let label = format!("fallen troop {}", id);
            let result = retry.run(&label, || store.delete_troop(&id)).await;
            (label, result)
        });
    }

    let mut failed = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((label, Err(StoreError::NotFound(_)))) => {
                warn!("{} no longer exists, skipping its update", label);
            }
            Ok((label, Err(e))) => {
                warn!("Failed to commit {}: {}", label, e);
                failed.push(label);
            }
            Err(e) => {
                warn!("Commit task failed: {}", e);
                failed.push("commit task".to_string());
            }
        }
    }

    let credit = retry
        .run("credit rewards", || {
            store.credit_rewards(&plan.session_id, plan.gold, &plan.loot)
        })
        .await;
    match credit {
        Ok(true) => info!(
            "Credited {} gold and {} items for session {}",
            plan.gold,
            plan.loot.len(),
            plan.session_id
        ),
        Ok(false) => info!("Rewards for session {} were already credited", plan.session_id),
        Err(e) => {
            warn!("Failed to credit rewards: {}", e);
            failed.push("rewards".to_string());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(BattleError::RewardCommit { failed })
    }
}

async fn mark_committed(
    store: &Arc<dyn BattleStore>,
    session: &mut CombatSession,
    retry: RetryPolicy,
) -> Result<(), BattleError> {
    if let Some(record) = session.resolution.as_mut() {
        record.committed = true;
    }
    let done: &CombatSession = session;
    retry
        .run("mark resolution committed", || store.save_session(done))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, StoreOp};
    use sellsword_combat::{BaseStats, BattleOutcome, Item, ItemRarity, Lore, Troop, TroopUpdate};
    use sellsword_core::TroopId;

    fn troop(id: &str) -> Troop {
        let mut t = Troop::new(TroopId::new(id), id, BaseStats::new(100.0, 10.0, 2.0, 10.0));
        t.in_combat = true;
        t
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff_ms: 1,
        }
    }

    fn setup() -> (Arc<InMemoryStore>, CombatSession, ResolutionPlan) {
        let store = Arc::new(InMemoryStore::with_troops(vec![troop("a"), troop("b")]));
        let session = CombatSession::new(vec![TroopId::new("a"), TroopId::new("b")], Vec::new());
        let plan = ResolutionPlan {
            session_id: session.id.clone(),
            outcome: BattleOutcome::Victory,
            updates: vec![TroopUpdate {
                troop_id: TroopId::new("a"),
                current_hp: 64,
                level: 1,
                xp: 20,
                lore: Lore {
                    missions_won: 1,
                    kills: 1,
                    close_calls: 0,
                },
                leveled_up: false,
            }],
            fallen: vec![TroopId::new("b")],
            loot: vec![Item::material("wolf_pelt", "Wolf Pelt", ItemRarity::Common)],
            gold: 15,
        };
        (store, session, plan)
    }

    #[tokio::test]
    async fn test_commit_applies_plan() {
        let (memory, mut session, plan) = setup();
        let store: Arc<dyn BattleStore> = memory.clone();
        commit_resolution(&store, &mut session, plan, fast_retry())
            .await
            .unwrap();

        let a = memory.troop(&TroopId::new("a")).unwrap();
        assert_eq!(a.current_hp, Some(64));
        assert_eq!(a.xp, 20);
        assert!(!a.in_combat);
        assert!(memory.troop(&TroopId::new("b")).is_none());
        assert_eq!(memory.profile().gold, 15);

        let stored = memory.session().unwrap();
        assert!(!stored.active);
        assert!(stored.resolution.unwrap().committed);
    }

    #[tokio::test]
    async fn test_rerun_credits_gold_once() {
        let (memory, mut session, plan) = setup();
        let store: Arc<dyn BattleStore> = memory.clone();
        commit_resolution(&store, &mut session, plan.clone(), fast_retry())
            .await
            .unwrap();
        replay_plan(&store, &plan, fast_retry()).await.unwrap();
        commit_resolution(&store, &mut session, plan, fast_retry())
            .await
            .unwrap();
        assert_eq!(memory.profile().gold, 15);
        assert_eq!(memory.profile().inventory.len(), 1);
        assert_eq!(memory.calls(StoreOp::CreditRewards), 3);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (memory, mut session, plan) = setup();
        memory.fail_times(StoreOp::ApplyUpdate, 2);
        let store: Arc<dyn BattleStore> = memory.clone();
        commit_resolution(&store, &mut session, plan, RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(memory.calls(StoreOp::ApplyUpdate), 3);
        assert_eq!(memory.troop(&TroopId::new("a")).unwrap().xp, 20);
    }

    #[tokio::test]
    async fn test_persistent_failure_leaves_plan_pending() {
        let (memory, mut session, plan) = setup();
        memory.fail_always(StoreOp::ApplyUpdate);
        let store: Arc<dyn BattleStore> = memory.clone();
        let err = commit_resolution(&store, &mut session, plan.clone(), fast_retry())
            .await
            .unwrap_err();
        match err {
            BattleError::RewardCommit { failed } => assert_eq!(failed, vec!["troop a".to_string()]),
            other => panic!("unexpected {other:?}"),
        }
        // Deletes and rewards still went through
        assert!(memory.troop(&TroopId::new("b")).is_none());
        assert_eq!(memory.profile().gold, 15);

        let stored = memory.session().unwrap();
        assert!(stored.needs_recovery());
        assert_eq!(stored.pending_plan(), Some(&plan));

        memory.clear_failures();
        let recovered = recover_pending_resolution(&store, fast_retry())
            .await
            .unwrap();
        assert_eq!(recovered, Some(plan));
        assert_eq!(memory.troop(&TroopId::new("a")).unwrap().xp, 20);
        assert_eq!(memory.profile().gold, 15);
        assert!(!memory.session().unwrap().needs_recovery());
    }

    #[tokio::test]
    async fn test_nothing_to_recover() {
        let memory = Arc::new(InMemoryStore::new());
        let store: Arc<dyn BattleStore> = memory.clone();
        assert_eq!(recover_pending_resolution(&store, fast_retry()).await.unwrap(), None);

        memory
            .save_session(&CombatSession::new(vec![TroopId::new("a")], Vec::new()))
            .await
            .unwrap();
        assert_eq!(recover_pending_resolution(&store, fast_retry()).await.unwrap(), None);
    }
}
