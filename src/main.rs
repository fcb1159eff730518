//! Sellsword - headless skirmish runner
//!
//! Loads settings, opens the configured store, finishes any resolution a
//! previous run left pending, then resumes the active battle or launches the
//! configured mission and prints the battle log as it happens.

mod save;
mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sellsword_combat::{find_mission, generate_recruit};
use sellsword_integration::{
    select_party, BattleEnd, BattleRunner, BattleSnapshot, BattleStore, BattleSummary,
    DocumentStore, InMemoryStore,
};

use save::FileStore;
use settings::{Settings, StoreBackend};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting Sellsword...");

    let settings = Settings::load();
    let store = open_store(&settings)?;

    let mut rng = match settings.battle.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let runner_rng = StdRng::seed_from_u64(rng.gen());
    let mut runner = BattleRunner::new(Arc::clone(&store), settings.runner_config(), runner_rng);

    if let Some(plan) = runner
        .recover_pending_resolution()
        .await
        .context("Failed to recover pending resolution")?
    {
        info!("Recovered {:?} of session {}", plan.outcome, plan.session_id);
    }

    let control = runner.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Leaving the battlefield...");
            control.leave();
        }
    });
    let printer = tokio::spawn(print_battle_log(runner.snapshots()));

    let summaries = if let Some(battle) = runner.resume().await.context("Failed to resume")? {
        info!("Resuming session {} at tick {}", battle.session.id, battle.session.tick);
        vec![runner.run(battle).await?]
    } else {
        seed_roster(store.as_ref(), &settings, &mut rng).await?;

        let mission = find_mission(&settings.battle.mission_id)
            .with_context(|| format!("Unknown mission '{}'", settings.battle.mission_id))?;

        if settings.battle.auto_battle {
            runner.control().set_auto(true);
            runner
                .run_auto(&mission, settings.battle.party_size, settings.battle.max_battles)
                .await?
        } else {
            let roster = store.load_troops().await.context("Failed to load roster")?;
            let party = select_party(&roster, settings.battle.party_size);
            let battle = runner.start_mission(&mission, &party).await?;
            vec![runner.run(battle).await?]
        }
    };

    drop(runner);
    if let Err(e) = printer.await {
        warn!("Log printer failed: {}", e);
    }

    for summary in &summaries {
        report(summary);
    }
    match store.load_gold().await {
        Ok(gold) => info!("Company purse: {} gold", gold),
        Err(e) => warn!("Failed to read the purse: {}", e),
    }

    Ok(())
}

fn open_store(settings: &Settings) -> Result<Arc<dyn BattleStore>> {
    let store: Arc<dyn BattleStore> = match settings.store.backend {
        StoreBackend::File => {
            let store = FileStore::open_default()?;
            info!("Using save directory {:?}", store.dir());
            Arc::new(store)
        }
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::Remote => {
            let config = settings.store.document_config();
            info!("Using document store at {}", config.base_url);
            Arc::new(DocumentStore::new(config).context("Failed to build document store")?)
        }
    };
    Ok(store)
}

/// Hire recruits when the company has no living troops
async fn seed_roster(store: &dyn BattleStore, settings: &Settings, rng: &mut StdRng) -> Result<()> {
    let roster = store.load_troops().await.context("Failed to load roster")?;
    if roster.iter().any(|t| t.is_alive()) {
        return Ok(());
    }

    for _ in 0..settings.battle.starting_recruits.max(1) {
        let recruit = generate_recruit(rng);
        info!("Recruited {}", recruit.display_name());
        store
            .save_troop(&recruit)
            .await
            .context("Failed to save recruit")?;
    }
    Ok(())
}

/// Print log lines as snapshots arrive until the runner goes away
async fn print_battle_log(mut snapshots: watch::Receiver<BattleSnapshot>) {
    let mut shown: Vec<String> = Vec::new();
    let mut session = None;
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.session_id != session {
            session = snapshot.session_id.clone();
            shown.clear();
        }
        for line in fresh_lines(&shown, &snapshot.log) {
            println!("[{:>4}] {}", snapshot.tick, line);
        }
        shown = snapshot.log;
    }
}

/// Lines of `next` not yet in `shown`. `next` is `shown` with old lines
/// dropped from the front and new ones appended.
fn fresh_lines<'a>(shown: &[String], next: &'a [String]) -> &'a [String] {
    for dropped in 0..=shown.len() {
        let kept = &shown[dropped..];
        if next.starts_with(kept) {
            return &next[kept.len()..];
        }
    }
    next
}

fn report(summary: &BattleSummary) {
    match &summary.end {
        BattleEnd::Resolved(plan) => info!(
            "Session {} ended in {:?} after {} ticks: {} survivors, {} fallen, {} gold, {} drops",
            summary.session_id,
            plan.outcome,
            summary.ticks,
            plan.updates.len(),
            plan.fallen.len(),
            plan.gold,
            plan.loot.len()
        ),
        BattleEnd::ClosedRemotely => info!(
            "Session {} was finished elsewhere at tick {}",
            summary.session_id, summary.ticks
        ),
        BattleEnd::AlreadyResolving => info!(
            "Session {} is already being resolved",
            summary.session_id
        ),
        BattleEnd::Left => info!(
            "Left session {} at tick {}; run again to resume",
            summary.session_id, summary.ticks
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fresh_lines_appended() {
        let shown = lines(&["a", "b"]);
        let next = lines(&["a", "b", "c"]);
        assert_eq!(fresh_lines(&shown, &next), &lines(&["c"])[..]);
    }

    #[test]
    fn test_fresh_lines_with_full_window() {
        let shown = lines(&["a", "b", "c"]);
        let next = lines(&["c", "d", "e"]);
        assert_eq!(fresh_lines(&shown, &next), &lines(&["d", "e"])[..]);
    }

    #[test]
    fn test_fresh_lines_unrelated() {
        let next = lines(&["x"]);
        assert_eq!(fresh_lines(&lines(&["a"]), &next), &next[..]);
        assert!(fresh_lines(&next, &next).is_empty());
    }
}
