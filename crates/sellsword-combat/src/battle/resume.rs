//! Resuming a persisted battle after a reconnect

use tracing::{debug, info};

use sellsword_core::TroopId;

use super::context::CombatContext;
use super::engine::TurnEngine;
use super::log::BattleLog;
use super::session::CombatSession;
use crate::roster::troop::Troop;

/// Result of trying to pick up a stored session
#[derive(Debug)]
pub enum ResumeOutcome {
    /// The battle continues where it stopped
    Resumed {
        engine: TurnEngine,
        /// Records of the troops that are still around, in session order
        troops: Vec<Troop>,
        /// Listed troops whose records no longer exist
        dropped: Vec<TroopId>,
    },
    /// None of the listed troops exist anymore. The caller closes the
    /// session without rewards.
    Abandoned { dropped: Vec<TroopId> },
    /// The session is not active
    Closed,
}

/// Rebuild the engine for an active session.
///
/// Fighters resume with their persisted HP and gauge. Counters and skill
/// charges come from the session record, so charges spent before the
/// reconnect stay spent; troops missing from it keep the counters on their
/// own records.
pub fn resume(session: &CombatSession, roster: &[Troop], log_capacity: usize) -> ResumeOutcome {
    if !session.active {
        return ResumeOutcome::Closed;
    }

    let mut troops = Vec::new();
    let mut dropped = Vec::new();
    for id in &session.troop_ids {
        if troops.iter().any(|t: &Troop| &t.id == id) {
            continue;
        }
        match roster.iter().find(|t| &t.id == id) {
            Some(troop) => troops.push(troop.clone()),
            None => {
                debug!("Troop {} no longer exists, dropping from session {}", id, session.id);
                dropped.push(id.clone());
            }
        }
    }

    if troops.is_empty() {
        info!("Abandoning session {}: no listed troops remain", session.id);
        return ResumeOutcome::Abandoned { dropped };
    }

    let mut context = CombatContext::new(&troops, &session.enemies);
    let restored = context.restore_counters(&session.counters);
    debug!("Restored counters for {} fighters", restored);
    let log = BattleLog::from_lines(session.log.iter().cloned(), log_capacity);
    let mut engine = TurnEngine::new(context, log, session.tick);
    if let Err(e) = engine.start() {
        // A fresh engine is always idle
        debug!("Resume start failed: {}", e);
    }

    info!(
        "Resumed session {} at tick {} with {} troops and {} enemies",
        session.id,
        session.tick,
        troops.len(),
        session.enemies.len()
    );
    ResumeOutcome::Resumed {
        engine,
        troops,
        dropped,
    }
}
