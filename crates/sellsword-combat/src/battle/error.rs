use thiserror::Error;

use super::engine::BattleState;

/// Errors raised by the pure combat layer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("No available troops to send into battle")]
    EmptyRoster,

    #[error("Mission has no living enemies")]
    NoEnemies,

    #[error("Invalid battle transition from {from:?} to {to:?}")]
    InvalidTransition { from: BattleState, to: BattleState },

    #[error("Battle has not ended yet")]
    BattleNotOver,
}
