//! Battle events and the bounded battle log

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of log lines kept per session
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    Attack {
        attacker: String,
        target: String,
        damage: i32,
        empowered: bool,
    },
    Blocked {
        attacker: String,
        target: String,
    },
    Healed {
        name: String,
        amount: i32,
    },
    Died {
        name: String,
    },
    Ended {
        outcome: BattleOutcome,
    },
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEvent::Attack {
                attacker,
                target,
                damage,
                empowered,
            } => {
                write!(f, "{attacker} hits {target} for {damage} damage")?;
                if *empowered {
                    f.write_str(" (concentrated)")?;
                }
                f.write_str(".")
            }
            BattleEvent::Blocked { attacker, target } => {
                write!(f, "{target} blocked {attacker}'s attack!")
            }
            BattleEvent::Healed { name, amount } => write!(f, "{name} recovers {amount} HP."),
            BattleEvent::Died { name } => write!(f, "{name} died!"),
            BattleEvent::Ended {
                outcome: BattleOutcome::Victory,
            } => f.write_str("Victory! The field is yours."),
            BattleEvent::Ended {
                outcome: BattleOutcome::Defeat,
            } => f.write_str("Defeat. Your company has fallen."),
        }
    }
}

/// The last `capacity` log lines, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct BattleLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for BattleLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild from persisted lines, keeping the newest
    pub fn from_lines(lines: impl IntoIterator<Item = String>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for line in lines {
            log.push(line);
        }
        log
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn record(&mut self, event: &BattleEvent) {
        self.push(event.to_string());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}
