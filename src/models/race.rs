//! A single race record: one player's slot in one round and heat.

use serde::{Deserialize, Serialize};

/// Identifier for a player (their display name; unique within a tournament).
pub type PlayerId = String;

/// One entry of the schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub player: PlayerId,
    /// Full pass through the roster this record belongs to.
    pub round: u32,
    /// Group of players racing at the same time.
    pub heat: u32,
    /// None until a time is entered.
    pub time: Option<f64>,
}

impl RaceRecord {
    pub fn new(player: impl Into<PlayerId>, round: u32, heat: u32) -> Self {
        Self {
            player: player.into(),
            round,
            heat,
            time: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.time.is_none()
    }
}
