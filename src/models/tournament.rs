//! Tournament (the type-tagged wrapper over concrete formats) and TournamentError.

use crate::logic::{self, Ratings};
use crate::models::limited_round::LimitedRound;
use crate::models::options::TournamentOptions;
use crate::models::race::{PlayerId, RaceRecord};
use serde::{Deserialize, Serialize};

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// An option value is outside its declared type, range or set.
    InvalidOption { option: &'static str, reason: String },
    /// The player list is empty.
    NoPlayers,
    /// The same player id appears twice in the roster.
    DuplicatePlayer(PlayerId),
    /// No schedule without a player racing themselves was found within the retry budget.
    NoValidSchedule { attempts: u32 },
    /// A loaded schedule violates one of the schedule invariants.
    InvalidSchedule(String),
    /// No tournament type is registered under this tag.
    UnknownTournamentType(String),
    /// The player has no record without a time.
    NoPendingEntries(PlayerId),
    /// The player is not on the roster.
    PlayerNotFound(PlayerId),
    /// The player has no record in this round.
    NoSuchEntry { player: PlayerId, round: u32 },
    /// Times must be finite numbers.
    InvalidTime,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidOption { option, reason } => {
                write!(f, "Invalid value for {}: {}", option, reason)
            }
            TournamentError::NoPlayers => write!(f, "A tournament needs at least one player"),
            TournamentError::DuplicatePlayer(p) => {
                write!(f, "Player {} is listed more than once", p)
            }
            TournamentError::NoValidSchedule { attempts } => write!(
                f,
                "After {} tries no schedule was found in which no player races against themselves",
                attempts
            ),
            TournamentError::InvalidSchedule(reason) => write!(f, "Invalid schedule: {}", reason),
            TournamentError::UnknownTournamentType(tag) => {
                write!(f, "Unknown tournament type {}", tag)
            }
            TournamentError::NoPendingEntries(p) => {
                write!(f, "Player {} has no un-entered times", p)
            }
            TournamentError::PlayerNotFound(p) => {
                write!(f, "Player {} is not in this tournament", p)
            }
            TournamentError::NoSuchEntry { player, round } => {
                write!(f, "Player {} has no entry in round {}", player, round)
            }
            TournamentError::InvalidTime => write!(f, "Times must be finite numbers"),
        }
    }
}

impl std::error::Error for TournamentError {}

/// A tournament of any registered type. The tag is persisted as `"type"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Tournament {
    LimitedRound(LimitedRound),
}

impl Tournament {
    /// Tag this tournament type is registered under.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Tournament::LimitedRound(_) => LimitedRound::TYPE_TAG,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tournament::LimitedRound(t) => t.name(),
        }
    }

    pub fn players(&self) -> &[PlayerId] {
        match self {
            Tournament::LimitedRound(t) => t.players(),
        }
    }

    pub fn options(&self) -> TournamentOptions {
        match self {
            Tournament::LimitedRound(t) => t.options(),
        }
    }

    pub fn schedule(&self) -> &[RaceRecord] {
        match self {
            Tournament::LimitedRound(t) => t.schedule(),
        }
    }

    pub fn get_next_matchups(&self, n: usize) -> Vec<Vec<PlayerId>> {
        match self {
            Tournament::LimitedRound(t) => logic::get_next_matchups(t, n),
        }
    }

    pub fn set_time(
        &mut self,
        player: &str,
        time: f64,
        round: Option<u32>,
    ) -> Result<u32, TournamentError> {
        match self {
            Tournament::LimitedRound(t) => logic::set_time(t, player, time, round),
        }
    }

    pub fn undo(&mut self, n: usize) -> usize {
        match self {
            Tournament::LimitedRound(t) => logic::undo(t, n),
        }
    }

    /// Index of the first heat that still has a missing time.
    pub fn heat(&self) -> usize {
        match self {
            Tournament::LimitedRound(t) => logic::current_heat(t),
        }
    }

    pub fn total_heats(&self) -> usize {
        match self {
            Tournament::LimitedRound(t) => t.total_heats(),
        }
    }

    pub fn get_ratings(&self) -> Ratings {
        match self {
            Tournament::LimitedRound(t) => logic::get_ratings(t),
        }
    }
}

impl From<LimitedRound> for Tournament {
    fn from(t: LimitedRound) -> Self {
        Tournament::LimitedRound(t)
    }
}
