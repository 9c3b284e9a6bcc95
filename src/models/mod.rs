//! Data structures for the tournament: options, race records, tournament formats.

mod limited_round;
mod options;
mod race;
mod tournament;

pub use limited_round::{validate_players, LimitedRound};
pub use options::{
    check_range, parse_int, NumberOfPlays, PlayersPerRound, RankStat, TournamentOptions,
};
pub use race::{PlayerId, RaceRecord};
pub use tournament::{Tournament, TournamentError};
