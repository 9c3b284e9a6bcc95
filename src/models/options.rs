//! Tournament options: validated heat size, number of plays and ranking statistic.
//!
//! Each option is a value type whose constructor enforces its allowed range or set,
//! so a `TournamentOptions` that exists is always valid.

use crate::models::tournament::TournamentError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Check that `value` lies in `valid`, naming the option in the error.
pub fn check_range(
    option: &'static str,
    value: i64,
    valid: RangeInclusive<i64>,
) -> Result<i64, TournamentError> {
    if valid.contains(&value) {
        Ok(value)
    } else {
        Err(TournamentError::InvalidOption {
            option,
            reason: format!(
                "{} is outside {}..={}",
                value,
                valid.start(),
                valid.end()
            ),
        })
    }
}

/// Parse an untyped (form) value as an integer option.
pub fn parse_int(option: &'static str, raw: &str) -> Result<i64, TournamentError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| TournamentError::InvalidOption {
            option,
            reason: format!("expected an integer, got {:?}", raw),
        })
}

/// Number of players racing at once in a heat (1-9).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PlayersPerRound(u8);

impl PlayersPerRound {
    pub const NAME: &'static str = "players_per_round";
    pub const VALID: RangeInclusive<i64> = 1..=9;

    pub fn new(value: i64) -> Result<Self, TournamentError> {
        check_range(Self::NAME, value, Self::VALID).map(|v| Self(v as u8))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for PlayersPerRound {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<i64> for PlayersPerRound {
    type Error = TournamentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayersPerRound> for i64 {
    fn from(value: PlayersPerRound) -> Self {
        value.0 as i64
    }
}

/// Number of full passes through the roster (1-99).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct NumberOfPlays(u8);

impl NumberOfPlays {
    pub const NAME: &'static str = "number_of_plays";
    pub const VALID: RangeInclusive<i64> = 1..=99;

    pub fn new(value: i64) -> Result<Self, TournamentError> {
        check_range(Self::NAME, value, Self::VALID).map(|v| Self(v as u8))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for NumberOfPlays {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<i64> for NumberOfPlays {
    type Error = TournamentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NumberOfPlays> for i64 {
    fn from(value: NumberOfPlays) -> Self {
        value.0 as i64
    }
}

/// Statistic used to order the ratings table.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankStat {
    #[default]
    Min,
    Max,
    Mean,
    Median,
    Std,
    Size,
}

impl RankStat {
    pub const NAME: &'static str = "rank_stat";
    pub const ALL: [RankStat; 6] = [
        RankStat::Min,
        RankStat::Max,
        RankStat::Mean,
        RankStat::Median,
        RankStat::Std,
        RankStat::Size,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RankStat::Min => "min",
            RankStat::Max => "max",
            RankStat::Mean => "mean",
            RankStat::Median => "median",
            RankStat::Std => "std",
            RankStat::Size => "size",
        }
    }
}

impl fmt::Display for RankStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankStat {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RankStat::ALL
            .into_iter()
            .find(|stat| stat.as_str() == s)
            .ok_or_else(|| TournamentError::InvalidOption {
                option: Self::NAME,
                reason: format!(
                    "{:?} is not one of {}",
                    s,
                    RankStat::ALL.map(RankStat::as_str).join(", ")
                ),
            })
    }
}

/// Options accepted by a tournament at construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentOptions {
    #[serde(default)]
    pub players_per_round: PlayersPerRound,
    #[serde(default)]
    pub number_of_plays: NumberOfPlays,
    #[serde(default)]
    pub rank_stat: RankStat,
}

impl TournamentOptions {
    /// Build options from raw integers and a statistic name, validating each.
    pub fn new(
        players_per_round: i64,
        number_of_plays: i64,
        rank_stat: &str,
    ) -> Result<Self, TournamentError> {
        Ok(Self {
            players_per_round: PlayersPerRound::new(players_per_round)?,
            number_of_plays: NumberOfPlays::new(number_of_plays)?,
            rank_stat: rank_stat.parse()?,
        })
    }

    /// Build options from untyped key/value pairs (e.g. submitted form fields).
    ///
    /// Keys that are not options are ignored; missing options keep their defaults.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, TournamentError> {
        let mut options = Self::default();
        if let Some(raw) = fields.get(PlayersPerRound::NAME) {
            options.players_per_round =
                PlayersPerRound::new(parse_int(PlayersPerRound::NAME, raw)?)?;
        }
        if let Some(raw) = fields.get(NumberOfPlays::NAME) {
            options.number_of_plays = NumberOfPlays::new(parse_int(NumberOfPlays::NAME, raw)?)?;
        }
        if let Some(raw) = fields.get(RankStat::NAME) {
            options.rank_stat = raw.parse()?;
        }
        Ok(options)
    }
}
