//! LimitedRound: every player races a fixed number of times in randomized heats.

use crate::logic::{check_schedule, generate_schedule};
use crate::models::options::{NumberOfPlays, PlayersPerRound, RankStat, TournamentOptions};
use crate::models::race::{PlayerId, RaceRecord};
use crate::models::tournament::TournamentError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Lookup tables derived from the schedule. Rebuilt whenever the schedule is replaced.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ScheduleIndex {
    /// Heat index -> positions of its records (contiguous).
    pub heats: Vec<Range<usize>>,
    /// (player, round) -> position of the unique record.
    pub by_player_round: HashMap<(PlayerId, u32), usize>,
    /// Player -> positions of their records, in round order.
    pub by_player: HashMap<PlayerId, Vec<usize>>,
}

impl ScheduleIndex {
    fn build(schedule: &[RaceRecord]) -> Self {
        let mut index = Self::default();
        for (pos, record) in schedule.iter().enumerate() {
            let same_heat = pos > 0 && schedule[pos - 1].heat == record.heat;
            match index.heats.last_mut() {
                Some(range) if same_heat => range.end = pos + 1,
                _ => index.heats.push(pos..pos + 1),
            }
            index
                .by_player_round
                .insert((record.player.clone(), record.round), pos);
            index
                .by_player
                .entry(record.player.clone())
                .or_default()
                .push(pos);
        }
        for positions in index.by_player.values_mut() {
            positions.sort_by_key(|&pos| schedule[pos].round);
        }
        index
    }
}

/// A tournament where each player races `number_of_plays` times, `players_per_round` at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SavedLimitedRound", into = "SavedLimitedRound")]
pub struct LimitedRound {
    pub(crate) name: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) players: Vec<PlayerId>,
    pub(crate) options: TournamentOptions,
    pub(crate) schedule: Vec<RaceRecord>,
    pub(crate) index: ScheduleIndex,
}

impl LimitedRound {
    pub const TYPE_TAG: &'static str = "LimitedRound";

    /// Create a tournament with a freshly generated, self-match-free schedule.
    pub fn new(
        name: impl Into<String>,
        players: Vec<PlayerId>,
        options: TournamentOptions,
    ) -> Result<Self, TournamentError> {
        Self::with_rng(name, players, options, &mut rand::thread_rng())
    }

    /// Like [`LimitedRound::new`], drawing the shuffles from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        name: impl Into<String>,
        players: Vec<PlayerId>,
        options: TournamentOptions,
        rng: &mut R,
    ) -> Result<Self, TournamentError> {
        validate_players(&players)?;
        let schedule = generate_schedule(
            &players,
            options.players_per_round,
            options.number_of_plays,
            rng,
        )?;
        Ok(Self::from_parts(name.into(), Utc::now(), players, options, schedule))
    }

    fn from_parts(
        name: String,
        created_at: DateTime<Utc>,
        players: Vec<PlayerId>,
        options: TournamentOptions,
        schedule: Vec<RaceRecord>,
    ) -> Self {
        let index = ScheduleIndex::build(&schedule);
        Self {
            name,
            created_at,
            players,
            options,
            schedule,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn options(&self) -> TournamentOptions {
        self.options
    }

    pub fn players_per_round(&self) -> usize {
        self.options.players_per_round.get()
    }

    pub fn number_of_plays(&self) -> usize {
        self.options.number_of_plays.get()
    }

    pub fn rank_stat(&self) -> RankStat {
        self.options.rank_stat
    }

    /// Full schedule in construction order.
    pub fn schedule(&self) -> &[RaceRecord] {
        &self.schedule
    }

    /// Records of one round, in schedule order.
    pub fn round_records(&self, round: u32) -> Vec<&RaceRecord> {
        self.schedule.iter().filter(|r| r.round == round).collect()
    }

    /// Records of one player, in round order.
    pub fn player_records(&self, player: &str) -> Vec<&RaceRecord> {
        self.index
            .by_player
            .get(player)
            .map(|positions| positions.iter().map(|&pos| &self.schedule[pos]).collect())
            .unwrap_or_default()
    }

    /// Records of one heat, in schedule order.
    pub fn heat_records(&self, heat: usize) -> &[RaceRecord] {
        self.index
            .heats
            .get(heat)
            .map(|range| &self.schedule[range.clone()])
            .unwrap_or(&[])
    }

    /// Number of heats in the schedule.
    pub fn total_heats(&self) -> usize {
        self.index.heats.len()
    }
}

/// Players must be a non-empty list of unique ids.
pub fn validate_players(players: &[PlayerId]) -> Result<(), TournamentError> {
    if players.is_empty() {
        return Err(TournamentError::NoPlayers);
    }
    let mut seen = HashSet::with_capacity(players.len());
    for p in players {
        if !seen.insert(p.as_str()) {
            return Err(TournamentError::DuplicatePlayer(p.clone()));
        }
    }
    Ok(())
}

/// On-disk shape of a LimitedRound: options flattened, no derived indices.
#[derive(Serialize, Deserialize)]
struct SavedLimitedRound {
    name: String,
    created_at: DateTime<Utc>,
    players: Vec<PlayerId>,
    players_per_round: PlayersPerRound,
    number_of_plays: NumberOfPlays,
    rank_stat: RankStat,
    schedule: Vec<RaceRecord>,
}

impl From<LimitedRound> for SavedLimitedRound {
    fn from(t: LimitedRound) -> Self {
        Self {
            name: t.name,
            created_at: t.created_at,
            players: t.players,
            players_per_round: t.options.players_per_round,
            number_of_plays: t.options.number_of_plays,
            rank_stat: t.options.rank_stat,
            schedule: t.schedule,
        }
    }
}

impl TryFrom<SavedLimitedRound> for LimitedRound {
    type Error = TournamentError;

    fn try_from(saved: SavedLimitedRound) -> Result<Self, Self::Error> {
        let options = TournamentOptions {
            players_per_round: saved.players_per_round,
            number_of_plays: saved.number_of_plays,
            rank_stat: saved.rank_stat,
        };
        validate_players(&saved.players)?;
        check_schedule(&saved.players, &options, &saved.schedule)?;
        Ok(Self::from_parts(
            saved.name,
            saved.created_at,
            saved.players,
            options,
            saved.schedule,
        ))
    }
}
