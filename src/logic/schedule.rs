//! Schedule generation: shuffled passes through the roster, cut into heats.

use crate::models::{
    NumberOfPlays, PlayerId, PlayersPerRound, RaceRecord, TournamentError, TournamentOptions,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Maximum number of shuffles tried before giving up on a configuration.
pub const MAX_SCHEDULE_ATTEMPTS: u32 = 100;

/// Generate a schedule in which no heat contains the same player twice.
///
/// 1. Shuffle the roster once per play and concatenate the passes.
/// 2. Position `i` gets `round = i / players.len()` and `heat = i / players_per_round`.
/// 3. If any heat repeats a player, throw the attempt away and start over.
///
/// Fails with `NoValidSchedule` after [`MAX_SCHEDULE_ATTEMPTS`] rejected attempts.
pub fn generate_schedule<R: Rng + ?Sized>(
    players: &[PlayerId],
    players_per_round: PlayersPerRound,
    number_of_plays: NumberOfPlays,
    rng: &mut R,
) -> Result<Vec<RaceRecord>, TournamentError> {
    if players.is_empty() {
        return Err(TournamentError::NoPlayers);
    }
    for attempt in 1..=MAX_SCHEDULE_ATTEMPTS {
        let schedule = shuffled_schedule(players, players_per_round, number_of_plays, rng);
        match first_repeated_heat(&schedule, players_per_round) {
            None => {
                log::debug!(
                    "Generated {} race records for {} players on attempt {}",
                    schedule.len(),
                    players.len(),
                    attempt
                );
                return Ok(schedule);
            }
            Some(heat) => log::debug!(
                "Attempt {}: heat {} has a player racing themselves, reshuffling",
                attempt,
                heat
            ),
        }
    }
    log::warn!(
        "No self-match-free schedule for {} players, {} per heat, {} plays",
        players.len(),
        players_per_round.get(),
        number_of_plays.get()
    );
    Err(TournamentError::NoValidSchedule {
        attempts: MAX_SCHEDULE_ATTEMPTS,
    })
}

fn shuffled_schedule<R: Rng + ?Sized>(
    players: &[PlayerId],
    players_per_round: PlayersPerRound,
    number_of_plays: NumberOfPlays,
    rng: &mut R,
) -> Vec<RaceRecord> {
    let roster = players.len();
    let per_heat = players_per_round.get();
    let mut order: Vec<&PlayerId> = Vec::with_capacity(roster * number_of_plays.get());
    for _ in 0..number_of_plays.get() {
        let mut pass: Vec<&PlayerId> = players.iter().collect();
        pass.shuffle(rng);
        order.extend(pass);
    }
    order
        .into_iter()
        .enumerate()
        .map(|(i, player)| {
            RaceRecord::new(player.clone(), (i / roster) as u32, (i / per_heat) as u32)
        })
        .collect()
}

/// Index of the first heat that contains a player more than once.
fn first_repeated_heat(
    schedule: &[RaceRecord],
    players_per_round: PlayersPerRound,
) -> Option<usize> {
    schedule
        .chunks(players_per_round.get())
        .position(|heat| {
            let mut seen = HashSet::with_capacity(heat.len());
            heat.iter().any(|r| !seen.insert(r.player.as_str()))
        })
}

/// Verify a schedule (e.g. one read back from disk) satisfies every schedule invariant.
pub fn check_schedule(
    players: &[PlayerId],
    options: &TournamentOptions,
    schedule: &[RaceRecord],
) -> Result<(), TournamentError> {
    let invalid = |reason: String| Err(TournamentError::InvalidSchedule(reason));
    let roster = players.len();
    let per_heat = options.players_per_round.get();
    let plays = options.number_of_plays.get();

    if schedule.len() != roster * plays {
        return invalid(format!(
            "expected {} records, found {}",
            roster * plays,
            schedule.len()
        ));
    }

    let known: HashSet<&str> = players.iter().map(String::as_str).collect();
    let mut seen_in_round: HashSet<(&str, u32)> = HashSet::with_capacity(schedule.len());
    let mut counts: HashMap<&str, usize> = HashMap::with_capacity(roster);
    for (pos, record) in schedule.iter().enumerate() {
        if !known.contains(record.player.as_str()) {
            return invalid(format!("record {} names unknown player {}", pos, record.player));
        }
        if record.round as usize != pos / roster || record.heat as usize != pos / per_heat {
            return invalid(format!(
                "record {} has round {} heat {}, expected round {} heat {}",
                pos,
                record.round,
                record.heat,
                pos / roster,
                pos / per_heat
            ));
        }
        if !seen_in_round.insert((record.player.as_str(), record.round)) {
            return invalid(format!(
                "player {} appears twice in round {}",
                record.player, record.round
            ));
        }
        if record.time.is_some_and(|t| !t.is_finite()) {
            return invalid(format!("record {} has a non-finite time", pos));
        }
        *counts.entry(record.player.as_str()).or_default() += 1;
    }
    if let Some(p) = players.iter().find(|p| counts.get(p.as_str()) != Some(&plays)) {
        return invalid(format!("player {} does not race {} times", p, plays));
    }
    if let Some(heat) = first_repeated_heat(schedule, options.players_per_round) {
        return invalid(format!("heat {} has a player racing themselves", heat));
    }
    Ok(())
}
