//! Match tracking: upcoming heats, time entry and undo.

use crate::models::{LimitedRound, PlayerId, TournamentError};

fn heat_is_complete(tournament: &LimitedRound, heat: usize) -> bool {
    tournament
        .heat_records(heat)
        .iter()
        .all(|r| !r.is_pending())
}

/// Player lists of the next `n` heats that still have a missing time, in heat order.
pub fn get_next_matchups(tournament: &LimitedRound, n: usize) -> Vec<Vec<PlayerId>> {
    (0..tournament.total_heats())
        .filter(|&heat| !heat_is_complete(tournament, heat))
        .take(n)
        .map(|heat| {
            tournament
                .heat_records(heat)
                .iter()
                .map(|r| r.player.clone())
                .collect()
        })
        .collect()
}

/// Enter `time` for `player` in `round`, or in their earliest round without a time.
///
/// Returns the round that was written. An existing time in an explicit round is overwritten.
pub fn set_time(
    tournament: &mut LimitedRound,
    player: &str,
    time: f64,
    round: Option<u32>,
) -> Result<u32, TournamentError> {
    if !time.is_finite() {
        return Err(TournamentError::InvalidTime);
    }
    let positions = tournament
        .index
        .by_player
        .get(player)
        .ok_or_else(|| TournamentError::PlayerNotFound(player.to_owned()))?;

    let round = match round {
        Some(round) => round,
        None => positions
            .iter()
            .map(|&pos| &tournament.schedule[pos])
            .find(|r| r.is_pending())
            .map(|r| r.round)
            .ok_or_else(|| TournamentError::NoPendingEntries(player.to_owned()))?,
    };

    let pos = *tournament
        .index
        .by_player_round
        .get(&(player.to_owned(), round))
        .ok_or_else(|| TournamentError::NoSuchEntry {
            player: player.to_owned(),
            round,
        })?;
    tournament.schedule[pos].time = Some(time);
    Ok(round)
}

/// Clear the times of the `n` most recently completed heats. Returns how many were cleared.
pub fn undo(tournament: &mut LimitedRound, n: usize) -> usize {
    let completed: Vec<usize> = (0..tournament.total_heats())
        .rev()
        .filter(|&heat| heat_is_complete(tournament, heat))
        .take(n)
        .collect();
    for &heat in &completed {
        let range = tournament.index.heats[heat].clone();
        for record in &mut tournament.schedule[range] {
            record.time = None;
        }
    }
    if !completed.is_empty() {
        log::info!(
            "Tournament {}: cleared heats {:?}",
            tournament.name(),
            completed
        );
    }
    completed.len()
}

/// Index of the first heat not yet fully timed (equals the heat count once all are done).
pub fn current_heat(tournament: &LimitedRound) -> usize {
    (0..tournament.total_heats())
        .find(|&heat| !heat_is_complete(tournament, heat))
        .unwrap_or_else(|| tournament.total_heats())
}
