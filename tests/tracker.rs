//! Integration tests for match tracking: next heats, time entry and undo.

use pinewood_tournament::{LimitedRound, Tournament, TournamentError, TournamentOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;

const PLAYERS: [&str; 8] = [
    "jared", "jeff", "topher", "ryan", "don", "maria", "miguel", "joe",
];

fn tournament(seed: u64) -> Tournament {
    let players = PLAYERS.iter().map(|p| p.to_string()).collect();
    let options = TournamentOptions::new(4, 3, "min").unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    LimitedRound::with_rng("north40", players, options, &mut rng)
        .unwrap()
        .into()
}

/// Enter a time for every record of `heat`.
fn complete_heat(t: &mut Tournament, heat: usize, time: f64) {
    let entries: Vec<(String, u32)> = t
        .schedule()
        .iter()
        .filter(|r| r.heat as usize == heat)
        .map(|r| (r.player.clone(), r.round))
        .collect();
    for (player, round) in entries {
        t.set_time(&player, time, Some(round)).unwrap();
    }
}

fn time_of(t: &Tournament, player: &str, round: u32) -> Option<f64> {
    t.schedule()
        .iter()
        .find(|r| r.player == player && r.round == round)
        .and_then(|r| r.time)
}

#[test]
fn next_matchups_are_heats_in_order() {
    let t = tournament(1);
    let matches = t.get_next_matchups(3);
    assert_eq!(matches.len(), 3);
    for (heat, players) in matches.iter().enumerate() {
        let expected: Vec<String> = t
            .schedule()
            .iter()
            .filter(|r| r.heat as usize == heat)
            .map(|r| r.player.clone())
            .collect();
        assert_eq!(players, &expected);
    }
    assert_eq!(t.get_next_matchups(100).len(), t.total_heats());
    assert!(t.get_next_matchups(0).is_empty());
}

#[test]
fn completed_heats_are_skipped() {
    let mut t = tournament(2);
    let second = t.get_next_matchups(2)[1].clone();
    complete_heat(&mut t, 0, 3.2);
    assert_eq!(t.get_next_matchups(1)[0], second);
    assert_eq!(t.heat(), 1);

    // A partly timed heat is still pending.
    let player = second[0].clone();
    t.set_time(&player, 3.0, None).unwrap();
    assert_eq!(t.get_next_matchups(1)[0], second);

    for heat in 0..t.total_heats() {
        complete_heat(&mut t, heat, 2.5);
    }
    assert!(t.get_next_matchups(5).is_empty());
    assert_eq!(t.heat(), t.total_heats());
}

#[test]
fn set_time_fills_rounds_in_order_then_fails() {
    let mut t = tournament(3);
    assert_eq!(t.set_time("jeff", 0.15, None), Ok(0));
    assert_eq!(t.set_time("jeff", 0.16, None), Ok(1));
    assert_eq!(t.set_time("jeff", 0.17, None), Ok(2));
    assert_eq!(time_of(&t, "jeff", 0), Some(0.15));
    assert_eq!(time_of(&t, "jeff", 1), Some(0.16));
    assert_eq!(time_of(&t, "jeff", 2), Some(0.17));
    assert_eq!(
        t.set_time("jeff", 0.4, None),
        Err(TournamentError::NoPendingEntries("jeff".to_string()))
    );
}

#[test]
fn explicit_round_then_implicit_rounds() {
    let mut t = tournament(4);
    t.set_time("jeff", 0.121, Some(2)).unwrap();
    assert_eq!(time_of(&t, "jeff", 2), Some(0.121));

    t.set_time("jeff", 0.15, None).unwrap();
    assert_eq!(time_of(&t, "jeff", 0), Some(0.15));

    t.set_time("jeff", 0.5, None).unwrap();
    assert_eq!(time_of(&t, "jeff", 1), Some(0.5));

    assert!(matches!(
        t.set_time("jeff", 0.4, None),
        Err(TournamentError::NoPendingEntries(_))
    ));

    // Round 0 is a real round, not "no round": overwrite it explicitly.
    t.set_time("jeff", 0.11, Some(0)).unwrap();
    assert_eq!(time_of(&t, "jeff", 0), Some(0.11));
}

#[test]
fn set_time_errors_leave_schedule_untouched() {
    let mut t = tournament(5);
    let before = t.clone();
    assert_eq!(
        t.set_time("nobody", 1.0, None),
        Err(TournamentError::PlayerNotFound("nobody".to_string()))
    );
    assert_eq!(
        t.set_time("jeff", 1.0, Some(3)),
        Err(TournamentError::NoSuchEntry {
            player: "jeff".to_string(),
            round: 3
        })
    );
    assert_eq!(t.set_time("jeff", f64::NAN, None), Err(TournamentError::InvalidTime));
    assert_eq!(t.set_time("jeff", f64::INFINITY, Some(0)), Err(TournamentError::InvalidTime));
    assert_eq!(t, before);
}

#[test]
fn undo_clears_latest_completed_heats() {
    let mut t = tournament(6);
    complete_heat(&mut t, 0, 1.0);
    complete_heat(&mut t, 1, 2.0);
    // Heat 2 partly timed.
    let partial = t.get_next_matchups(1)[0][0].clone();
    t.set_time(&partial, 3.0, None).unwrap();
    assert_eq!(t.heat(), 2);

    assert_eq!(t.undo(1), 1);
    assert_eq!(t.heat(), 1);
    assert!(t
        .schedule()
        .iter()
        .filter(|r| r.heat == 1)
        .all(|r| r.time.is_none()));
    assert!(t
        .schedule()
        .iter()
        .filter(|r| r.heat == 0)
        .all(|r| r.time == Some(1.0)));
    // The partly timed heat is not a completed heat and keeps its entry.
    assert_eq!(
        t.schedule().iter().filter(|r| r.heat == 2 && r.time.is_some()).count(),
        1
    );

    assert_eq!(t.undo(5), 1);
    assert_eq!(t.heat(), 0);
    assert_eq!(t.undo(1), 0);
}

#[test]
fn heat_counters() {
    let mut t = tournament(7);
    assert_eq!(t.total_heats(), 6);
    assert_eq!(t.heat(), 0);
    complete_heat(&mut t, 0, 1.0);
    complete_heat(&mut t, 1, 1.0);
    assert_eq!(t.heat(), 2);
    assert_eq!(t.total_heats(), 6);
}
