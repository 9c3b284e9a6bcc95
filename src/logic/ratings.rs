//! Ratings: per-player time statistics, ranked by the tournament's rank statistic.

use crate::models::{LimitedRound, PlayerId, RankStat};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io;

/// Column order of the ratings table (also the CSV header).
pub const RATING_COLUMNS: [&str; 8] = [
    "rank", "player", "min", "max", "mean", "median", "std", "races",
];

/// One ranked player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingRow {
    pub rank: usize,
    pub player: PlayerId,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; None with fewer than two races.
    pub std: Option<f64>,
    pub races: usize,
}

impl RatingRow {
    fn from_times(player: PlayerId, mut times: Vec<f64>) -> Self {
        times.sort_by(f64::total_cmp);
        let races = times.len();
        let mean = times.iter().sum::<f64>() / races as f64;
        let median = if races % 2 == 1 {
            times[races / 2]
        } else {
            (times[races / 2 - 1] + times[races / 2]) / 2.0
        };
        let std = (races > 1).then(|| {
            let var = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (races - 1) as f64;
            var.sqrt()
        });
        Self {
            rank: 0,
            player,
            min: times[0],
            max: times[races - 1],
            mean,
            median,
            std,
            races,
        }
    }

    /// Value of `stat` for this row.
    pub fn stat(&self, stat: RankStat) -> Option<f64> {
        match stat {
            RankStat::Min => Some(self.min),
            RankStat::Max => Some(self.max),
            RankStat::Mean => Some(self.mean),
            RankStat::Median => Some(self.median),
            RankStat::Std => self.std,
            RankStat::Size => Some(self.races as f64),
        }
    }
}

/// Ratings table, best (lowest rank statistic) first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ratings {
    pub rank_stat: RankStat,
    pub columns: [&'static str; 8],
    pub rows: Vec<RatingRow>,
}

impl Ratings {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Write the table as CSV. The header is written even when there are no rows.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(self.columns)?;
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Rows without a value for the statistic (e.g. std of a single race) sort last.
fn compare_stat(a: &RatingRow, b: &RatingRow, stat: RankStat) -> Ordering {
    match (a.stat(stat), b.stat(stat)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Aggregate entered times per player and rank them ascending by the tournament's rank statistic.
///
/// Players without any entered time are left out. Ties keep player-name order.
pub fn get_ratings(tournament: &LimitedRound) -> Ratings {
    let mut times: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in tournament.schedule() {
        if let Some(time) = record.time {
            times.entry(record.player.as_str()).or_default().push(time);
        }
    }

    let stat = tournament.rank_stat();
    let mut rows: Vec<RatingRow> = times
        .into_iter()
        .map(|(player, times)| RatingRow::from_times(player.to_owned(), times))
        .collect();
    rows.sort_by(|a, b| compare_stat(a, b, stat));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    Ratings {
        rank_stat: stat,
        columns: RATING_COLUMNS,
        rows,
    }
}
