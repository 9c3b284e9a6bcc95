//! Pinewood derby tournament manager: library with models, scheduling logic and storage.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    check_schedule, create, current_heat, delete, generate_schedule, get_next_matchups,
    get_ratings, list_saved, load, save, set_time, tournament_types, undo, write_schedule_csv,
    Constructor, PersistenceError, RatingRow, Ratings, TournamentRegistry, DEFAULT_SAVE_DIR,
    MAX_SCHEDULE_ATTEMPTS, RATING_COLUMNS,
};
pub use models::{
    LimitedRound, NumberOfPlays, PlayerId, PlayersPerRound, RaceRecord, RankStat, Tournament,
    TournamentError, TournamentOptions,
};
pub use store::{StoreError, TournamentHandle, TournamentStore};
