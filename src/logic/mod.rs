//! Tournament business logic: scheduling, time entry, ratings, registry, persistence.

mod persistence;
mod ratings;
mod registry;
mod schedule;
mod tracker;

pub use persistence::{
    delete, list_saved, load, save, validate_name, write_schedule_csv, PersistenceError,
    DEFAULT_SAVE_DIR,
};
pub use ratings::{get_ratings, RatingRow, Ratings, RATING_COLUMNS};
pub use registry::{create, tournament_types, Constructor, TournamentRegistry};
pub use schedule::{check_schedule, generate_schedule, MAX_SCHEDULE_ATTEMPTS};
pub use tracker::{current_heat, get_next_matchups, set_time, undo};
