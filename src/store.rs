//! Live tournaments keyed by name, backed by a save directory.
//!
//! Every tournament sits behind its own mutex; all mutation of a given name goes
//! through that lock and is saved before the lock is released.

use crate::logic::{self, PersistenceError};
use crate::models::{PlayerId, Tournament, TournamentError, TournamentOptions};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// Shared handle to one live tournament.
pub type TournamentHandle = Arc<Mutex<Tournament>>;

/// Errors from store operations.
#[derive(Debug)]
pub enum StoreError {
    Tournament(TournamentError),
    Persistence(PersistenceError),
    /// The tournament was removed or replaced while waiting for its lock.
    Stale(String),
    /// A thread panicked while holding a store lock.
    LockPoisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Tournament(e) => write!(f, "{}", e),
            StoreError::Persistence(e) => write!(f, "{}", e),
            StoreError::Stale(name) => {
                write!(f, "Tournament {} was removed or replaced, retry the request", name)
            }
            StoreError::LockPoisoned => write!(f, "lock error"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<TournamentError> for StoreError {
    fn from(e: TournamentError) -> Self {
        StoreError::Tournament(e)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(e: PersistenceError) -> Self {
        StoreError::Persistence(e)
    }
}

/// In-memory cache of tournaments over a directory of saved ones.
#[derive(Debug)]
pub struct TournamentStore {
    dir: PathBuf,
    live: RwLock<HashMap<String, TournamentHandle>>,
}

impl TournamentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            live: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a tournament through the type registry, save it and make it live.
    /// An existing tournament with the same name is replaced.
    pub fn create(
        &self,
        tag: &str,
        name: &str,
        players: Vec<PlayerId>,
        options: TournamentOptions,
    ) -> Result<TournamentHandle, StoreError> {
        logic::validate_name(name)?;
        let tournament = logic::create(tag, name, players, options)?;
        self.insert(tournament)
    }

    /// Save `tournament` and make it live, replacing any entry of the same name.
    ///
    /// A replaced tournament is locked first, so an update in flight on it finishes before
    /// the new one is saved, and later updates through the old handle fail with `Stale`.
    pub fn insert(&self, tournament: Tournament) -> Result<TournamentHandle, StoreError> {
        let name = tournament.name().to_owned();
        loop {
            let previous = self.live_handle(&name)?;
            let _previous_guard = match &previous {
                Some(handle) => Some(handle.lock().map_err(|_| StoreError::LockPoisoned)?),
                None => None,
            };
            let mut live = self.live.write().map_err(|_| StoreError::LockPoisoned)?;
            if !same_entry(previous.as_ref(), live.get(&name)) {
                continue;
            }
            logic::save(&tournament, &self.dir)?;
            let handle = Arc::new(Mutex::new(tournament));
            live.insert(name, Arc::clone(&handle));
            return Ok(handle);
        }
    }

    fn live_handle(&self, name: &str) -> Result<Option<TournamentHandle>, StoreError> {
        Ok(self
            .live
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(name)
            .cloned())
    }

    /// True while `handle` is still the live entry for `name`.
    fn is_current(&self, name: &str, handle: &TournamentHandle) -> Result<bool, StoreError> {
        Ok(self
            .live_handle(name)?
            .is_some_and(|live| Arc::ptr_eq(&live, handle)))
    }

    /// Live tournament `name`, loading it from disk on first access.
    pub fn get(&self, name: &str) -> Result<TournamentHandle, StoreError> {
        if let Some(handle) = self.live_handle(name)? {
            return Ok(handle);
        }
        // Load under the map lock so a concurrent remove cannot slip between load and insert.
        let mut live = self.live.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(handle) = live.get(name) {
            return Ok(Arc::clone(handle));
        }
        let loaded = logic::load(name, &self.dir)?;
        let handle = Arc::new(Mutex::new(loaded));
        live.insert(name.to_owned(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Run a read-only query against tournament `name`.
    pub fn read<T>(&self, name: &str, f: impl FnOnce(&Tournament) -> T) -> Result<T, StoreError> {
        let handle = self.get(name)?;
        let guard = handle.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&*guard))
    }

    /// Apply `f` to tournament `name` and save the result.
    ///
    /// `f` runs on a copy; the live tournament only changes when both `f` and the save succeed.
    /// Fails with `Stale` if the tournament was removed or replaced while waiting for its lock.
    pub fn update<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Tournament) -> Result<T, TournamentError>,
    ) -> Result<T, StoreError> {
        let handle = self.get(name)?;
        let mut guard = handle.lock().map_err(|_| StoreError::LockPoisoned)?;
        if !self.is_current(name, &handle)? {
            return Err(StoreError::Stale(name.to_owned()));
        }
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        logic::save(&draft, &self.dir)?;
        *guard = draft;
        Ok(out)
    }

    /// Forget tournament `name` and delete its saved files. Missing names are not an error.
    ///
    /// Waits for any update in flight on `name` to finish first.
    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        loop {
            let handle = self.live_handle(name)?;
            let _guard = match &handle {
                Some(handle) => Some(handle.lock().map_err(|_| StoreError::LockPoisoned)?),
                None => None,
            };
            let mut live = self.live.write().map_err(|_| StoreError::LockPoisoned)?;
            if !same_entry(handle.as_ref(), live.get(name)) {
                continue;
            }
            live.remove(name);
            logic::delete(name, &self.dir)?;
            log::info!("Removed tournament {}", name);
            return Ok(());
        }
    }

    /// Names of live and saved tournaments, sorted.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        let mut names: BTreeSet<String> = logic::list_saved(&self.dir)?.into_iter().collect();
        names.extend(
            self.live
                .read()
                .map_err(|_| StoreError::LockPoisoned)?
                .keys()
                .cloned(),
        );
        Ok(names.into_iter().collect())
    }
}

/// The map entry is still the handle that was locked (or still absent).
fn same_entry(locked: Option<&TournamentHandle>, live: Option<&TournamentHandle>) -> bool {
    match (locked, live) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
