//! Saving and loading tournaments: one JSON file per tournament plus a CSV backup of the schedule.

use crate::models::{RaceRecord, Tournament};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Directory used when the caller does not pick one.
pub const DEFAULT_SAVE_DIR: &str = "tournaments";

const STATE_EXT: &str = "json";
const BACKUP_EXT: &str = "csv";

/// Errors from reading or writing saved tournaments.
#[derive(Debug)]
pub enum PersistenceError {
    /// No saved tournament with this name.
    NotFound { name: String },
    /// The name cannot be used as a file name.
    InvalidName(String),
    Io(io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::NotFound { name } => write!(f, "No saved tournament named {}", name),
            PersistenceError::InvalidName(name) => {
                write!(f, "{:?} cannot be used as a tournament name", name)
            }
            PersistenceError::Io(e) => write!(f, "I/O error: {}", e),
            PersistenceError::Json(e) => write!(f, "Malformed tournament file: {}", e),
            PersistenceError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Json(e) => Some(e),
            PersistenceError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Json(e)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(e: csv::Error) -> Self {
        PersistenceError::Csv(e)
    }
}

/// Names become file stems: no separators, no leading dot, not empty.
pub fn validate_name(name: &str) -> Result<(), PersistenceError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(PersistenceError::InvalidName(name.to_owned()));
    }
    Ok(())
}

fn state_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, STATE_EXT))
}

fn backup_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, BACKUP_EXT))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Write `tournament` to `<dir>/<name>.json` plus a `<name>.csv` schedule backup,
/// replacing any previous save.
///
/// Both files are written to temporaries first. The backup is moved into place before the
/// state file, so an error means the saved state is unchanged.
pub fn save(tournament: &Tournament, dir: impl AsRef<Path>) -> Result<PathBuf, PersistenceError> {
    let dir = dir.as_ref();
    let name = tournament.name();
    validate_name(name)?;
    fs::create_dir_all(dir)?;

    let path = state_path(dir, name);
    let backup = backup_path(dir, name);
    let tmp = tmp_path(&path);
    let backup_tmp = tmp_path(&backup);

    let result = (|| -> Result<(), PersistenceError> {
        write_state(tournament, &tmp)?;
        write_schedule_csv(tournament.schedule(), File::create(&backup_tmp)?)?;
        fs::rename(&backup_tmp, &backup)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    })();
    if let Err(e) = result {
        for leftover in [&tmp, &backup_tmp] {
            if let Err(rm) = fs::remove_file(leftover) {
                if rm.kind() != io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", leftover.display(), rm);
                }
            }
        }
        log::warn!("Failed to save tournament {}: {}", name, e);
        return Err(e);
    }

    log::info!("Saved tournament {} to {}", name, path.display());
    Ok(path)
}

fn write_state(tournament: &Tournament, path: &Path) -> Result<(), PersistenceError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, tournament)?;
    writer.flush()?;
    Ok(())
}

/// Read the tournament saved as `name` in `dir`.
pub fn load(name: &str, dir: impl AsRef<Path>) -> Result<Tournament, PersistenceError> {
    validate_name(name)?;
    let path = state_path(dir.as_ref(), name);
    let contents = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PersistenceError::NotFound {
                name: name.to_owned(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let tournament: Tournament = serde_json::from_str(&contents)?;
    log::info!("Loaded tournament {} from {}", name, path.display());
    Ok(tournament)
}

/// Names of all tournaments saved in `dir`, sorted. A missing directory has none.
pub fn list_saved(dir: impl AsRef<Path>) -> Result<Vec<String>, PersistenceError> {
    let entries = match fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(STATE_EXT) {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if validate_name(stem).is_ok() => names.push(stem.to_owned()),
            _ => log::debug!("Ignoring {} in save directory", path.display()),
        }
    }
    names.sort();
    Ok(names)
}

/// Remove the saved files for `name`, if any.
pub fn delete(name: &str, dir: impl AsRef<Path>) -> Result<(), PersistenceError> {
    validate_name(name)?;
    let dir = dir.as_ref();
    for path in [state_path(dir, name), backup_path(dir, name)] {
        match fs::remove_file(&path) {
            Ok(()) => log::info!("Deleted {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Write the schedule as CSV (`player,round,heat,time`); missing times are empty fields.
pub fn write_schedule_csv<W: Write>(schedule: &[RaceRecord], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in schedule {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

impl Tournament {
    /// Save to `dir`, or the default directory.
    pub fn save(&self, dir: Option<&Path>) -> Result<PathBuf, PersistenceError> {
        save(self, dir.unwrap_or_else(|| Path::new(DEFAULT_SAVE_DIR)))
    }

    /// Load `name` from `dir`, or the default directory.
    pub fn load(name: &str, dir: Option<&Path>) -> Result<Tournament, PersistenceError> {
        load(name, dir.unwrap_or_else(|| Path::new(DEFAULT_SAVE_DIR)))
    }
}
