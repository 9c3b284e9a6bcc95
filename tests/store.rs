//! Integration tests for the live tournament store.

use pinewood_tournament::{
    list_saved, load, PersistenceError, StoreError, TournamentError, TournamentOptions,
    TournamentStore,
};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn roster() -> Vec<String> {
    ["jared", "jeff", "topher", "ryan", "don", "maria", "miguel", "joe"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn options() -> TournamentOptions {
    TournamentOptions::new(4, 3, "min").unwrap()
}

#[test]
fn create_saves_and_get_returns_live_copy() {
    let dir = tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    let handle = store.create("LimitedRound", "north40", roster(), options()).unwrap();
    assert!(dir.path().join("north40.json").exists());

    let again = store.get("north40").unwrap();
    assert!(Arc::ptr_eq(&handle, &again));
    assert_eq!(store.names().unwrap(), vec!["north40"]);
}

#[test]
fn get_loads_from_disk_on_first_access() {
    let dir = tempdir().unwrap();
    let first = TournamentStore::new(dir.path());
    first.create("LimitedRound", "pine", roster(), options()).unwrap();
    first
        .update("pine", |t| t.set_time("jeff", 3.5, None))
        .unwrap();

    let second = TournamentStore::new(dir.path());
    let pending = second
        .read("pine", |t| t.get_next_matchups(100).len())
        .unwrap();
    assert_eq!(pending, 6);
    assert_eq!(second.update("pine", |t| t.set_time("jeff", 3.6, None)).unwrap(), 1);

    assert!(matches!(
        second.get("missing"),
        Err(StoreError::Persistence(PersistenceError::NotFound { .. }))
    ));
}

#[test]
fn failed_update_changes_nothing() {
    let dir = tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    store.create("LimitedRound", "pine", roster(), options()).unwrap();
    let before = store.read("pine", |t| t.clone()).unwrap();

    let result = store.update("pine", |t| {
        t.set_time("jeff", 1.0, None)?;
        t.set_time("nobody", 1.0, None)
    });
    assert!(matches!(
        result,
        Err(StoreError::Tournament(TournamentError::PlayerNotFound(_)))
    ));
    assert_eq!(store.read("pine", |t| t.clone()).unwrap(), before);
    assert_eq!(load("pine", dir.path()).unwrap(), before);
}

#[test]
fn concurrent_updates_on_one_name_are_serialized() {
    let dir = tempdir().unwrap();
    let store = Arc::new(TournamentStore::new(dir.path()));
    store.create("LimitedRound", "pine", roster(), options()).unwrap();

    let workers: Vec<_> = roster()
        .into_iter()
        .map(|player| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..3 {
                    store
                        .update("pine", |t| t.set_time(&player, 2.0, None))
                        .unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let saved = load("pine", dir.path()).unwrap();
    assert!(saved.schedule().iter().all(|r| r.time == Some(2.0)));
    assert!(saved.get_next_matchups(1).is_empty());
}

#[test]
fn remove_forgets_and_deletes() {
    let dir = tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    store.create("LimitedRound", "pine", roster(), options()).unwrap();
    store.remove("pine").unwrap();
    assert!(store.names().unwrap().is_empty());
    assert!(store.get("pine").is_err());
    store.remove("pine").unwrap();
}

#[test]
fn invalid_names_are_rejected_before_creating() {
    let dir = tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    assert!(matches!(
        store.create("LimitedRound", "../x", roster(), options()),
        Err(StoreError::Persistence(PersistenceError::InvalidName(_)))
    ));
}

#[test]
fn remove_waits_for_update_in_flight() {
    let dir = tempdir().unwrap();
    let store = Arc::new(TournamentStore::new(dir.path()));
    store.create("LimitedRound", "pine", roster(), options()).unwrap();

    let worker = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            store.update("pine", |t| {
                thread::sleep(Duration::from_millis(300));
                t.set_time("jeff", 1.0, None)
            })
        })
    };
    thread::sleep(Duration::from_millis(100));
    store.remove("pine").unwrap();

    // The update held the lock first, so it finished before the delete.
    assert_eq!(worker.join().unwrap().unwrap(), 0);
    assert!(list_saved(dir.path()).unwrap().is_empty());
    assert!(store.names().unwrap().is_empty());
    assert!(matches!(
        load("pine", dir.path()),
        Err(PersistenceError::NotFound { .. })
    ));
}

#[test]
fn replacing_create_waits_for_updates_on_the_old_tournament() {
    let dir = tempdir().unwrap();
    let store = Arc::new(TournamentStore::new(dir.path()));
    store.create("LimitedRound", "pine", roster(), options()).unwrap();

    let slow_update = |store: Arc<TournamentStore>, delay: u64| {
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(delay));
            store.update("pine", |t| {
                thread::sleep(Duration::from_millis(300));
                t.set_time("jeff", 1.0, None)
            })
        })
    };
    let first = slow_update(Arc::clone(&store), 0);
    let replacer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let short = TournamentOptions::new(2, 1, "min").unwrap();
            store.create("LimitedRound", "pine", roster(), short)
        })
    };
    // Queues on the old tournament behind the first update.
    let second = slow_update(Arc::clone(&store), 150);

    assert!(first.join().unwrap().is_ok());
    let replacement = replacer.join().unwrap().unwrap();
    match second.join().unwrap() {
        Ok(_) | Err(StoreError::Stale(_)) => {}
        Err(e) => panic!("unexpected error: {e}"),
    }

    let live = store.read("pine", |t| t.clone()).unwrap();
    assert!(Arc::ptr_eq(&replacement, &store.get("pine").unwrap()));
    assert_eq!(live.schedule().len(), 8);
    assert_eq!(load("pine", dir.path()).unwrap(), live);
}

#[test]
fn failed_save_keeps_memory_and_disk_in_step() {
    let dir = tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    store.create("LimitedRound", "pine", roster(), options()).unwrap();

    fs::remove_file(dir.path().join("pine.csv")).unwrap();
    fs::create_dir(dir.path().join("pine.csv")).unwrap();
    let result = store.update("pine", |t| t.set_time("jeff", 1.0, None));
    assert!(matches!(result, Err(StoreError::Persistence(_))));

    let timed = |t: &pinewood_tournament::Tournament| {
        t.schedule().iter().filter(|r| r.time.is_some()).count()
    };
    let in_memory = store.read("pine", timed).unwrap();
    let on_disk = timed(&load("pine", dir.path()).unwrap());
    assert_eq!(in_memory, 0);
    assert_eq!(on_disk, 0);
    let leftovers = fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".tmp")
        })
        .count();
    assert_eq!(leftovers, 0);
}
