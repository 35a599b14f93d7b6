//! Integration tests for import/export and persisted state.
//!
//! These tests verify that imported or reloaded data never restarts a
//! timer or a track on its own.

use chrono::Utc;
use tickwell_core::audio::default_tracks;
use tickwell_core::storage::TIMERS_KEY;
use tickwell_core::{
    Database, ExportBundle, KvStore, ManualClock, NewTimer, StateRepository, TimerEngine,
    WhiteNoiseRegistry,
};

const T0: u64 = 1_760_000_000_000;

const RUNNING_EXPORT: &str = r#"{
    "timers": [
        {
            "id": "1760000000000",
            "title": "Imported focus",
            "duration": 1500,
            "remainingTime": 900,
            "isRunning": true,
            "createdAt": 1760000000000,
            "mode": "countdown"
        }
    ],
    "whiteNoises": [
        { "id": "rain", "name": "Rain", "file": "/audio/rain.mp3", "isActive": true }
    ],
    "exportDate": "2026-10-16T08:00:00.000Z",
    "version": "1.0"
}"#;

#[test]
fn import_never_resumes_a_driver() {
    let bundle = ExportBundle::from_json(RUNNING_EXPORT).unwrap();
    let mut engine = TimerEngine::manual(ManualClock::new(T0));
    let mut registry = WhiteNoiseRegistry::default();

    engine.replace_all(bundle.timers);
    registry.replace_all(bundle.white_noises);

    let timer = &engine.timers()[0];
    assert!(!timer.is_running);
    assert_eq!(timer.remaining_time, 900);
    assert!(engine.active_drivers().is_empty());
    assert!(engine.tick_all().is_empty());
    assert!(registry.active().is_none());
}

#[test]
fn imported_timer_resumes_only_on_request() {
    let bundle = ExportBundle::from_json(RUNNING_EXPORT).unwrap();
    let clock = ManualClock::new(T0);
    let mut engine = TimerEngine::manual(clock.clone());
    engine.replace_all(bundle.timers);

    let id = engine.timers()[0].id.clone();
    assert!(engine.start(&id).is_some());
    clock.advance_secs(1);
    engine.tick_all();
    assert_eq!(engine.get(&id).unwrap().remaining_time, 899);
}

#[test]
fn import_replaces_existing_timers() {
    let mut engine = TimerEngine::manual(ManualClock::new(T0));
    engine.create(NewTimer::countdown("Old", 60)).unwrap();

    let bundle = ExportBundle::from_json(RUNNING_EXPORT).unwrap();
    engine.replace_all(bundle.timers);
    let titles: Vec<_> = engine.timers().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Imported focus"]);
}

#[test]
fn export_then_import_keeps_collection() {
    let mut engine = TimerEngine::manual(ManualClock::new(T0));
    engine.create(NewTimer::countdown("Tea", 300)).unwrap();
    engine
        .create(NewTimer::scheduled("Meeting", T0 + 3_600_000).with_white_noise("pink"))
        .unwrap();

    let json = ExportBundle::new(engine.timers().to_vec(), default_tracks(), Utc::now())
        .to_json()
        .unwrap();
    let bundle = ExportBundle::from_json(&json).unwrap();

    assert_eq!(bundle.timers.len(), 2);
    assert_eq!(bundle.timers[1].white_noise.as_deref(), Some("pink"));
    assert_eq!(bundle.timers[1].scheduled_time, Some(T0 + 3_600_000));
    assert!(bundle.timers.iter().all(|t| !t.is_running));
}

#[test]
fn state_survives_database_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickwell.db");

    let mut engine = TimerEngine::manual(ManualClock::new(T0));
    engine.create(NewTimer::countdown("Persisted", 120)).unwrap();
    {
        let mut repo = StateRepository::new(Database::open_at(&path).unwrap());
        repo.save_timers(engine.timers()).unwrap();
        repo.save_white_noises(&default_tracks()).unwrap();
    }

    let repo = StateRepository::new(Database::open_at(&path).unwrap());
    let loaded = repo.load_timers().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "Persisted");
    let raw = Database::open_at(&path).unwrap();
    assert!(raw.get(TIMERS_KEY).unwrap().is_some());

    let mut fresh = TimerEngine::manual(ManualClock::new(T0));
    fresh.replace_all(loaded);
    assert!(!fresh.timers()[0].is_running);
    assert!(fresh.active_drivers().is_empty());
}
