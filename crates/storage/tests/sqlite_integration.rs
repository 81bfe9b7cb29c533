use chrono::Duration;
use quiz_core::SelectionMode;
use quiz_core::model::{Difficulty, PracticePreferences, ProgressEntry, ProgressMap, QuestionId};
use quiz_core::time::fixed_now;
use storage::repository::{PreferencesRepository, ProgressCache, Storage};
use storage::sqlite::SqliteRepository;

fn qid(s: &str) -> QuestionId {
    QuestionId::new(s).unwrap()
}

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_progress_roundtrip_keeps_millisecond_timestamps() {
    let repo = repo("memdb_progress_roundtrip").await;
    let at = fixed_now() + Duration::milliseconds(123);

    repo.save_entry(&qid("ALG-LIN-001"), &ProgressEntry::new(3, 1, at))
        .await
        .unwrap();
    repo.save_entry(&qid("GEO-TRI-004"), &ProgressEntry::new(0, 2, at))
        .await
        .unwrap();

    let loaded = repo.load_progress().await.unwrap();
    assert_eq!(loaded.len(), 2);
    let entry = loaded.get(&qid("ALG-LIN-001")).unwrap();
    assert_eq!((entry.correct, entry.wrong), (3, 1));
    assert_eq!(entry.last_attempt_at, at);
}

#[tokio::test]
async fn sqlite_save_entry_overwrites_existing_row() {
    let repo = repo("memdb_progress_overwrite").await;
    let now = fixed_now();
    let id = qid("STAT-PROB-002");

    repo.save_entry(&id, &ProgressEntry::new(1, 0, now)).await.unwrap();
    repo.save_entry(&id, &ProgressEntry::new(1, 1, now + Duration::seconds(5)))
        .await
        .unwrap();

    let loaded = repo.load_progress().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get(&id).unwrap().wrong, 1);
}

#[tokio::test]
async fn sqlite_replace_progress_drops_stale_rows() {
    let repo = repo("memdb_progress_replace").await;
    let now = fixed_now();
    repo.save_entry(&qid("OLD"), &ProgressEntry::new(1, 0, now))
        .await
        .unwrap();

    let next: ProgressMap = [
        (qid("A"), ProgressEntry::new(2, 0, now)),
        (qid("B"), ProgressEntry::new(0, 1, now)),
    ]
    .into_iter()
    .collect();
    repo.replace_progress(&next).await.unwrap();

    assert_eq!(repo.load_progress().await.unwrap(), next);
}

#[tokio::test]
async fn sqlite_preferences_upsert_single_row() {
    let repo = repo("memdb_preferences").await;
    assert!(repo.get_preferences().await.unwrap().is_none());

    let prefs = PracticePreferences {
        topic: "Geometry".into(),
        difficulty: Some(Difficulty::new(3).unwrap()),
        mode: SelectionMode::Shuffled,
    };
    repo.save_preferences(&prefs).await.unwrap();
    assert_eq!(repo.get_preferences().await.unwrap(), Some(prefs));

    let cleared = PracticePreferences::default();
    repo.save_preferences(&cleared).await.unwrap();
    assert_eq!(repo.get_preferences().await.unwrap(), Some(cleared));
}

#[tokio::test]
async fn sqlite_migrate_is_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    assert!(repo.load_progress().await.unwrap().is_empty());
}

#[tokio::test]
async fn storage_sqlite_wires_both_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_wiring?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .progress
        .save_entry(&qid("A"), &ProgressEntry::new(1, 0, fixed_now()))
        .await
        .unwrap();
    storage
        .preferences
        .save_preferences(&PracticePreferences::default())
        .await
        .unwrap();

    assert_eq!(storage.progress.load_progress().await.unwrap().len(), 1);
    assert!(storage.preferences.get_preferences().await.unwrap().is_some());
}
