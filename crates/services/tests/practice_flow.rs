use std::sync::Arc;

use quiz_core::SelectionMode;
use quiz_core::model::{Choice, PracticePreferences, Question, QuestionId, QuestionRecord, UserId};
use quiz_core::time::fixed_clock;
use services::{AppServices, InMemoryBackend, PracticeError, ProgressBackend};
use storage::repository::{InMemoryRepository, PreferencesRepository, ProgressCache, Storage};

const USER: &str = "6f1c2a9e-3d4b-4c5d-8e7f-0a1b2c3d4e5f";

fn question(id: &str, topic: &str, diff: u8) -> Question {
    QuestionRecord {
        id: id.into(),
        topic: topic.into(),
        subtopic: "Mixed Practice".into(),
        diff,
        stem: format!("Stem for {id}"),
        choices: vec![
            Choice::new("right", "Correct."),
            Choice::new("wrong", "Dropped a sign."),
            Choice::new("also wrong", "Misread the question."),
            Choice::new("nope", "Arithmetic slip."),
        ],
        answer_index: 2,
        solution_steps: vec!["Work it out.".into()],
    }
    .validate()
    .unwrap()
}

fn repo_with_banks() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.put_bank(
        "ALG-MIX",
        (1..=12)
            .map(|i| question(&format!("ALG-MIX-{i:03}"), "Algebra", (i % 5 + 1) as u8))
            .collect(),
    )
    .unwrap();
    repo.put_bank(
        "GEO-TRI",
        (1..=4)
            .map(|i| question(&format!("GEO-TRI-{i:03}"), "Geometry", 3))
            .collect(),
    )
    .unwrap();
    repo
}

fn storage_for(repo: &InMemoryRepository) -> Storage {
    Storage {
        progress: Arc::new(repo.clone()),
        preferences: Arc::new(repo.clone()),
    }
}

async fn offline_services(repo: &InMemoryRepository) -> AppServices {
    AppServices::assemble(storage_for(repo), Arc::new(repo.clone()), None, fixed_clock())
        .await
        .unwrap()
}

#[tokio::test]
async fn practice_session_records_progress_offline() {
    let repo = repo_with_banks();
    let services = offline_services(&repo).await;
    assert_eq!(services.questions().len(), 16);
    assert!(!services.progress().is_online());

    let practice = services.practice();
    let prefs = PracticePreferences {
        topic: "Algebra".into(),
        difficulty: None,
        mode: SelectionMode::Shuffled,
    };
    assert_eq!(practice.pool_size(&prefs), 12);

    let mut session = practice.start_session(&prefs).await.unwrap();
    let mut answered = 0;
    while let Some(shown) = practice.present_next(&mut session).unwrap() {
        assert_eq!(shown.question().topic(), "Algebra");
        let pick = shown.shuffle().correct_index();
        let feedback = practice.answer_current(&mut session, pick).await.unwrap();
        assert!(feedback.record.correct);
        answered += 1;
    }
    assert_eq!(answered, 10);
    assert!(session.is_complete());

    let cached = repo.load_progress().await.unwrap();
    assert_eq!(cached.len(), 10);
    assert!(cached.iter().all(|(_, e)| e.correct == 1 && e.wrong == 0));

    let stats = services.dashboard().stats().unwrap();
    assert_eq!(stats.total_answered, 10);
    assert_eq!(stats.overall_accuracy, 100);

    assert_eq!(repo.get_preferences().await.unwrap(), Some(prefs));
}

#[tokio::test]
async fn empty_filter_reports_empty_pool() {
    let repo = repo_with_banks();
    let services = offline_services(&repo).await;
    let prefs = PracticePreferences {
        topic: "Statistics".into(),
        ..PracticePreferences::default()
    };
    assert!(matches!(
        services.practice().start_session(&prefs).await,
        Err(PracticeError::EmptyPool)
    ));
}

#[tokio::test]
async fn signed_in_answers_survive_backend_outage() {
    let repo = repo_with_banks();
    let backend = InMemoryBackend::new();
    let user: UserId = USER.parse().unwrap();
    let remote: Arc<dyn ProgressBackend> = Arc::new(backend.clone());

    let services = AppServices::assemble(
        storage_for(&repo),
        Arc::new(repo.clone()),
        Some((remote, user)),
        fixed_clock(),
    )
    .await
    .unwrap();
    assert!(services.progress().is_online());

    backend.set_failing(true);
    let practice = services.practice();
    let mut session = practice
        .start_session(&PracticePreferences::default())
        .await
        .unwrap();
    let shown = practice.present_next(&mut session).unwrap().unwrap();
    let id = shown.question().id().clone();
    let wrong = (shown.shuffle().correct_index() + 1) % shown.choices().len();
    let feedback = practice.answer_current(&mut session, wrong).await.unwrap();
    assert!(!feedback.record.correct);

    let local = services.progress().entry(&id).unwrap().unwrap();
    assert_eq!(local.wrong, 1);
    assert_eq!(services.progress().pending().unwrap(), vec![id.clone()]);

    backend.set_failing(false);
    services.sync_now().await.unwrap();
    assert!(services.progress().pending().unwrap().is_empty());
    assert_eq!(backend.snapshot(&user).unwrap().get(&id), Some(&local));
}

#[tokio::test]
async fn startup_sync_pulls_remote_progress() {
    let repo = repo_with_banks();
    let backend = InMemoryBackend::new();
    let user: UserId = USER.parse().unwrap();
    let remote_entry = quiz_core::model::ProgressEntry::new(4, 1, quiz_core::time::fixed_now());
    backend
        .seed(
            &user,
            [(QuestionId::new("GEO-TRI-001").unwrap(), remote_entry)]
                .into_iter()
                .collect(),
        )
        .unwrap();

    let services = AppServices::assemble(
        storage_for(&repo),
        Arc::new(repo.clone()),
        Some((Arc::new(backend.clone()) as Arc<dyn ProgressBackend>, user)),
        fixed_clock(),
    )
    .await
    .unwrap();

    let id = QuestionId::new("GEO-TRI-001").unwrap();
    assert_eq!(services.progress().entry(&id).unwrap(), Some(remote_entry));
    assert_eq!(repo.load_progress().await.unwrap().get(&id), Some(&remote_entry));
}

#[tokio::test]
async fn bad_pick_keeps_question_and_timer_follows_service_clock() {
    let repo = repo_with_banks();
    let services = offline_services(&repo).await;
    let practice = services.practice();
    assert_eq!(practice.clock(), fixed_clock());

    let mut session = practice
        .start_session(&PracticePreferences::default())
        .await
        .unwrap();
    assert_eq!(session.started_at(), fixed_clock().now());
    assert_eq!(
        practice.remaining_time(&session).map(|left| left.num_minutes()),
        Some(12)
    );

    let shown = practice.present_next(&mut session).unwrap().unwrap();
    let id = shown.question().id().clone();
    let right = shown.shuffle().correct_index();
    assert!(matches!(
        practice.answer_current(&mut session, 9).await,
        Err(PracticeError::ChoiceOutOfRange { index: 9, len: 4 })
    ));
    assert_eq!(services.progress().entry(&id).unwrap(), None);

    let feedback = practice.answer_current(&mut session, right).await.unwrap();
    assert!(feedback.record.correct);

    let summary = practice.finish(&mut session);
    assert_eq!((summary.answered, summary.correct), (1, 1));
    assert_eq!(summary.elapsed.num_seconds(), 0);
    assert!(session.is_complete());
}
