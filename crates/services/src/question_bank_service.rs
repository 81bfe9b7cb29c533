use std::collections::HashSet;
use std::sync::Arc;

use quiz_core::model::{BANKS, Bank, Question, find_bank};
use storage::repository::{QuestionSource, StorageError};
use tracing::{debug, info, warn};

/// A bank that could not be loaded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankFailure {
    pub key: &'static str,
    pub reason: String,
}

/// Every question that loaded, plus the banks that did not.
#[derive(Debug, Clone, Default)]
pub struct LoadedQuestions {
    pub questions: Vec<Question>,
    pub failures: Vec<BankFailure>,
    /// Ids seen in more than one bank; only the first copy is kept.
    pub duplicates: Vec<String>,
}

/// Loads the bank catalog from a `QuestionSource`.
#[derive(Clone)]
pub struct QuestionBankService {
    source: Arc<dyn QuestionSource>,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self { source }
    }

    /// Load one bank by key (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown key, or the source's
    /// error when the bank cannot be read.
    pub async fn load_bank(&self, key: &str) -> Result<Vec<Question>, StorageError> {
        let bank = find_bank(key).ok_or(StorageError::NotFound)?;
        self.source.load_bank(bank).await
    }

    /// Load every catalog bank.
    ///
    /// A bank that is missing or malformed is logged and skipped so one bad
    /// file does not take the whole app down.
    pub async fn load_all(&self) -> LoadedQuestions {
        self.load_banks(BANKS).await
    }

    pub async fn load_banks(&self, banks: &[Bank]) -> LoadedQuestions {
        let mut loaded = LoadedQuestions::default();
        let mut seen = HashSet::new();

        for bank in banks {
            match self.source.load_bank(bank).await {
                Ok(questions) => {
                    debug!(bank = bank.key, count = questions.len(), "loaded bank");
                    for question in questions {
                        if seen.insert(question.id().clone()) {
                            loaded.questions.push(question);
                        } else {
                            warn!(bank = bank.key, id = %question.id(), "duplicate question id");
                            loaded.duplicates.push(question.id().to_string());
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        bank = bank.key,
                        file = bank.file,
                        error = %err,
                        "skipping question bank"
                    );
                    loaded.failures.push(BankFailure {
                        key: bank.key,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            questions = loaded.questions.len(),
            failed_banks = loaded.failures.len(),
            "question banks loaded"
        );
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Choice, QuestionRecord};
    use storage::repository::InMemoryRepository;

    fn question(id: &str, topic: &str) -> Question {
        QuestionRecord {
            id: id.into(),
            topic: topic.into(),
            subtopic: "Mixed".into(),
            diff: 2,
            stem: "Pick one.".into(),
            choices: vec![Choice::new("a", ""), Choice::new("b", "")],
            answer_index: 1,
            solution_steps: Vec::new(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn missing_banks_are_skipped_not_fatal() {
        let repo = InMemoryRepository::new();
        repo.put_bank("ALG-LIN", vec![question("ALG-LIN-001", "Algebra")])
            .unwrap();
        let service = QuestionBankService::new(Arc::new(repo));

        let loaded = service.load_all().await;
        assert_eq!(loaded.questions.len(), 1);
        assert_eq!(loaded.failures.len(), BANKS.len() - 1);
        assert!(loaded.failures.iter().all(|f| f.key != "ALG-LIN"));
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first_copy() {
        let repo = InMemoryRepository::new();
        repo.put_bank("ALG-LIN", vec![question("DUP-1", "Algebra")])
            .unwrap();
        repo.put_bank("GEO-TRI", vec![question("DUP-1", "Geometry")])
            .unwrap();
        let service = QuestionBankService::new(Arc::new(repo));

        let banks: Vec<Bank> = ["ALG-LIN", "GEO-TRI"]
            .iter()
            .filter_map(|k| find_bank(k).copied())
            .collect();
        let loaded = service.load_banks(&banks).await;
        assert_eq!(loaded.questions.len(), 1);
        assert_eq!(loaded.questions[0].topic(), "Algebra");
        assert_eq!(loaded.duplicates, vec!["DUP-1".to_owned()]);
    }

    #[tokio::test]
    async fn load_bank_by_unknown_key_is_not_found() {
        let service = QuestionBankService::new(Arc::new(InMemoryRepository::new()));
        assert!(matches!(
            service.load_bank("NOPE").await,
            Err(StorageError::NotFound)
        ));
    }
}
