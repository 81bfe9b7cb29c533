use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quiz_core::model::{Bank, Question};

use crate::repository::{QuestionSource, StorageError};

/// Serves banks from JSON files in a content directory.
///
/// Each file holds a JSON array of question records. A single malformed
/// record fails the whole bank, so broken content never reaches a session.
#[derive(Debug, Clone)]
pub struct JsonQuestionSource {
    root: PathBuf,
}

impl JsonQuestionSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, bank: &Bank) -> PathBuf {
        self.root.join(bank.file)
    }
}

/// Parse a bank file's contents.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the JSON is malformed or any
/// record fails validation.
pub fn parse_bank(raw: &str) -> Result<Vec<Question>, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[async_trait]
impl QuestionSource for JsonQuestionSource {
    async fn load_bank(&self, bank: &Bank) -> Result<Vec<Question>, StorageError> {
        let path = self.path_for(bank);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound
            } else {
                StorageError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;
        parse_bank(&raw).map_err(|e| match e {
            StorageError::Serialization(msg) => {
                StorageError::Serialization(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::find_bank;

    const BANK: &str = r#"[
        {"id": "ALG-LIN-001", "topic": "Algebra", "subtopic": "Linear Equations", "diff": 1,
         "stem": "Solve $x + 1 = 2$.",
         "choices": [{"text": "1", "rationale": "ok"}, {"text": "2", "rationale": "no"}],
         "answerIndex": 0, "solutionSteps": ["x = 1"]}
    ]"#;

    #[tokio::test]
    async fn reads_bank_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bank = find_bank("ALG-LIN").unwrap();
        tokio::fs::write(dir.path().join(bank.file), BANK)
            .await
            .unwrap();

        let source = JsonQuestionSource::new(dir.path());
        let questions = source.load_bank(bank).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id().as_str(), "ALG-LIN-001");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonQuestionSource::new(dir.path());
        let err = source.load_bank(find_bank("GEO-3D").unwrap()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn invalid_record_fails_the_bank_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let bank = find_bank("ALG-LIN").unwrap();
        let broken = BANK.replace("\"answerIndex\": 0", "\"answerIndex\": 7");
        tokio::fs::write(dir.path().join(bank.file), broken)
            .await
            .unwrap();

        let err = JsonQuestionSource::new(dir.path())
            .load_bank(bank)
            .await
            .unwrap_err();
        match err {
            StorageError::Serialization(msg) => {
                assert!(msg.contains("algebra-linear.json"));
                assert!(msg.contains("out of range"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
