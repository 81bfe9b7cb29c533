use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::QuestionId;

//
// ─── PROGRESS ENTRY ────────────────────────────────────────────────────────────
//

/// Per-question attempt counters.
///
/// Serialized as `{"correct": n, "wrong": n, "lastAt": epoch_ms}`, the same
/// shape the device cache and exports use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub correct: u32,
    pub wrong: u32,
    #[serde(rename = "lastAt", with = "chrono::serde::ts_milliseconds")]
    pub last_attempt_at: DateTime<Utc>,
}

impl Default for ProgressEntry {
    fn default() -> Self {
        Self {
            correct: 0,
            wrong: 0,
            last_attempt_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl ProgressEntry {
    #[must_use]
    pub fn new(correct: u32, wrong: u32, last_attempt_at: DateTime<Utc>) -> Self {
        Self {
            correct,
            wrong,
            last_attempt_at,
        }
    }

    /// Returns the entry after one more attempt.
    ///
    /// Exactly one of `correct`/`wrong` grows by one.
    #[must_use]
    pub fn attempted(self, correct: bool, at: DateTime<Utc>) -> Self {
        let (correct_count, wrong_count) = if correct {
            (self.correct.saturating_add(1), self.wrong)
        } else {
            (self.correct, self.wrong.saturating_add(1))
        };
        Self {
            correct: correct_count,
            wrong: wrong_count,
            last_attempt_at: at,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.correct.saturating_add(self.wrong)
    }

    /// Rounded percentage of correct attempts, 0 when never attempted.
    #[must_use]
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(u64::from(self.correct), u64::from(self.wrong))
    }
}

/// Rounded `correct / (correct + wrong)` percentage, 0 for no attempts.
#[must_use]
pub fn accuracy_percent(correct: u64, wrong: u64) -> u32 {
    let total = correct + wrong;
    if total == 0 {
        return 0;
    }
    // Round half up.
    let pct = (correct * 200 + total) / (total * 2);
    u32::try_from(pct).unwrap_or(100)
}

//
// ─── PROGRESS MAP ──────────────────────────────────────────────────────────────
//

/// Progress for every attempted question, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap(BTreeMap<QuestionId, ProgressEntry>);

impl ProgressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&ProgressEntry> {
        self.0.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.0.contains_key(id)
    }

    pub fn insert(&mut self, id: QuestionId, entry: ProgressEntry) -> Option<ProgressEntry> {
        self.0.insert(id, entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &ProgressEntry)> {
        self.0.iter()
    }

    /// Record one attempt in place and return the new entry.
    pub fn record(&mut self, id: &QuestionId, correct: bool, at: DateTime<Utc>) -> ProgressEntry {
        let entry = self
            .0
            .get(id)
            .copied()
            .unwrap_or_default()
            .attempted(correct, at);
        self.0.insert(id.clone(), entry);
        entry
    }

    /// Overlay `remote` onto this map; see [`merge`].
    pub fn absorb(&mut self, remote: &ProgressMap) {
        for (id, entry) in remote.iter() {
            self.0.insert(id.clone(), *entry);
        }
    }

    /// Entries with at least one attempt that `remote` does not know about.
    #[must_use]
    pub fn local_only(&self, remote: &ProgressMap) -> ProgressMap {
        self.0
            .iter()
            .filter(|(id, entry)| entry.attempts() > 0 && !remote.contains(id))
            .map(|(id, entry)| (id.clone(), *entry))
            .collect()
    }

    /// Copy the entries for the given ids, skipping ids without progress.
    #[must_use]
    pub fn subset<'a>(&self, ids: impl IntoIterator<Item = &'a QuestionId>) -> ProgressMap {
        ids.into_iter()
            .filter_map(|id| self.0.get(id).map(|e| (id.clone(), *e)))
            .collect()
    }
}

impl FromIterator<(QuestionId, ProgressEntry)> for ProgressMap {
    fn from_iter<T: IntoIterator<Item = (QuestionId, ProgressEntry)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ProgressMap {
    type Item = (QuestionId, ProgressEntry);
    type IntoIter = std::collections::btree_map::IntoIter<QuestionId, ProgressEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

//
// ─── MERGE / UPDATE ────────────────────────────────────────────────────────────
//

/// Reconcile the local cache with the remote copy.
///
/// Remote entries replace local ones wholesale (no counter arithmetic).
/// Local-only and remote-only entries are both kept.
#[must_use]
pub fn merge(local: &ProgressMap, remote: &ProgressMap) -> ProgressMap {
    let mut merged = local.clone();
    merged.absorb(remote);
    merged
}

/// Returns `store` with one more attempt recorded for `id`.
#[must_use]
pub fn update(
    store: &ProgressMap,
    id: &QuestionId,
    correct: bool,
    at: DateTime<Utc>,
) -> ProgressMap {
    let mut next = store.clone();
    next.record(id, correct, at);
    next
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
