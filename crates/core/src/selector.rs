use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::Question;
use crate::shuffle::permutation;

//
// ─── SELECTION MODE ────────────────────────────────────────────────────────────
//

/// How the next question is picked from a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Pool order, wrapping around.
    #[default]
    Sequential,
    /// One random order per session; no repeats until the pool is exhausted.
    Shuffled,
    /// Independent uniform draw every time; repeats allowed.
    Random,
}

impl SelectionMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::Sequential => "sequential",
            SelectionMode::Shuffled => "shuffled",
            SelectionMode::Random => "random",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid selection mode {0:?} (expected sequential, shuffled or random)")]
pub struct ParseModeError(pub String);

impl FromStr for SelectionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "shuffled" | "shuffle" => Ok(Self::Shuffled),
            "random" => Ok(Self::Random),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

//
// ─── SELECTION STATE ───────────────────────────────────────────────────────────
//

/// Cursor of one practice session over its pool.
///
/// Owned by a single session; never shared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    mode: SelectionMode,
    position: usize,
    /// Shuffled mode only: fixed question order for this session.
    order: Option<Vec<usize>>,
}

impl SelectionState {
    #[must_use]
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            position: 0,
            order: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Number of questions handed out so far (unused in random mode).
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The materialized order, if shuffled mode has started.
    #[must_use]
    pub fn order(&self) -> Option<&[usize]> {
        self.order.as_deref()
    }

    /// Begin a new session: back to the first slot, and a fresh order for
    /// shuffled mode on the next call.
    pub fn restart(&mut self) {
        self.position = 0;
        self.order = None;
    }

    /// Pick the next question from `pool` and advance.
    ///
    /// Returns `None` for an empty pool so the caller can show an empty state.
    pub fn next<'a, R: Rng + ?Sized>(
        &mut self,
        pool: &'a [Question],
        rng: &mut R,
    ) -> Option<&'a Question> {
        let len = pool.len();
        if len == 0 {
            return None;
        }

        let index = match self.mode {
            SelectionMode::Sequential => {
                let index = self.position % len;
                self.position += 1;
                index
            }
            SelectionMode::Shuffled => {
                let stale = self.order.as_ref().is_none_or(|o| o.len() != len);
                if stale {
                    // Pool changed under us (or first call): new cycle.
                    self.order = Some(permutation(len, rng));
                    self.position = 0;
                }
                let order = self.order.as_deref().unwrap_or_default();
                let index = order.get(self.position % len).copied().unwrap_or(0);
                self.position += 1;
                index
            }
            SelectionMode::Random => rng.random_range(0..len),
        };

        pool.get(index)
    }
}

/// Functional form of [`SelectionState::next`]: leaves `state` untouched and
/// returns the advanced copy.
pub fn next<'a, R: Rng + ?Sized>(
    pool: &'a [Question],
    state: &SelectionState,
    rng: &mut R,
) -> (Option<&'a Question>, SelectionState) {
    let mut state = state.clone();
    let picked = state.next(pool, rng);
    (picked, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, QuestionRecord};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn pool(ids: &[&str]) -> Vec<Question> {
        ids.iter()
            .map(|id| {
                QuestionRecord {
                    id: (*id).into(),
                    topic: "T".into(),
                    subtopic: "S".into(),
                    diff: 1,
                    stem: "stem".into(),
                    choices: vec![Choice::new("a", ""), Choice::new("b", "")],
                    answer_index: 0,
                    solution_steps: Vec::new(),
                }
                .validate()
                .unwrap()
            })
            .collect()
    }

    fn take(
        state: &mut SelectionState,
        pool: &[Question],
        n: usize,
        rng: &mut StdRng,
    ) -> Vec<String> {
        (0..n)
            .map(|_| state.next(pool, rng).unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn empty_pool_yields_none_in_every_mode() {
        let mut rng = StdRng::seed_from_u64(0);
        for mode in [SelectionMode::Sequential, SelectionMode::Shuffled, SelectionMode::Random] {
            let mut state = SelectionState::new(mode);
            assert!(state.next(&[], &mut rng).is_none());
        }
    }

    #[test]
    fn sequential_wraps_in_pool_order() {
        let p = pool(&["A", "B", "C"]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = SelectionState::new(SelectionMode::Sequential);
        assert_eq!(take(&mut state, &p, 4, &mut rng), ["A", "B", "C", "A"]);
    }

    #[test]
    fn sequential_visits_each_once_per_cycle() {
        let ids: Vec<String> = (0..17).map(|i| format!("Q{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let p = pool(&refs);
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = SelectionState::new(SelectionMode::Sequential);
        assert_eq!(take(&mut state, &p, 17, &mut rng), ids);
    }

    #[test]
    fn functional_next_leaves_input_state_alone() {
        let p = pool(&["A", "B"]);
        let mut rng = StdRng::seed_from_u64(0);
        let state = SelectionState::new(SelectionMode::Sequential);
        let (q, advanced) = next(&p, &state, &mut rng);
        assert_eq!(q.unwrap().id().as_str(), "A");
        assert_eq!(state.position(), 0);
        assert_eq!(advanced.position(), 1);
    }

    #[test]
    fn shuffled_has_no_repeats_within_a_cycle() {
        let ids: Vec<String> = (0..25).map(|i| format!("Q{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let p = pool(&refs);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = SelectionState::new(SelectionMode::Shuffled);
            let picked = take(&mut state, &p, p.len(), &mut rng);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), p.len());
        }
    }

    #[test]
    fn shuffled_order_is_fixed_until_restart() {
        let p = pool(&["A", "B", "C", "D", "E", "F"]);
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = SelectionState::new(SelectionMode::Shuffled);
        let first = take(&mut state, &p, 6, &mut rng);
        let order = state.order().unwrap().to_vec();
        let second = take(&mut state, &p, 6, &mut rng);
        assert_eq!(first, second);
        assert_eq!(state.order().unwrap(), order.as_slice());

        state.restart();
        assert_eq!(state.position(), 0);
        assert!(state.order().is_none());
        let third = take(&mut state, &p, 6, &mut rng);
        let unique: HashSet<_> = third.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn shuffled_regenerates_when_pool_size_changes() {
        let big = pool(&["A", "B", "C", "D", "E"]);
        let small = pool(&["A", "B"]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = SelectionState::new(SelectionMode::Shuffled);
        take(&mut state, &big, 4, &mut rng);
        assert_eq!(state.position(), 4);

        let picked = take(&mut state, &small, 2, &mut rng);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 2);
        assert_eq!(state.order().unwrap().len(), 2);
        assert_eq!(state.position(), 2);
    }

    #[test]
    fn random_can_repeat_back_to_back() {
        let p = pool(&["A", "B"]);
        let mut rng = StdRng::seed_from_u64(99);
        let mut state = SelectionState::new(SelectionMode::Random);
        let picks = take(&mut state, &p, 200, &mut rng);
        assert!(picks.windows(2).any(|w| w[0] == w[1]));
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn mode_parses_from_text() {
        assert_eq!("Shuffled".parse::<SelectionMode>().unwrap(), SelectionMode::Shuffled);
        assert_eq!("random".parse::<SelectionMode>().unwrap(), SelectionMode::Random);
        let err = "spiral".parse::<SelectionMode>().unwrap_err();
        assert_eq!(err, ParseModeError("spiral".into()));
        assert_eq!(
            err.to_string(),
            "invalid selection mode \"spiral\" (expected sequential, shuffled or random)"
        );
    }
}
