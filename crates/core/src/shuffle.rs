use rand::Rng;

use crate::model::{Choice, Question};

/// Random permutation of `0..len` (Fisher–Yates).
///
/// Walks from the last slot down to 1, swapping slot `i` with a uniformly
/// chosen slot in `0..=i`. Every ordering is equally likely.
pub fn permutation<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    for i in (1..len).rev() {
        let j = rng.random_range(0..=i);
        order.swap(i, j);
    }
    order
}

/// Choices of one question in display order.
///
/// Built fresh every time a question is shown and dropped when the next one
/// loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleResult {
    choices: Vec<Choice>,
    correct_index: usize,
    /// `permutation[display] == original`.
    permutation: Vec<usize>,
}

impl ShuffleResult {
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Display position of the correct choice.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    #[must_use]
    pub fn is_correct(&self, display_index: usize) -> bool {
        display_index == self.correct_index
    }

    /// Position the displayed choice had in the question file.
    #[must_use]
    pub fn original_index(&self, display_index: usize) -> Option<usize> {
        self.permutation.get(display_index).copied()
    }
}

/// Shuffle the choices of `question`.
///
/// # Panics
///
/// Panics if the question has no choice at its answer index. `Question`
/// values are validated at load time, so this only fires on a broken
/// content invariant; a wrong answer key is never produced silently.
pub fn shuffle<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> ShuffleResult {
    let originals = question.choices();
    assert!(
        question.answer_index() < originals.len(),
        "question {} has answer index {} but only {} choices",
        question.id(),
        question.answer_index(),
        originals.len()
    );

    let permutation = permutation(originals.len(), rng);
    let choices = permutation.iter().map(|&i| originals[i].clone()).collect();
    let correct_index = permutation
        .iter()
        .position(|&i| i == question.answer_index())
        .expect("a permutation contains every original index");

    ShuffleResult {
        choices,
        correct_index,
        permutation,
    }
}
