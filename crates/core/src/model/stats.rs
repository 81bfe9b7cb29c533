use std::collections::BTreeMap;

use crate::model::progress::{ProgressMap, accuracy_percent};
use crate::model::question::{Difficulty, Question};

/// Attempt totals for one group of questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    /// Questions in the group, attempted or not.
    pub total: u32,
    pub correct: u64,
    pub wrong: u64,
    pub accuracy: u32,
}

impl GroupStats {
    fn add(&mut self, correct: u32, wrong: u32) {
        self.total = self.total.saturating_add(1);
        self.correct += u64::from(correct);
        self.wrong += u64::from(wrong);
    }

    fn finish(mut self) -> Self {
        self.accuracy = accuracy_percent(self.correct, self.wrong);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStats {
    pub topic: String,
    pub stats: GroupStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyStats {
    pub difficulty: Difficulty,
    pub stats: GroupStats,
}

/// Overview shown on the progress dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_questions: usize,
    /// Questions with at least one attempt.
    pub total_answered: usize,
    pub total_correct: u64,
    pub total_wrong: u64,
    pub overall_accuracy: u32,
    /// Sorted by accuracy, best first.
    pub by_topic: Vec<TopicStats>,
    /// Sorted by difficulty, easiest first.
    pub by_difficulty: Vec<DifficultyStats>,
}

impl DashboardStats {
    /// Aggregate `progress` over `questions`.
    ///
    /// Progress for ids not present in `questions` is ignored.
    #[must_use]
    pub fn compute(questions: &[Question], progress: &ProgressMap) -> Self {
        let mut out = Self {
            total_questions: questions.len(),
            ..Self::default()
        };
        let mut topics: BTreeMap<&str, GroupStats> = BTreeMap::new();
        let mut difficulties: BTreeMap<Difficulty, GroupStats> = BTreeMap::new();

        for q in questions {
            let (correct, wrong) = progress
                .get(q.id())
                .map_or((0, 0), |e| (e.correct, e.wrong));

            if correct > 0 || wrong > 0 {
                out.total_answered += 1;
                out.total_correct += u64::from(correct);
                out.total_wrong += u64::from(wrong);
            }

            topics.entry(q.topic()).or_default().add(correct, wrong);
            difficulties
                .entry(q.difficulty())
                .or_default()
                .add(correct, wrong);
        }

        out.overall_accuracy = accuracy_percent(out.total_correct, out.total_wrong);

        out.by_topic = topics
            .into_iter()
            .map(|(topic, stats)| TopicStats {
                topic: topic.to_owned(),
                stats: stats.finish(),
            })
            .collect();
        // Stable sort keeps alphabetical order among ties.
        out.by_topic
            .sort_by(|a, b| b.stats.accuracy.cmp(&a.stats.accuracy));

        out.by_difficulty = difficulties
            .into_iter()
            .map(|(difficulty, stats)| DifficultyStats {
                difficulty,
                stats: stats.finish(),
            })
            .collect();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionId;
    use crate::model::progress::ProgressEntry;
    use crate::model::question::{Choice, QuestionRecord};
    use chrono::{DateTime, Utc};

    fn q(id: &str, topic: &str, diff: u8) -> Question {
        QuestionRecord {
            id: id.into(),
            topic: topic.into(),
            subtopic: "Sub".into(),
            diff,
            stem: "stem".into(),
            choices: vec![Choice::new("a", ""), Choice::new("b", "")],
            answer_index: 1,
            solution_steps: Vec::new(),
        }
        .validate()
        .unwrap()
    }

    fn progress(entries: &[(&str, u32, u32)]) -> ProgressMap {
        entries
            .iter()
            .map(|(id, c, w)| {
                (
                    QuestionId::new(*id).unwrap(),
                    ProgressEntry::new(*c, *w, DateTime::<Utc>::UNIX_EPOCH),
                )
            })
            .collect()
    }

    #[test]
    fn empty_progress_yields_zeroes() {
        let stats = DashboardStats::compute(&[q("A", "Algebra", 1)], &ProgressMap::new());
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.total_answered, 0);
        assert_eq!(stats.overall_accuracy, 0);
        assert_eq!(stats.by_topic[0].stats.total, 1);
    }

    #[test]
    fn aggregates_by_topic_and_difficulty() {
        let questions = vec![
            q("A1", "Algebra", 1),
            q("A2", "Algebra", 3),
            q("G1", "Geometry", 3),
        ];
        let p = progress(&[("A1", 1, 3), ("G1", 2, 0), ("UNKNOWN", 9, 9)]);

        let stats = DashboardStats::compute(&questions, &p);

        assert_eq!(stats.total_answered, 2);
        assert_eq!(stats.total_correct, 3);
        assert_eq!(stats.total_wrong, 3);
        assert_eq!(stats.overall_accuracy, 50);

        assert_eq!(stats.by_topic[0].topic, "Geometry");
        assert_eq!(stats.by_topic[0].stats.accuracy, 100);
        assert_eq!(stats.by_topic[1].topic, "Algebra");
        assert_eq!(stats.by_topic[1].stats.total, 2);
        assert_eq!(stats.by_topic[1].stats.accuracy, 25);

        let diffs: Vec<u8> = stats.by_difficulty.iter().map(|d| d.difficulty.value()).collect();
        assert_eq!(diffs, [1, 3]);
        assert_eq!(stats.by_difficulty[1].stats.correct, 2);
    }
}
