use quiz_core::model::{Question, QuestionFilter};
use rand::Rng;
use rand::seq::SliceRandom;

/// How much of the solution the answer key shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerKeyFormat {
    #[default]
    AnswersOnly,
    AnswersWithSteps,
}

/// One block of a worksheet request: `count` problems matching `filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetSection {
    pub filter: QuestionFilter,
    pub count: usize,
}

/// Printable problem set with a separate answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub problems: Vec<Question>,
    pub format: AnswerKeyFormat,
    /// Sections that had fewer matching questions than requested.
    pub short_sections: Vec<usize>,
}

/// Letter for a choice position (`0 -> 'A'`).
#[must_use]
pub fn choice_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'A' + i))
}

impl Worksheet {
    /// Draw problems for every section without repeating a question.
    ///
    /// Choices keep their file order so the printed key stays valid.
    pub fn build<R: Rng + ?Sized>(
        questions: &[Question],
        sections: &[WorksheetSection],
        format: AnswerKeyFormat,
        rng: &mut R,
    ) -> Self {
        let mut problems: Vec<Question> = Vec::new();
        let mut short_sections = Vec::new();

        for (i, section) in sections.iter().enumerate() {
            let mut candidates: Vec<&Question> = questions
                .iter()
                .filter(|q| section.filter.matches(q))
                .filter(|q| problems.iter().all(|p| p.id() != q.id()))
                .collect();
            candidates.shuffle(rng);
            if candidates.len() < section.count {
                short_sections.push(i);
            }
            problems.extend(candidates.into_iter().take(section.count).cloned());
        }

        Self {
            problems,
            format,
            short_sections,
        }
    }

    /// Answer key lines, e.g. `Problem 3: C`.
    #[must_use]
    pub fn answer_key(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (n, q) in self.problems.iter().enumerate() {
            lines.push(format!("Problem {}: {}", n + 1, choice_letter(q.answer_index())));
            if self.format == AnswerKeyFormat::AnswersWithSteps {
                lines.extend(q.solution_steps().iter().map(|s| format!("    {s}")));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Choice, QuestionRecord};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn question(id: &str, topic: &str, answer: usize) -> Question {
        QuestionRecord {
            id: id.into(),
            topic: topic.into(),
            subtopic: "Mixed".into(),
            diff: 2,
            stem: "Pick.".into(),
            choices: vec![
                Choice::new("a", ""),
                Choice::new("b", ""),
                Choice::new("c", ""),
            ],
            answer_index: answer,
            solution_steps: vec!["Step one.".into()],
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn sections_draw_distinct_questions() {
        let questions: Vec<Question> = (0..6)
            .map(|i| question(&format!("A{i}"), "Algebra", i % 3))
            .chain((0..2).map(|i| question(&format!("G{i}"), "Geometry", 0)))
            .collect();
        let sections = [
            WorksheetSection {
                filter: QuestionFilter::all().with_topic("Algebra"),
                count: 4,
            },
            WorksheetSection {
                filter: QuestionFilter::all(),
                count: 4,
            },
        ];
        let mut rng = StdRng::seed_from_u64(9);
        let sheet = Worksheet::build(&questions, &sections, AnswerKeyFormat::AnswersOnly, &mut rng);

        assert_eq!(sheet.problems.len(), 8);
        assert!(sheet.problems[..4].iter().all(|q| q.topic() == "Algebra"));
        let ids: HashSet<_> = sheet.problems.iter().map(|q| q.id().clone()).collect();
        assert_eq!(ids.len(), 8);
        assert!(sheet.short_sections.is_empty());
    }

    #[test]
    fn short_sections_are_reported() {
        let questions = vec![question("G0", "Geometry", 1)];
        let sections = [WorksheetSection {
            filter: QuestionFilter::all(),
            count: 3,
        }];
        let mut rng = StdRng::seed_from_u64(1);
        let sheet = Worksheet::build(
            &questions,
            &sections,
            AnswerKeyFormat::AnswersWithSteps,
            &mut rng,
        );
        assert_eq!(sheet.problems.len(), 1);
        assert_eq!(sheet.short_sections, vec![0]);
        assert_eq!(sheet.answer_key(), vec!["Problem 1: B".to_owned(), "    Step one.".to_owned()]);
    }

    #[test]
    fn letters() {
        assert_eq!(choice_letter(0), 'A');
        assert_eq!(choice_letter(4), 'E');
        assert_eq!(choice_letter(30), '?');
    }
}
