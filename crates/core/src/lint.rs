//! Formatting checks for question content.
//!
//! Bank files are hand-edited and frequently lose the space between two
//! words ("Addednumerators"). Text inside `$...$` math markup is skipped,
//! since variable names like `xY` are legitimate there.

use crate::model::Question;

/// One suspicious spot in a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    /// Field path, e.g. `choices[2].rationale`.
    pub field: String,
    /// The two offending characters.
    pub found: String,
}

impl std::fmt::Display for LintWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: missing space - found \"{}\" (should have space between words)",
            self.field, self.found
        )
    }
}

/// First lowercase→uppercase boundary outside math markup.
fn missing_space(text: &str) -> Option<String> {
    let mut in_math = false;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c == '$' {
            in_math = !in_math;
            prev = None;
            continue;
        }
        if !in_math {
            if let Some(p) = prev {
                if p.is_lowercase() && c.is_uppercase() {
                    return Some(format!("{p}{c}"));
                }
            }
        }
        prev = Some(c);
    }
    None
}

/// Run every check against `question`.
#[must_use]
pub fn lint_question(question: &Question) -> Vec<LintWarning> {
    let mut fields: Vec<(String, &str)> = vec![("stem".to_owned(), question.stem())];
    for (i, choice) in question.choices().iter().enumerate() {
        fields.push((format!("choices[{i}].text"), &choice.text));
        fields.push((format!("choices[{i}].rationale"), &choice.rationale));
    }
    for (i, step) in question.solution_steps().iter().enumerate() {
        fields.push((format!("solutionSteps[{i}]"), step));
    }

    fields
        .into_iter()
        .filter_map(|(field, text)| missing_space(text).map(|found| LintWarning { field, found }))
        .collect()
}
