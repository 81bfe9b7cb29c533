//! Terminal front end: one renderer per `View`, chosen in [`dispatch`].

use std::error::Error;
use std::fmt;

use chrono::Duration;
use quiz_core::lint::lint_question;
use quiz_core::model::{
    ALL_TOPICS, BANKS, Difficulty, PracticePreferences, Question, QuestionFilter, topics,
};
use quiz_core::{SelectionMode, View};
use services::worksheet::choice_letter;
use services::{
    AnswerKeyFormat, AppServices, PracticeError, SessionLimits, Worksheet, WorksheetSection,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Flags shared by every view. Unset fields fall back to saved preferences
/// or defaults.
#[derive(Clone, Default)]
pub struct ViewOptions {
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    pub search: Option<String>,
    /// `Some(None)` clears a saved difficulty filter.
    pub difficulty: Option<Option<Difficulty>>,
    pub mode: Option<SelectionMode>,
    pub count: Option<usize>,
    pub minutes: Option<i64>,
    pub untimed: bool,
    pub with_steps: bool,
    /// Configured admin password; admin views are disabled without one.
    pub admin_password: Option<String>,
    pub entered_password: Option<String>,
}

impl ViewOptions {
    fn filter(&self) -> QuestionFilter {
        let mut filter = QuestionFilter::all();
        if let Some(topic) = &self.topic {
            filter = filter.with_topic(topic.clone());
        }
        if let Some(subtopic) = &self.subtopic {
            filter = filter.with_subtopic(subtopic.clone());
        }
        if let Some(difficulty) = self.difficulty {
            filter = filter.with_difficulty(difficulty);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }
        filter
    }

    fn limits(&self) -> SessionLimits {
        if self.untimed {
            return SessionLimits::unlimited();
        }
        let mut limits = SessionLimits::default();
        if let Some(count) = self.count {
            limits = limits.with_max_questions(Some(count));
        }
        if let Some(minutes) = self.minutes {
            limits = limits.with_time_limit(Some(Duration::minutes(minutes)));
        }
        limits
    }
}

#[derive(Debug)]
enum AccessError {
    AdminDisabled,
    WrongPassword,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::AdminDisabled => {
                write!(f, "admin views are disabled (set ACT_REVIEW_ADMIN_PASSWORD)")
            }
            AccessError::WrongPassword => write!(f, "admin password required (--password)"),
        }
    }
}

impl Error for AccessError {}

#[derive(Debug)]
struct LintFailed(usize);

impl fmt::Display for LintFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} content problem(s) found", self.0)
    }
}

impl Error for LintFailed {}

fn check_admin(options: &ViewOptions) -> Result<(), AccessError> {
    let expected = options
        .admin_password
        .as_deref()
        .ok_or(AccessError::AdminDisabled)?;
    match options.entered_password.as_deref() {
        Some(entered) if entered == expected => Ok(()),
        _ => Err(AccessError::WrongPassword),
    }
}

/// Render `view`. The only place that maps views to screens.
///
/// # Errors
///
/// Returns access errors for admin views and any service error raised while
/// rendering.
pub async fn dispatch(
    view: View,
    services: &AppServices,
    options: &ViewOptions,
) -> Result<(), Box<dyn Error>> {
    if view.requires_admin() {
        check_admin(options)?;
    }
    match view {
        View::Welcome => welcome(services),
        View::Practice => practice(services, options).await,
        View::Dashboard => dashboard(services),
        View::Profile => profile(services),
        View::Teacher => teacher(services, options),
        View::AdminReview => admin_review(services, options),
        View::Auth | View::ResetPassword | View::AdminUsers => {
            hosted_only(view);
            Ok(())
        }
    }
}

//
// ─── WELCOME ───────────────────────────────────────────────────────────────────
//

fn welcome(services: &AppServices) -> Result<(), Box<dyn Error>> {
    let questions = services.questions();
    println!("ACT Math Review");
    println!("{} questions across {} banks.", questions.len(), BANKS.len());
    println!();
    for topic in topics(&questions) {
        let count = questions.iter().filter(|q| q.topic() == topic).count();
        println!("  {topic:<28} {count:>4}");
    }
    for failure in services.bank_failures() {
        println!("  (bank {} unavailable: {})", failure.key, failure.reason);
    }
    println!();
    println!("Start practicing:  act-review practice [--topic <name>] [--mode shuffled]");
    println!("See your progress: act-review dashboard");
    Ok(())
}

//
// ─── PRACTICE ──────────────────────────────────────────────────────────────────
//

/// A letter (`A`, `b`) or 1-based number, checked against `len` choices.
fn parse_choice(line: &str, len: usize) -> Option<usize> {
    let line = line.trim();
    let mut chars = line.chars();
    let first = chars.next()?;
    let index = if chars.next().is_none() && first.is_ascii_alphabetic() {
        usize::from(first.to_ascii_uppercase() as u8 - b'A')
    } else {
        line.parse::<usize>().ok()?.checked_sub(1)?
    };
    (index < len).then_some(index)
}

async fn practice(services: &AppServices, options: &ViewOptions) -> Result<(), Box<dyn Error>> {
    let practice = services.practice();
    let saved = practice.preferences().await?;
    let prefs = PracticePreferences {
        topic: options.topic.clone().unwrap_or(saved.topic),
        difficulty: options.difficulty.unwrap_or(saved.difficulty),
        mode: options.mode.unwrap_or(saved.mode),
    };
    let practice = (*practice).clone().with_limits(options.limits());

    let mut session = match practice.start_session(&prefs).await {
        Ok(session) => session,
        Err(PracticeError::EmptyPool) => {
            println!("No questions match topic {:?} at that difficulty.", prefs.topic);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    println!(
        "Practicing {} ({} questions, {} order). Answer with a letter, q to stop.",
        if prefs.topic == ALL_TOPICS { "all topics" } else { prefs.topic.as_str() },
        session.pool_size(),
        prefs.mode
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    'questions: loop {
        let Some(shown) = practice.present_next(&mut session)? else {
            break;
        };
        let question = shown.question().clone();
        let choices = shown.choices().to_vec();

        println!();
        println!("[{}] {} - {}", question.id(), question.subtopic(), question.difficulty());
        println!("{}", question.stem());
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}) {}", choice_letter(i), choice.text);
        }
        if let Some(left) = practice.remaining_time(&session) {
            println!("  ({}:{:02} left)", left.num_minutes(), left.num_seconds() % 60);
        }

        let last = choice_letter(choices.len().saturating_sub(1));
        let feedback = loop {
            let Some(line) = lines.next_line().await? else {
                break 'questions;
            };
            if line.trim().eq_ignore_ascii_case("q") {
                break 'questions;
            }
            let Some(index) = parse_choice(&line, choices.len()) else {
                println!("Pick A-{last}.");
                continue;
            };
            match practice.answer_current(&mut session, index).await {
                Err(PracticeError::ChoiceOutOfRange { .. }) => println!("Pick A-{last}."),
                other => break other,
            }
        };

        match feedback {
            Ok(feedback) => {
                if feedback.record.correct {
                    println!("Correct. {}", feedback.chosen.rationale);
                } else {
                    println!(
                        "Not quite. {} The answer is {}) {}.",
                        feedback.chosen.rationale,
                        choice_letter(feedback.record.correct_index),
                        feedback.correct_choice.text
                    );
                    for step in &feedback.solution_steps {
                        println!("  - {step}");
                    }
                }
            }
            Err(PracticeError::TimeUp) => {
                println!("Time is up.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let summary = practice.finish(&mut session);
    println!();
    println!(
        "Session over: {}/{} correct ({}%) in {}m {:02}s.",
        summary.correct,
        summary.answered,
        summary.accuracy,
        summary.elapsed.num_minutes(),
        summary.elapsed.num_seconds() % 60
    );
    Ok(())
}

//
// ─── DASHBOARD / PROFILE ───────────────────────────────────────────────────────
//

fn dashboard(services: &AppServices) -> Result<(), Box<dyn Error>> {
    if !services.progress().is_online() {
        println!("Not signed in: showing progress stored on this device.");
    }
    let stats = services.dashboard().stats()?;
    println!(
        "Answered {} of {} questions, {} correct / {} wrong, accuracy {}%.",
        stats.total_answered,
        stats.total_questions,
        stats.total_correct,
        stats.total_wrong,
        stats.overall_accuracy
    );
    println!();
    println!("By topic:");
    for topic in &stats.by_topic {
        println!(
            "  {:<28} {:>4} questions {:>4}%",
            topic.topic, topic.stats.total, topic.stats.accuracy
        );
    }
    println!("By difficulty:");
    for level in &stats.by_difficulty {
        println!(
            "  {:<28} {:>4} questions {:>4}%",
            level.difficulty.to_string(),
            level.stats.total,
            level.stats.accuracy
        );
    }
    if let Some(weakest) = services.dashboard().weakest_topic()? {
        println!();
        println!("Suggested focus: {}", weakest.topic);
    }
    Ok(())
}

fn profile(services: &AppServices) -> Result<(), Box<dyn Error>> {
    let progress = services.progress();
    match progress.user() {
        Some(user) => println!("Signed in as {user}."),
        None => println!("Not signed in; progress stays on this device."),
    }
    println!("{} questions with recorded progress.", progress.snapshot()?.len());
    let pending = progress.pending()?;
    if !pending.is_empty() {
        println!("{} answers waiting to sync.", pending.len());
    }
    Ok(())
}

fn hosted_only(view: View) {
    println!(
        "The {view} screen is handled by the hosted account service. Sign in there and set \
         ACT_REVIEW_ACCESS_TOKEN and ACT_REVIEW_USER_ID to sync progress here."
    );
}

//
// ─── TEACHER / ADMIN ───────────────────────────────────────────────────────────
//

fn print_question(n: usize, question: &Question) {
    println!("{n}. {}", question.stem());
    for (i, choice) in question.choices().iter().enumerate() {
        println!("   {}) {}", choice_letter(i), choice.text);
    }
}

fn teacher(services: &AppServices, options: &ViewOptions) -> Result<(), Box<dyn Error>> {
    let questions = services.questions();
    let sections = [WorksheetSection {
        filter: options.filter(),
        count: options.count.unwrap_or(10),
    }];
    let format = if options.with_steps {
        AnswerKeyFormat::AnswersWithSteps
    } else {
        AnswerKeyFormat::AnswersOnly
    };
    let sheet = Worksheet::build(&questions, &sections, format, &mut rand::rng());
    if sheet.problems.is_empty() {
        println!("No questions match those filters.");
        return Ok(());
    }
    if !sheet.short_sections.is_empty() {
        println!("(Only {} matching questions available.)", sheet.problems.len());
    }

    println!("Worksheet");
    println!();
    for (i, question) in sheet.problems.iter().enumerate() {
        print_question(i + 1, question);
        println!();
    }
    println!("Answer Key");
    for line in sheet.answer_key() {
        println!("{line}");
    }
    Ok(())
}

fn admin_review(services: &AppServices, options: &ViewOptions) -> Result<(), Box<dyn Error>> {
    let questions = options.filter().apply(&services.questions());
    println!("{} questions match.", questions.len());
    for (n, question) in questions.iter().enumerate() {
        println!();
        println!(
            "{} | {} / {} | {}",
            question.id(),
            question.topic(),
            question.subtopic(),
            question.difficulty()
        );
        print_question(n + 1, question);
        println!("   answer: {}", choice_letter(question.answer_index()));
        for warning in lint_question(question) {
            println!("   ! {warning}");
        }
    }
    Ok(())
}

/// Check every loaded question for formatting problems.
///
/// # Errors
///
/// Returns an error naming the problem count when any bank failed to load or
/// any question has warnings.
pub fn lint(services: &AppServices) -> Result<(), Box<dyn Error>> {
    let mut problems = 0;
    for failure in services.bank_failures() {
        println!("bank {}: {}", failure.key, failure.reason);
        problems += 1;
    }
    for question in services.questions().iter() {
        for warning in lint_question(question) {
            println!("{}: {warning}", question.id());
            problems += 1;
        }
    }
    if problems == 0 {
        println!("All {} questions look good.", services.questions().len());
        Ok(())
    } else {
        Err(Box::new(LintFailed(problems)))
    }
}
