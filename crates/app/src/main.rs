use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use quiz_core::model::Difficulty;
use quiz_core::{SelectionMode, View};
use services::{AppServices, BackendConfig, Clock, DEFAULT_SYNC_PERIOD};
use tokio::sync::watch;
use tracing::{debug, info};

mod views;

use views::ViewOptions;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidDifficulty { raw: String },
    InvalidMode { raw: String },
    InvalidCount { raw: String },
    InvalidMinutes { raw: String },
    InvalidSyncSecs { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown view or command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value (expected 1-5 or all): {raw}")
            }
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value (expected sequential, shuffled or random): {raw}")
            }
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidMinutes { raw } => write!(f, "invalid --minutes value: {raw}"),
            ArgsError::InvalidSyncSecs { raw } => {
                write!(f, "invalid ACT_REVIEW_SYNC_SECS value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Show(View),
    Sync,
    Lint,
}

impl Command {
    fn from_arg(arg: &str) -> Result<Self, ArgsError> {
        match arg {
            "sync" => Ok(Self::Sync),
            "lint" => Ok(Self::Lint),
            other => other
                .parse::<View>()
                .map(Self::Show)
                .map_err(|_| ArgsError::UnknownCommand(other.to_owned())),
        }
    }
}

struct Args {
    command: Command,
    db_url: String,
    content_dir: PathBuf,
    sync_period: Duration,
    options: ViewOptions,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  act-review [view] [options]");
    eprintln!("  act-review sync   [--db <sqlite_url>]");
    eprintln!("  act-review lint   [--content <dir>]");
    eprintln!();
    eprintln!("Views (name or query form, e.g. `dashboard` or `?dashboard`):");
    eprintln!("  welcome, practice, dashboard, profile, auth, reset-password,");
    eprintln!("  teacher, admin, admin-users (`?admin=users`)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://act-review.sqlite3)");
    eprintln!(
        "  --content <dir>           Question bank directory (default: public/content/questions)"
    );
    eprintln!("  --topic <name>            Topic filter (default: All)");
    eprintln!("  --subtopic <name>         Subtopic filter (teacher/admin)");
    eprintln!("  --difficulty <1-5|all>    Difficulty filter");
    eprintln!("  --mode <mode>             sequential, shuffled or random");
    eprintln!("  --search <text>           Search id/stem/subtopic (admin)");
    eprintln!("  --count <n>               Questions per session or worksheet (default: 10)");
    eprintln!("  --minutes <n>             Session time limit (default: 12)");
    eprintln!("  --untimed                 No time or question limit");
    eprintln!("  --steps                   Include solution steps in the answer key");
    eprintln!("  --password <text>         Admin password");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ACT_REVIEW_DB_URL, ACT_REVIEW_CONTENT_DIR, ACT_REVIEW_SYNC_SECS,");
    eprintln!("  ACT_REVIEW_SUPABASE_URL, ACT_REVIEW_SUPABASE_ANON_KEY,");
    eprintln!("  ACT_REVIEW_ACCESS_TOKEN, ACT_REVIEW_USER_ID, ACT_REVIEW_ADMIN_PASSWORD");
    eprintln!("  RUST_LOG (default: info)");
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ACT_REVIEW_DB_URL")
            .ok()
            .map_or_else(
                || normalize_sqlite_url("act-review.sqlite3".into()),
                normalize_sqlite_url,
            );
        let mut content_dir = std::env::var("ACT_REVIEW_CONTENT_DIR")
            .map_or_else(|_| PathBuf::from("public/content/questions"), PathBuf::from);
        let sync_period = match std::env::var("ACT_REVIEW_SYNC_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ArgsError::InvalidSyncSecs { raw })?,
            Err(_) => DEFAULT_SYNC_PERIOD,
        };
        let mut options = ViewOptions {
            admin_password: std::env::var("ACT_REVIEW_ADMIN_PASSWORD")
                .ok()
                .filter(|p| !p.is_empty()),
            ..ViewOptions::default()
        };

        let mut args = argv.into_iter().peekable();
        let command = match args.peek() {
            Some(first) if !first.starts_with('-') => {
                let command = Command::from_arg(first)?;
                args.next();
                command
            }
            _ => Command::Show(View::Welcome),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => content_dir = PathBuf::from(require_value(&mut args, "--content")?),
                "--topic" => options.topic = Some(require_value(&mut args, "--topic")?),
                "--subtopic" => options.subtopic = Some(require_value(&mut args, "--subtopic")?),
                "--search" => options.search = Some(require_value(&mut args, "--search")?),
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    options.difficulty = Some(parse_difficulty(&value)?);
                }
                "--mode" => {
                    let value = require_value(&mut args, "--mode")?;
                    let mode = value
                        .parse::<SelectionMode>()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                    options.mode = Some(mode);
                }
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    let count = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidCount { raw: value.clone() })?;
                    options.count = Some(count);
                }
                "--minutes" => {
                    let value = require_value(&mut args, "--minutes")?;
                    let minutes = value
                        .parse::<i64>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidMinutes { raw: value.clone() })?;
                    options.minutes = Some(minutes);
                }
                "--untimed" => options.untimed = true,
                "--steps" => options.with_steps = true,
                "--password" => {
                    options.entered_password = Some(require_value(&mut args, "--password")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            command,
            db_url,
            content_dir,
            sync_period,
            options,
        })
    }
}

/// `Some(None)` is the explicit "all difficulties" filter.
fn parse_difficulty(raw: &str) -> Result<Option<Difficulty>, ArgsError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("all") || trimmed == "0" {
        return Ok(None);
    }
    trimmed
        .parse::<u8>()
        .ok()
        .and_then(|v| Difficulty::new(v).ok())
        .map(Some)
        .ok_or_else(|| ArgsError::InvalidDifficulty {
            raw: raw.to_owned(),
        })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup; the services below only see the traits.
    prepare_sqlite_file(&args.db_url)?;
    let backend = BackendConfig::from_env();
    debug!(?backend, db = %args.db_url, content = %args.content_dir.display(), "starting");

    let services =
        AppServices::new_sqlite(&args.db_url, &args.content_dir, Clock::system(), backend.as_ref())
            .await?;

    match args.command {
        Command::Sync => {
            let report = services.sync_now().await?;
            println!(
                "Synced: fetched {}, pushed {}, {} entries stored locally.",
                report.fetched, report.pushed, report.total
            );
            Ok(())
        }
        Command::Lint => views::lint(&services),
        Command::Show(view) => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let sync_task = services.spawn_sync(args.sync_period, shutdown_rx);

            let result = views::dispatch(view, &services, &args.options).await;

            let _ = shutdown_tx.send(true);
            if let Some(task) = sync_task {
                let _ = task.await;
            }
            if services.progress().is_online() {
                match services.sync_now().await {
                    Ok(report) => info!(pushed = report.pushed, "final progress sync done"),
                    Err(err) => tracing::warn!(error = %err, "final progress sync failed"),
                }
            }
            result
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn no_arguments_shows_welcome() {
        let args = Args::parse(Vec::new()).unwrap();
        assert_eq!(args.command, Command::Show(View::Welcome));
    }

    #[test]
    fn query_form_selects_view() {
        let args = Args::parse(argv(&["?admin=users"])).unwrap();
        assert_eq!(args.command, Command::Show(View::AdminUsers));
        let args =
            Args::parse(argv(&["practice", "--topic", "Algebra", "--mode", "random"])).unwrap();
        assert_eq!(args.command, Command::Show(View::Practice));
        assert_eq!(args.options.topic.as_deref(), Some("Algebra"));
        assert_eq!(args.options.mode, Some(SelectionMode::Random));
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(
            Args::parse(argv(&["bogus"])),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            Args::parse(argv(&["--difficulty", "9"])),
            Err(ArgsError::InvalidDifficulty { .. })
        ));
        assert!(matches!(
            Args::parse(argv(&["--count"])),
            Err(ArgsError::MissingValue { flag: "--count" })
        ));
    }

    #[test]
    fn difficulty_all_clears_filter() {
        assert_eq!(parse_difficulty("all").unwrap(), None);
        assert_eq!(parse_difficulty("3").unwrap().map(Difficulty::value), Some(3));
    }

    #[test]
    fn sqlite_urls_are_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert!(normalize_sqlite_url("dev.sqlite3".into()).starts_with("sqlite:///"));
    }
}
