use std::fmt;
use std::path::PathBuf;

use quiz_core::model::ProgressMap;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    input: PathBuf,
    replace: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingInput,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingInput => write!(f, "--input is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ACT_REVIEW_DB_URL")
            .unwrap_or_else(|_| "sqlite://act-review.sqlite3?mode=rwc".into());
        let mut input: Option<PathBuf> = None;
        let mut replace = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--input" | "-i" => {
                    input = Some(PathBuf::from(require_value(&mut args, "--input")?));
                }
                "--replace" => replace = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            input: input.ok_or(ArgsError::MissingInput)?,
            replace,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin import_progress -- --input <file> [options]");
    eprintln!();
    eprintln!("Imports a progress export ({{\"<questionId>\": {{correct, wrong, lastAt}}}})");
    eprintln!("into the local progress cache.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --input <file>        JSON progress export to read");
    eprintln!(
        "  --db <sqlite_url>         SQLite URL (default: sqlite://act-review.sqlite3?mode=rwc)"
    );
    eprintln!("  --replace                 Drop existing cache entries instead of merging");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  ACT_REVIEW_DB_URL");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let raw = tokio::fs::read_to_string(&args.input).await?;
    let imported: ProgressMap = serde_json::from_str(&raw)?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let next = if args.replace {
        imported.clone()
    } else {
        // Imported entries win, like a fresh server copy would.
        quiz_core::model::progress::merge(&storage.progress.load_progress().await?, &imported)
    };
    storage.progress.replace_progress(&next).await?;

    println!(
        "Imported {} entries from {} into {} ({} total)",
        imported.len(),
        args.input.display(),
        args.db_url,
        next.len()
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
