//! `quiz`: run flashcard quizzes in the terminal.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use quiz_core::model::{Card, GroupId};
use services::{Clock, Presenter, PrimaryAction, QuizEngine, QuizStart, SelectedGroup};
use storage::repository::Storage;

mod console;

use console::{ConsolePresenter, JsonLinesPresenter};

#[derive(Parser)]
#[command(name = "quiz", version, about = "Flashcard quiz with mastery streaks")]
struct Cli {
    /// SQLite database holding paused progress
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    db_url: String,

    /// Group the quiz runs over
    #[arg(long, env = "QUIZ_GROUP_ID")]
    group_id: GroupId,

    /// JSON array of `{id?, question, answer}` cards for the group
    #[arg(long, env = "QUIZ_CARDS")]
    cards: Option<PathBuf>,

    /// Shuffle card order on a fresh start
    #[arg(long)]
    shuffle: bool,

    /// Emit quiz events as JSON lines instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Start a new quiz, discarding any paused one
    Start,
    /// Continue the paused quiz for this group
    Resume,
    /// Show whether a paused quiz exists for this group
    Status,
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

fn load_cards(path: Option<&Path>) -> anyhow::Result<Vec<Card>> {
    let Some(path) = path else {
        bail!("--cards (or QUIZ_CARDS) is required for this command");
    };
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cards: Vec<Card> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    cards
        .into_iter()
        .enumerate()
        .map(|(i, card)| {
            Card::new(card.id, card.question, card.answer)
                .with_context(|| format!("card #{} in {}", i + 1, path.display()))
        })
        .collect()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prompt(action: Option<PrimaryAction>) {
    let marker = match action {
        Some(PrimaryAction::Check) => "> ",
        Some(PrimaryAction::Retry | PrimaryAction::Advance) => "[Enter] ",
        None => return,
    };
    let mut stdout = std::io::stdout();
    if let Err(err) = write!(stdout, "{marker}").and_then(|()| stdout.flush()) {
        tracing::debug!(error = %err, "failed to write prompt");
    }
}

async fn drive(engine: &mut QuizEngine) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while engine.is_active() {
        prompt(engine.primary_action());
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            tracing::debug!("stdin closed; ending quiz without saving");
            engine.force_end();
            break;
        };

        let result = match line.trim() {
            ":pause" => engine.pause().await,
            ":quit" => {
                engine.force_end();
                Ok(())
            }
            _ => engine.submit(&line).await.map(|_| ()),
        };
        // Failures were already shown through the presenter.
        if let Err(err) = result {
            tracing::debug!(error = %err, "quiz command rejected");
        }
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let db_url = normalize_sqlite_url(&cli.db_url);

    // The database file must exist before sqlx opens it.
    prepare_sqlite_file(&db_url)?;
    let storage = Storage::sqlite(&db_url)
        .await
        .with_context(|| format!("opening {db_url}"))?;

    let presenter: Arc<dyn Presenter> = if cli.json {
        Arc::new(JsonLinesPresenter)
    } else {
        Arc::new(ConsolePresenter)
    };
    let groups = Arc::new(SelectedGroup::new(Some(cli.group_id)));
    let mut engine = QuizEngine::new(Clock::system(), storage.progress, groups, presenter)
        .with_shuffle(cli.shuffle);

    match cli.command {
        Command::Start => {
            let cards = load_cards(cli.cards.as_deref())?;
            engine.start(QuizStart::Fresh(cards)).await?;
            drive(&mut engine).await
        }
        Command::Resume => {
            let cards = load_cards(cli.cards.as_deref())?;
            engine.restore(&cards).await?;
            drive(&mut engine).await
        }
        Command::Status => {
            match engine.saved_progress().await? {
                Some(summary) => {
                    let saved = summary
                        .saved_at
                        .map_or_else(|| "unknown time".to_owned(), |at| at.to_rfc3339());
                    println!(
                        "Resume quiz ({}/{} mastered), paused at {saved}",
                        summary.mastered, summary.total
                    );
                }
                None => println!("No paused quiz for group {}.", cli.group_id),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
