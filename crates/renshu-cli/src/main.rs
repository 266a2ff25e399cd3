//! Renshu CLI
//!
//! Command-line driver for the review engine over the SQLite store.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;
use renshu_core::{
    format_interval, Difficulty, ItemKind, LearnerId, Priority, ResultInput, ReviewQueue,
    ReviewQueueEntry, ReviewSessions, SqliteStore, SrsCalculator, SrsConfig, SystemClock,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type Queue = ReviewQueue<SqliteStore>;

/// Renshu - spaced repetition review queue
#[derive(Parser)]
#[command(name = "renshu")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spaced repetition review queue for kanji, vocabulary, grammar and kana")]
struct Cli {
    /// Directory holding renshu.db (defaults to the platform data directory)
    #[arg(long, global = true, env = "RENSHU_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON file with the interval table
    #[arg(long, global = true, env = "RENSHU_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule an item for review
    Enqueue {
        #[arg(long)]
        learner: LearnerId,
        /// kanji, vocabulary, grammar or kana
        #[arg(long)]
        kind: ItemKind,
        #[arg(long)]
        item: i64,
        /// Due time (RFC 3339); defaults to one day from now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List due reviews, most urgent first
    Due {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List reviews coming up in the next few days
    Upcoming {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long, default_value = "7")]
        days: i64,
    },

    /// Grade a review outside a session
    Complete {
        entry: Uuid,
        /// The answer was wrong
        #[arg(long)]
        wrong: bool,
        /// easy, normal or hard
        #[arg(long, default_value = "normal")]
        difficulty: Difficulty,
    },

    /// Show queue counts and per-kind progress
    Stats {
        #[arg(long)]
        learner: LearnerId,
    },

    /// Show the mastery record of one item
    Progress {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        kind: ItemKind,
        #[arg(long)]
        item: i64,
    },

    /// Recompute priorities of open reviews
    Refresh {
        #[arg(long)]
        learner: LearnerId,
    },

    /// Show the projected schedule from a level
    Schedule {
        #[arg(long, default_value = "0")]
        level: u32,
        #[arg(long, default_value = "5")]
        count: usize,
    },

    /// Review sessions
    #[command(subcommand)]
    Session(SessionCommands),

    /// Copy the database to a file
    Backup {
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Open a session
    Start {
        #[arg(long)]
        learner: LearnerId,
    },
    /// Record a graded answer
    Record {
        session: Uuid,
        entry: Uuid,
        #[arg(long)]
        wrong: bool,
        #[arg(long, default_value = "normal")]
        difficulty: Difficulty,
        #[arg(long, default_value = "0")]
        latency_ms: u32,
        #[arg(long, default_value = "")]
        answer: String,
        #[arg(long, default_value = "")]
        expected: String,
    },
    /// Close a session
    End {
        session: Uuid,
    },
    /// Show a session and its results
    Show {
        session: Uuid,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let queue = open_queue(cli.data_dir.clone(), cli.config.clone())?;
    let json = cli.json;

    match cli.command {
        Commands::Enqueue {
            learner,
            kind,
            item,
            at,
        } => run_enqueue(&queue, learner, kind, item, at, json),
        Commands::Due { learner, limit } => run_due(&queue, learner, limit, json),
        Commands::Upcoming { learner, days } => run_upcoming(&queue, learner, days, json),
        Commands::Complete {
            entry,
            wrong,
            difficulty,
        } => run_complete(&queue, entry, !wrong, difficulty, json),
        Commands::Stats { learner } => run_stats(&queue, learner, json),
        Commands::Progress {
            learner,
            kind,
            item,
        } => run_progress(&queue, learner, kind, item, json),
        Commands::Refresh { learner } => run_refresh(&queue, learner),
        Commands::Schedule { level, count } => run_schedule(&queue, level, count, json),
        Commands::Session(cmd) => run_session(queue, cmd, json),
        Commands::Backup { output } => run_backup(&queue, output),
    }
}

/// Load the SRS configuration: explicit path, then the platform config dir, then defaults
fn load_config(path: Option<PathBuf>) -> anyhow::Result<SrsConfig> {
    let path = path.or_else(|| {
        ProjectDirs::from("com", "renshu", "core")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .filter(|p| p.exists())
    });

    match path {
        Some(p) => SrsConfig::from_path(&p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(SrsConfig::default()),
    }
}

fn open_queue(data_dir: Option<PathBuf>, config: Option<PathBuf>) -> anyhow::Result<Arc<Queue>> {
    let db_path = data_dir.map(|dir| dir.join("renshu.db"));
    let store = SqliteStore::new(db_path).context("Failed to open the review database")?;
    let calculator = SrsCalculator::new(load_config(config)?)?;
    Ok(Arc::new(ReviewQueue::new(
        Arc::new(store),
        calculator,
        Arc::new(SystemClock),
    )))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn colored_priority(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::Critical => priority.as_str().red().bold(),
        Priority::High => priority.as_str().yellow(),
        Priority::Medium => priority.as_str().cyan(),
        Priority::Low => priority.as_str().dimmed(),
    }
}

fn print_entries(entries: &[ReviewQueueEntry], now: DateTime<Utc>) {
    if entries.is_empty() {
        println!("{}", "Nothing scheduled.".dimmed());
        return;
    }
    for entry in entries {
        let overdue = entry.days_overdue(now);
        let when = if overdue > 0 {
            format!("{}d overdue", overdue).red().to_string()
        } else {
            entry.scheduled_at.format("%Y-%m-%d %H:%M").to_string()
        };
        println!(
            "  {} {:10} {:>8} #{:<6} L{} {}",
            entry.id.to_string().dimmed(),
            colored_priority(entry.priority),
            entry.kind().as_str(),
            entry.item_id(),
            entry.mastery_level,
            when
        );
    }
}

fn run_enqueue(
    queue: &Queue,
    learner: LearnerId,
    kind: ItemKind,
    item: i64,
    at: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    let entry = queue.enqueue(learner, kind, item, at)?;
    if json {
        return print_json(&entry);
    }
    println!(
        "{} {} #{} due {}",
        "Scheduled".green().bold(),
        kind.as_str(),
        item,
        entry.scheduled_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}: {}", "Entry".white().bold(), entry.id);
    Ok(())
}

fn run_due(queue: &Queue, learner: LearnerId, limit: usize, json: bool) -> anyhow::Result<()> {
    let due = queue.due_entries(learner, limit)?;
    if json {
        return print_json(&due);
    }
    println!("{}", format!("=== Due for learner {} ===", learner).cyan().bold());
    print_entries(&due, queue.now());
    Ok(())
}

fn run_upcoming(queue: &Queue, learner: LearnerId, days: i64, json: bool) -> anyhow::Result<()> {
    let upcoming = queue.upcoming_entries(learner, days)?;
    if json {
        return print_json(&upcoming);
    }
    println!(
        "{}",
        format!("=== Next {} days for learner {} ===", days, learner).cyan().bold()
    );
    print_entries(&upcoming, queue.now());
    Ok(())
}

fn run_complete(
    queue: &Queue,
    entry: Uuid,
    was_correct: bool,
    difficulty: Difficulty,
    json: bool,
) -> anyhow::Result<()> {
    let Some(outcome) = queue.complete_with_outcome(entry, was_correct, difficulty)? else {
        anyhow::bail!("No open review with id {}", entry);
    };
    if json {
        return print_json(&outcome);
    }

    let verdict = if was_correct {
        "Correct".green().bold()
    } else {
        "Incorrect".red().bold()
    };
    println!("{} -> level {}", verdict, outcome.new_level);
    match &outcome.successor {
        Some(next) => println!(
            "{}: {} ({}, {})",
            "Next review".white().bold(),
            next.scheduled_at.format("%Y-%m-%d %H:%M"),
            format_interval((next.scheduled_at - queue.now()).num_days()),
            colored_priority(next.priority)
        ),
        None => println!("{}", "Mastered: item leaves the queue".green()),
    }
    Ok(())
}

fn run_stats(queue: &Queue, learner: LearnerId, json: bool) -> anyhow::Result<()> {
    let stats = queue.stats(learner);
    let study = queue.study_statistics(learner);
    if json {
        return print_json(&serde_json::json!({
            "queue": stats.to_category_map(),
            "study": study.to_category_map(),
        }));
    }

    println!("{}", format!("=== Learner {} ===", learner).cyan().bold());
    println!();
    println!("{}: {}", "Due Today".white().bold(), stats.due_today);
    println!("{}: {}", "Overdue".white().bold(), stats.overdue);
    println!("{}: {}", "Upcoming (7d)".white().bold(), stats.upcoming);

    println!();
    println!("{}", "=== By Kind ===".yellow().bold());
    for kind in ItemKind::ALL {
        let progress = study.kind(kind);
        let due = stats.due_by_kind.get(&kind).copied().unwrap_or(0);
        println!(
            "  {:12} due {:>4}   learned {:>4} / {:<4}",
            kind.label(),
            due,
            progress.learned,
            progress.total
        );
    }
    Ok(())
}

fn run_progress(
    queue: &Queue,
    learner: LearnerId,
    kind: ItemKind,
    item: i64,
    json: bool,
) -> anyhow::Result<()> {
    let Some(progress) = queue.progress(learner, kind, item)? else {
        anyhow::bail!("Learner {} has never studied {} #{}", learner, kind.as_str(), item);
    };
    let stats = queue.calculator().stats(
        progress.correct_count,
        progress.incorrect_count,
        progress.mastery_level,
    );
    if json {
        return print_json(&serde_json::json!({ "progress": progress, "stats": stats }));
    }

    println!("{}", format!("=== {} #{} ===", kind.label(), item).cyan().bold());
    println!("{}: {} ({})", "Level".white().bold(), stats.current_level, stats.mastery_label);
    println!(
        "{}: {}/{} ({:.1}%)",
        "Correct".white().bold(),
        stats.correct_reviews,
        stats.total_reviews,
        stats.retention_rate
    );
    println!(
        "{}: {}",
        "Next Review".white().bold(),
        progress.next_review_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}: {}", "Interval".white().bold(), format_interval(stats.next_review_days));
    if let Some(last) = progress.last_reviewed_at {
        println!("{}: {}", "Last Reviewed".white().bold(), last.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

fn run_refresh(queue: &Queue, learner: LearnerId) -> anyhow::Result<()> {
    let changed = queue.refresh_priorities(learner)?;
    println!("{} {} priorities", "Updated".green().bold(), changed);
    Ok(())
}

fn run_schedule(queue: &Queue, level: u32, count: usize, json: bool) -> anyhow::Result<()> {
    let now = queue.now();
    let dates = queue.calculator().upcoming_review_dates(level, count, now);
    if json {
        return print_json(&dates);
    }
    println!("{}", format!("=== Schedule from level {} ===", level).cyan().bold());
    for (step, date) in dates.iter().enumerate() {
        let gap = (*date - now).num_days();
        println!(
            "  {:>2}. {}  (+{})",
            step + 1,
            date.format("%Y-%m-%d"),
            format_interval(gap)
        );
    }
    Ok(())
}

fn run_session(queue: Arc<Queue>, cmd: SessionCommands, json: bool) -> anyhow::Result<()> {
    let sessions = ReviewSessions::new(queue);
    match cmd {
        SessionCommands::Start { learner } => {
            let session = sessions.start(learner)?;
            if json {
                return print_json(&session);
            }
            println!("{} {}", "Session started".green().bold(), session.id);
        }
        SessionCommands::Record {
            session,
            entry,
            wrong,
            difficulty,
            latency_ms,
            answer,
            expected,
        } => {
            let input = ResultInput::new(entry, !wrong)
                .with_difficulty(difficulty)
                .with_latency(latency_ms)
                .with_answers(answer, expected);
            let result = sessions.record_result(session, input)?;
            if json {
                return print_json(&result);
            }
            let verdict = if result.is_correct {
                "correct".green()
            } else {
                "incorrect".red()
            };
            println!("{} {} ({})", "Recorded".green().bold(), result.entry_id, verdict);
        }
        SessionCommands::End { session } => {
            if !sessions.end(session)? {
                anyhow::bail!("No session with id {}", session);
            }
            println!("{} {}", "Session ended".green().bold(), session);
        }
        SessionCommands::Show { session } => {
            let Some(found) = sessions.get(session)? else {
                anyhow::bail!("No session with id {}", session);
            };
            if json {
                return print_json(&found);
            }
            let now = sessions.queue().now();
            let status = if found.is_ended() {
                "ended".dimmed()
            } else {
                "open".green()
            };
            println!("{}", format!("=== Session {} ===", found.id).cyan().bold());
            println!("{}: {}", "Status".white().bold(), status);
            println!("{}: {}", "Items".white().bold(), found.items_reviewed);
            println!("{}: {:.1}%", "Accuracy".white().bold(), found.accuracy_rate());
            println!(
                "{}: {}m {}s",
                "Duration".white().bold(),
                found.duration(now).num_minutes(),
                found.duration(now).num_seconds() % 60
            );
            if let Some(avg) = found.average_response_time_ms() {
                println!("{}: {:.0}ms", "Avg Response".white().bold(), avg);
            }
            for result in &found.results {
                let mark = if result.is_correct { "o".green() } else { "x".red() };
                println!(
                    "  {} {} {} {}",
                    mark,
                    result.reviewed_at.format("%H:%M:%S"),
                    result.entry_id.to_string().dimmed(),
                    result.difficulty
                );
            }
        }
    }
    Ok(())
}

fn run_backup(queue: &Queue, output: PathBuf) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    queue.store().backup_to(&output)?;
    println!("{} {}", "Backup written to".green().bold(), output.display());
    Ok(())
}
