//! Study Quest CLI
//!
//! Drives a quest session over a directory-backed store

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use sq_cli::{
    format_event, format_popup, format_quest, open_store, parse_attribute, parse_subject,
    parse_timestamp, render_status, resolve_email, resolve_now, simulate, simulation_end,
    PASSWORD_ENV,
};
#[cfg(feature = "cli")]
use sq_core::{EngineConfig, FileStore, QuestDraft, Session};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "sq")]
#[command(about = "Turn study tasks into quests and level up", long_about = None)]
struct Cli {
    /// Directory holding the JSON store
    #[arg(long, global = true, default_value = ".studyquest")]
    data_dir: PathBuf,

    /// Account email (defaults to the last login)
    #[arg(long, global = true)]
    email: Option<String>,

    /// Account password; unknown emails are registered
    #[arg(long, global = true, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,

    /// Pretend the current time is this RFC 3339 timestamp
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Show level, stats and quests
    Status {
        /// Print the quest list as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Generate random quests
    Generate {
        #[arg(long, default_value = "1")]
        count: usize,

        /// Restrict to one subject
        #[arg(long)]
        subject: Option<String>,
    },

    /// Add a quest by hand
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        subject: String,

        /// EXP awarded on completion
        #[arg(long)]
        reward: u32,

        /// Deadline (RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Estimated minutes
        #[arg(long)]
        mins: Option<u32>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Complete a quest and claim its reward
    Complete {
        id: String,

        /// Leave the completion pending confirmation
        #[arg(long, default_value = "false", conflicts_with = "undo")]
        no_claim: bool,

        /// Revert a pending completion instead
        #[arg(long, default_value = "false")]
        undo: bool,
    },

    /// Delete a quest
    Remove { id: String },

    /// Spend an attribute point
    Allocate { attribute: String },

    /// Run the session clock forward, printing every popup
    Simulate {
        #[arg(long, default_value = "24")]
        hours: i64,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = EngineConfig::from_env().context("Failed to load engine config")?;
    let now = resolve_now(cli.now.as_deref())?;
    let store = open_store(&cli.data_dir, &config);
    let email = resolve_email(&store, cli.email)?;
    let password = cli
        .password
        .with_context(|| format!("No password given (use --password or {})", PASSWORD_ENV))?;

    let mut session = Session::login_or_register(store, config, &email, &password, now)?;

    match cli.command {
        Commands::Status { json } => {
            if json {
                let quests = serde_json::to_string_pretty(&session.state().quests)?;
                println!("{}", quests);
            } else {
                println!("{}", render_status(&session, now));
            }
        }

        Commands::Generate { count, subject } => {
            let subject = subject.as_deref().map(parse_subject).transpose()?;
            let events = session.generate(count, subject, now);
            println!("🎲 Generated {} quest(s)", events.len());
            for event in &events {
                if let Some(quest) = session.state().quests.get(&event.quest_id) {
                    println!("   {}", format_quest(quest));
                }
            }
        }

        Commands::Add { title, subject, reward, due, mins, description } => {
            let draft = QuestDraft {
                title,
                description,
                subject: Some(parse_subject(&subject)?),
                reward_exp: reward,
                est_mins: mins,
                due_at: due.as_deref().map(parse_timestamp).transpose()?,
                ..QuestDraft::default()
            };
            let quest = session.add_quest(draft, now)?;
            println!("📝 Added quest");
            println!("   {}", format_quest(&quest));
        }

        Commands::Complete { id, no_claim, undo } => {
            if undo {
                session.undo(&id, now)?;
                println!("↩️  Completion of {} undone", id);
            } else if no_claim {
                session.complete(&id, now)?;
                println!("⏳ {} is awaiting confirmation", id);
            } else {
                let pending = session.state().quests.get(&id).is_some_and(|q| q.pending_complete);
                if !pending {
                    session.complete(&id, now)?;
                }
                let outcome = session.claim(&id, now)?;
                println!("✅ Claimed {} EXP (+1 {})", outcome.reward, outcome.attribute.as_str());
                for event in &outcome.events {
                    println!("   {}", format_event(event));
                }
            }
        }

        Commands::Remove { id } => {
            let quest = session.remove(&id)?;
            println!("🗑️  Removed {}", quest.title);
        }

        Commands::Allocate { attribute } => {
            let attribute = parse_attribute(&attribute)?;
            let value = session.allocate_point(attribute)?;
            println!("💪 {} is now {}", attribute.as_str(), value);
        }

        Commands::Simulate { hours } => {
            let end = simulation_end(now, hours)?;
            println!("⏩ Simulating {} hour(s) from {}", hours, now.to_rfc3339());
            let shown = simulate(&mut session, now, hours)?;
            for (at, event) in &shown {
                println!("   {}  {}", at.format("%Y-%m-%d %H:%M:%S"), format_event(event));
            }
            println!("\n{}", render_status(&session, end));
        }
    }

    if let Some(popup) = session.current_popup() {
        println!("\n🔔 {}", format_popup(popup));
    }
    finish(session, now);
    Ok(())
}

#[cfg(feature = "cli")]
fn finish(session: Session<FileStore>, now: chrono::DateTime<chrono::Utc>) {
    let store = session.logout(now);
    tracing::debug!(dir = %store.inner().dir().display(), "session saved");
}

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("sq CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
