//! Wired Journal - terminal client for the journal's sync core.

mod app;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use journal_config_and_utils::{init_logging, Config, Paths};
use journal_supabase_gateway::{unmap_hidden_kind, LogRecord};
use record_sync_accessor::RecordInput;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use sync_orchestrator::{trigger_channel, RecordFilter, SyncTrigger};
use tokio::time::Duration;

/// Wired Journal command-line interface.
#[derive(Parser)]
#[command(name = "wired-journal")]
#[command(about = "Personal journal synced to the Wired")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for config and state. Defaults to ~/.wired-journal
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
    },
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
    },
    /// Sign out
    Logout,
    /// Show session state
    Status,
    /// List journal entries
    List {
        /// Keep only this kind (Note, Counselling, Other, Hidden)
        #[arg(long)]
        kind: Option<String>,
        /// Case-insensitive text filter
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Save an entry (new, or update with --id)
    Save {
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "Note")]
        kind: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        body: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        /// Mood from 0 to 10
        #[arg(long)]
        mood: Option<i64>,
    },
    /// Delete an entry
    Delete { id: String },
    /// Show a retained draft (new entry, or --id for an edit)
    Draft {
        #[arg(long)]
        id: Option<String>,
    },
    /// Follow sync status, refreshing periodically
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;
    let app = app::build(&config, &paths)?;

    match cli.command {
        Commands::Signup { email } => {
            let password = read_password()?;
            exit_unless(app.orchestrator.sign_up(&email, &password).await, &app)
        }
        Commands::Login { email } => {
            let password = read_password()?;
            exit_unless(app.orchestrator.sign_in(&email, &password).await, &app)
        }
        Commands::Logout => exit_unless(app.orchestrator.sign_out().await, &app),
        Commands::Status => {
            let state = app.session.reconcile().await?;
            match app.session.current_session() {
                Some(session) => println!(
                    "{:?} // {}",
                    state,
                    session.email.as_deref().unwrap_or("(unknown)")
                ),
                None => println!("{state:?}"),
            }
            Ok(())
        }
        Commands::List { kind, query } => {
            app.orchestrator.refresh().await;
            print_status(&app);
            let filter = RecordFilter { kind, query };
            for record in app.orchestrator.records(&filter) {
                print_record(&record);
            }
            Ok(())
        }
        Commands::Save {
            id,
            kind,
            title,
            body,
            tags,
            mood,
        } => {
            let input = RecordInput {
                id,
                kind,
                title,
                body,
                tags: split_tags(&tags),
                mood,
            };
            let saved = app.orchestrator.save(input).await;
            print_status(&app);
            match saved {
                Some(record) => {
                    print_record(&record);
                    Ok(())
                }
                None => std::process::exit(1),
            }
        }
        Commands::Delete { id } => exit_unless(app.orchestrator.delete(&id).await, &app),
        Commands::Draft { id } => {
            let content = app.orchestrator.open_editor(id.as_deref());
            match content.draft {
                Some(draft) => {
                    println!("kind:  {}", draft.kind);
                    println!("title: {}", draft.title);
                    println!("tags:  {}", draft.tags);
                    println!("mood:  {}", draft.mood);
                    println!("{}", draft.body);
                }
                None => println!("NO DRAFT"),
            }
            Ok(())
        }
        Commands::Watch => watch(app).await,
    }
}

async fn watch(app: app::App) -> Result<()> {
    let (tx, rx) = trigger_channel();

    let events = tx.clone();
    app.session.on_state_change(Box::new(move |state| {
        let _ = events.try_send(SyncTrigger::AuthStateChanged(state));
    }));

    let mut status_rx = app.orchestrator.subscribe_status();
    let orchestrator = Arc::clone(&app.orchestrator);
    tokio::spawn(orchestrator.run(rx));

    tx.send(SyncTrigger::Refresh).await?;
    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    ticker.tick().await;

    loop {
        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let line = status_rx.borrow_and_update().clone();
                println!("{line}");
            }
            _ = ticker.tick() => {
                tx.send(SyncTrigger::VisibilityResumed).await?;
            }
        }
    }
}

fn exit_unless(ok: bool, app: &app::App) -> Result<()> {
    print_status(app);
    if ok {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_status(app: &app::App) {
    let line = app.orchestrator.subscribe_status().borrow().clone();
    if !line.is_empty() {
        println!("{line}");
    }
}

fn print_record(record: &LogRecord) {
    let (kind, tags) = unmap_hidden_kind(&record.kind, &record.tags);
    let when = record.created_at.format("%Y-%m-%d %H:%M").to_string();
    let mood = record.mood.map(|m| format!(" mood={m}")).unwrap_or_default();
    println!(
        "{}  {}  [{}] {}{}{}",
        record.id.as_deref().unwrap_or("-"),
        when,
        kind,
        record.title,
        if tags.is_empty() {
            String::new()
        } else {
            format!("  #{}", tags.join(" #"))
        },
        mood
    );
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_password() -> Result<String> {
    eprint!("password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
