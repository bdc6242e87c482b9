// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Kiro: The Automated Screenshot Organizer
//!
//! "I hate sorting screenshots, so I let Kiro do it."

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use kiro::clock::SystemClock;
use kiro::config::AppConfig;
use kiro::history::{History, UndoOutcome};
use kiro::organizer::{Organizer, RunStats};
use kiro::paths::{PathResolver, ResolvedPaths};
use kiro::watcher::FileWatcher;
use kiro::Result;

/// Kiro CLI - Automated Screenshot Organizer
#[derive(Parser, Debug)]
#[command(name = "kiro")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Watches the Desktop and archives screenshots by month", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "kiro.json", global = true)]
    config: PathBuf,

    /// Folder to watch (defaults to the Desktop)
    #[arg(short, long, global = true)]
    source: Option<PathBuf>,

    /// Folder to store sorted screenshots (defaults to ~/Documents/Kiro_Archive)
    #[arg(short, long, global = true)]
    target: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize the files currently in the source folder, then exit
    Scan {
        /// Simulate without moving files
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch the source folder and archive new screenshots as they appear
    Watch {
        /// Simulate without moving files
        #[arg(long)]
        dry_run: bool,

        /// Organize existing files before watching
        #[arg(long)]
        process_existing: bool,
    },

    /// History and undo operations
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recent moves
    List {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Move recently archived files back
    Undo {
        /// Number of moves to undo
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Dry run (show what would be undone)
        #[arg(long)]
        dry_run: bool,
    },

    /// Clear all history
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration and resolved folders
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "kiro.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(Commands::Config { action: ConfigCommands::Generate { output } }) = &cli.command {
        AppConfig::default().save(output)?;
        println!("Generated config at {:?}", output);
        return Ok(());
    }

    let config = AppConfig::load(&cli.config)?;

    let paths = PathResolver::from_env().resolve(&config, cli.source.as_deref(), cli.target.as_deref())?;

    match cli.command {
        Some(Commands::Scan { dry_run }) => run_scan(&config, &paths, dry_run).await,
        Some(Commands::Watch { dry_run, process_existing }) => {
            run_watch(&config, &paths, dry_run, process_existing).await
        }
        Some(Commands::History { action }) => run_history_command(&config, &paths, action),
        Some(Commands::Config { action: ConfigCommands::Show }) => show_config(&config, &paths, &cli.config),
        Some(Commands::Config { action: ConfigCommands::Generate { .. } }) => Ok(()),
        None => run_scan(&config, &paths, false).await,
    }
}

fn organizer(config: &AppConfig, paths: &ResolvedPaths, dry_run: bool) -> Organizer {
    if dry_run {
        warn!("DRY RUN MODE - files will not be moved");
    }
    Organizer::new(paths, config, Arc::new(SystemClock)).with_dry_run(dry_run)
}

/// One-time scan of the source folder
async fn run_scan(config: &AppConfig, paths: &ResolvedPaths, dry_run: bool) -> Result<()> {
    let mut organizer = organizer(config, paths, dry_run);
    let stats = organizer.scan().await?;
    print_summary(&stats, dry_run);
    Ok(())
}

/// Watch mode: one event at a time until Ctrl+C / SIGTERM
async fn run_watch(config: &AppConfig, paths: &ResolvedPaths, dry_run: bool, process_existing: bool) -> Result<()> {
    let mut organizer = organizer(config, paths, dry_run);

    let mut watcher = FileWatcher::new()?;
    watcher.watch(&paths.source)?;

    if process_existing {
        info!("Processing existing files...");
        organizer.scan().await?;
    }

    // Setup graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        let _ = shutdown_tx.send(true);
    });

    info!("Kiro Watcher Active");
    info!("Watching: {:?}", paths.source);
    info!("Target:   {:?}", paths.archive_root);
    info!("Press Ctrl+C to stop.");

    // Main event loop
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match watcher.next_event(Duration::from_millis(100)) {
            Some(Ok(event)) => {
                organizer.handle(&event).await;
            }
            Some(Err(e)) => warn!("Watch error: {}", e),
            None => {}
        }
    }

    print_summary(&organizer.stats(), dry_run);
    info!("Kiro stopped.");
    Ok(())
}

fn print_summary(stats: &RunStats, dry_run: bool) {
    println!("------------------------------------------------");
    if dry_run {
        println!("Done. Would move: {} | Skipped: {} | Errors: {}", stats.planned, stats.skipped, stats.errors);
    } else {
        println!("Done. Moved: {} | Skipped: {} | Errors: {}", stats.moved, stats.skipped, stats.errors);
    }
}

/// Run history commands
fn run_history_command(config: &AppConfig, paths: &ResolvedPaths, action: HistoryCommands) -> Result<()> {
    let history = History::new(config.history.path_under(&paths.archive_root));

    match action {
        HistoryCommands::List { count } => {
            let entries = history.get_recent(count)?;
            println!("Recent history ({} entries):", entries.len());
            for entry in entries {
                let status = if entry.undone { "[UNDONE]" } else { "" };
                println!("  {} {} -> {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.original_path.display(),
                    entry.new_path.display(),
                    status
                );
            }
        }
        HistoryCommands::Undo { count, dry_run } => {
            let entries = history.get_undoable()?;
            let to_undo: Vec<_> = entries.into_iter().rev().take(count).collect();

            if to_undo.is_empty() {
                println!("No moves to undo");
                return Ok(());
            }

            for entry in to_undo {
                if dry_run {
                    println!("Would undo: {} -> {}",
                        entry.new_path.display(),
                        entry.original_path.display()
                    );
                    continue;
                }

                match history.undo(&entry)? {
                    UndoOutcome::Restored => println!("Undone: {} -> {}",
                        entry.new_path.display(),
                        entry.original_path.display()
                    ),
                    UndoOutcome::Missing => {
                        warn!("File not found (may have been moved/deleted): {:?}", entry.new_path)
                    }
                    UndoOutcome::Occupied => {
                        warn!("Original path already exists, leaving archive copy: {:?}", entry.original_path)
                    }
                }
            }
        }
        HistoryCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing history");
                return Ok(());
            }
            history.clear()?;
            println!("History cleared");
        }
    }

    Ok(())
}

/// Print the effective configuration
fn show_config(config: &AppConfig, paths: &ResolvedPaths, config_path: &Path) -> Result<()> {
    println!("Configuration file: {:?}", config_path);
    println!("  Source:       {:?}", paths.source);
    println!("  Archive root: {:?}", paths.archive_root);
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
