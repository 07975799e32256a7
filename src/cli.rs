use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use anyhow::Context;
use colored::Colorize;

use crate::config::Config;
use crate::fingerprint::FingerprintStore;
use crate::listing::{self, ListOptions, SortKey};
use crate::logging;
use crate::output::{self, OutputMode};
use crate::progress;
use crate::session::{BrowseSession, ListingRow};

#[derive(Parser)]
#[command(name = "filemark")]
#[command(version)]
#[command(about = "Browse directories and spot files whose content changed since you last looked")]
#[command(long_about = "filemark lists directories and flags files whose content differs from \
    the fingerprint recorded the last time they were seen.\n\n\
    Examples:\n  \
    filemark browse ~/Documents          # List, flag changes, then record fingerprints\n  \
    filemark list . --sort size --desc   # List by size, largest first, without recording\n  \
    filemark status notes.txt            # Check one file against its fingerprint\n  \
    filemark record ~/Documents          # Record fingerprints of every file in a folder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Fingerprint database to use instead of the configured one
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a directory, flag changed files, then record fingerprints
    #[command(visible_alias = "b")]
    Browse {
        /// Directory to browse (default: current directory)
        path: Option<PathBuf>,

        /// Sort key: name, size, created, extension
        #[arg(short = 's', long, value_enum)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(short = 'd', long)]
        desc: bool,

        /// Hide entries whose name starts with a dot
        #[arg(long)]
        no_hidden: bool,

        /// Do not record fingerprints when the session ends
        #[arg(long)]
        no_record: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a directory with change flags without recording anything
    #[command(visible_alias = "ls")]
    List {
        /// Directory to list (default: current directory)
        path: Option<PathBuf>,

        /// Sort key: name, size, created, extension
        #[arg(short = 's', long, value_enum)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(short = 'd', long)]
        desc: bool,

        /// Hide entries whose name starts with a dot
        #[arg(long)]
        no_hidden: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the content fingerprint of a file
    Hash {
        file: PathBuf,
    },

    /// Compare files against their recorded fingerprints
    #[command(visible_alias = "st")]
    Status {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record current fingerprints (directories expand to the files they contain)
    #[command(visible_alias = "r")]
    Record {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove fingerprints of files that no longer exist in a directory
    Prune {
        dir: PathBuf,
    },

    /// Remove the fingerprint of specific files
    Forget {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// View or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,

        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(self) -> anyhow::Result<()> {
        let _ = logging::init_with_level(logging::level_for_verbosity(self.verbose, self.quiet));
        let output_mode = OutputMode::from_flags(self.verbose, self.quiet);

        let mut config = Config::load();
        let db = self.db;

        match self.command {
            Commands::Browse { path, sort, desc, no_hidden, no_record, json } => {
                config.apply_cli_overrides(db, sort, desc, no_hidden.then_some(false));
                let store = open_store(&config)?;
                let dir = path.unwrap_or_else(current_dir);

                let mut session = BrowseSession::with_options(&store, list_options(&config));
                let rows = session
                    .browse(&dir, config.listing.sort, config.sort_order())
                    .with_context(|| format!("Failed to list {}", dir.display()))?;
                print_rows(&dir, &rows, &config, json, output_mode)?;

                if config.session.record_on_exit && !no_record {
                    let summary = session.finish()?;
                    if !json {
                        output::print_session_summary(&summary, output_mode);
                    }
                } else {
                    session.abandon();
                }
                Ok(())
            }
            Commands::List { path, sort, desc, no_hidden, json } => {
                config.apply_cli_overrides(db, sort, desc, no_hidden.then_some(false));
                let store = open_store(&config)?;
                let dir = path.unwrap_or_else(current_dir);

                let mut session = BrowseSession::with_options(&store, list_options(&config));
                let rows = session
                    .browse(&dir, config.listing.sort, config.sort_order())
                    .with_context(|| format!("Failed to list {}", dir.display()))?;
                session.abandon();
                print_rows(&dir, &rows, &config, json, output_mode)
            }
            Commands::Hash { file } => {
                let hash = crate::fingerprint::hasher::compute_hash_chunked(&file, config.chunk_size())
                    .with_context(|| format!("Failed to hash {}", file.display()))?;
                println!("{}  {}", hash, file.display());
                Ok(())
            }
            Commands::Status { files, json } => {
                config.apply_cli_overrides(db, None, false, None);
                let store = open_store(&config)?;
                let statuses: Vec<_> = files.iter().map(|file| (file, store.status(file))).collect();

                if json {
                    let report: Vec<_> = statuses
                        .iter()
                        .map(|(file, status)| {
                            serde_json::json!({ "path": file.display().to_string(), "status": status })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    for (file, status) in &statuses {
                        output::print_status(file, *status, output_mode);
                    }
                }
                Ok(())
            }
            Commands::Record { paths } => {
                config.apply_cli_overrides(db, None, false, None);
                let store = open_store(&config)?;
                let files = expand_files(&paths, list_options(&config))?;

                let bar = progress::hashing_bar(files.len() as u64, output_mode);
                let mut failed = 0usize;
                for file in &files {
                    if let Err(e) = store.upsert(file) {
                        failed += 1;
                        bar.suspend(|| {
                            if output_mode != OutputMode::Quiet {
                                eprintln!("{} {}", "Warning:".yellow(), e);
                            }
                        });
                    }
                    bar.inc(1);
                }
                bar.finish_and_clear();

                if output_mode != OutputMode::Quiet {
                    println!(
                        "{} Recorded {} of {} files",
                        "OK".green().bold(),
                        files.len() - failed,
                        files.len()
                    );
                }
                if failed > 0 {
                    return Err(anyhow::anyhow!("{} files could not be recorded", failed));
                }
                Ok(())
            }
            Commands::Prune { dir } => {
                config.apply_cli_overrides(db, None, false, None);
                let store = open_store(&config)?;
                let live = listing::list(&dir, config.listing.sort, config.sort_order())
                    .with_context(|| format!("Failed to list {}", dir.display()))?;
                let removed = store.reconcile(&dir, &live)?;
                if output_mode != OutputMode::Quiet {
                    println!("{} Removed {} stale fingerprints", "OK".green().bold(), removed);
                }
                Ok(())
            }
            Commands::Forget { files } => {
                config.apply_cli_overrides(db, None, false, None);
                let store = open_store(&config)?;
                for file in &files {
                    let removed = store.forget(file)?;
                    if output_mode != OutputMode::Quiet {
                        let label = if removed { "forgotten".green() } else { "not tracked".dimmed() };
                        println!("{:<12} {}", label, file.display());
                    }
                }
                Ok(())
            }
            Commands::Config { show, reset, path } => {
                if reset {
                    Config::default().save()?;
                    println!("{} Configuration reset to defaults.", "OK".green().bold());
                }
                if path {
                    println!("{}", Config::config_path()?.display());
                }
                if config_should_show(show, reset, path) {
                    let config = Config::load_or_create();
                    println!("{}", config.to_toml()?);
                    if let Ok(path) = Config::config_path() {
                        println!("# Config file: {}", path.display());
                    }
                    if let Ok(db_path) = config.database_path() {
                        println!("# Database: {}", db_path.display());
                    }
                }
                Ok(())
            }
        }
    }
}

/// `config` with no flags shows the configuration; `--show` adds it to the others
fn config_should_show(show: bool, reset: bool, path: bool) -> bool {
    show || !(reset || path)
}

fn open_store(config: &Config) -> anyhow::Result<FingerprintStore> {
    let db_path = config.database_path()?;
    FingerprintStore::open_with_config(config)
        .with_context(|| format!("Failed to open fingerprint database {}", db_path.display()))
}

fn list_options(config: &Config) -> ListOptions {
    ListOptions {
        show_hidden: config.listing.show_hidden,
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn print_rows(
    dir: &Path,
    rows: &[ListingRow],
    config: &Config,
    json: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    if json {
        output::print_listing_json(dir, rows, config.listing.sort, config.sort_order())
    } else {
        output::print_listing(dir, rows, mode);
        Ok(())
    }
}

/// Files named directly plus the immediate regular files of any named directory
fn expand_files(paths: &[PathBuf], options: ListOptions) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = listing::list_with_options(
                path,
                SortKey::Name,
                listing::SortOrder::Ascending,
                options,
            )
            .with_context(|| format!("Failed to list {}", path.display()))?;
            files.extend(entries.into_iter().filter(|e| e.is_file()).map(|e| e.path));
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
