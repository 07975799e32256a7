use crate::fingerprint::ChangeStatus;
use crate::listing::{SortKey, SortOrder};
use crate::session::{ListingRow, SessionSummary};
use anyhow::Result;
use chrono::{Local, TimeZone};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // More details
    VeryVerbose, // Full paths and hashes
}

impl OutputMode {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose >= 2 {
            OutputMode::VeryVerbose
        } else if verbose == 1 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Serialize)]
struct JsonListing<'a> {
    version: &'static str,
    directory: String,
    sort: SortKey,
    ascending: bool,
    entries: &'a [ListingRow],
    summary: JsonListingSummary,
}

#[derive(Serialize)]
struct JsonListingSummary {
    directories: usize,
    files: usize,
    changed: usize,
    total_bytes: u64,
}

/// Creation time formatted in local time, empty when unknown
pub fn format_time(millis: i64) -> String {
    if millis == 0 {
        return String::new();
    }
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn status_cell(status: Option<ChangeStatus>) -> String {
    match status {
        Some(ChangeStatus::Changed) => "changed".yellow().bold().to_string(),
        Some(ChangeStatus::Unknown) => "unknown".red().to_string(),
        Some(ChangeStatus::Untracked) => "new".dimmed().to_string(),
        Some(ChangeStatus::Unchanged) | None => String::new(),
    }
}

fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else {
        let kept: String = name.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn print_listing(dir: &Path, rows: &[ListingRow], mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", dir.display().to_string().bold());
    println!("{}", "━".repeat(72).dimmed());

    if rows.is_empty() {
        println!("{}", "(empty directory)".dimmed());
        println!();
        return;
    }

    for row in rows {
        let entry = &row.entry;
        let name = if entry.is_directory {
            format!("{}/", truncate_name(&entry.name, 34)).blue().bold().to_string()
        } else if row.is_changed() {
            truncate_name(&entry.name, 35).yellow().to_string()
        } else {
            truncate_name(&entry.name, 35)
        };
        let size = match entry.size_bytes {
            Some(bytes) => bytesize::to_string(bytes, true),
            None => "Folder".to_string(),
        };

        println!(
            "{:<36} {:>10}  {:<19}  {}",
            name,
            size,
            format_time(entry.creation_time_millis),
            status_cell(row.status)
        );

        if mode == OutputMode::VeryVerbose {
            println!("    {}", entry.path.display().to_string().dimmed());
        }
    }

    let changed = rows.iter().filter(|r| r.is_changed()).count();
    println!("{}", "─".repeat(72).dimmed());
    println!(
        "{} entries, {} changed since last recorded",
        rows.len(),
        if changed > 0 {
            changed.to_string().yellow().bold().to_string()
        } else {
            changed.to_string()
        }
    );
    println!();
}

pub fn print_listing_json(
    dir: &Path,
    rows: &[ListingRow],
    sort: SortKey,
    order: SortOrder,
) -> Result<()> {
    let summary = JsonListingSummary {
        directories: rows.iter().filter(|r| r.entry.is_directory).count(),
        files: rows.iter().filter(|r| r.entry.is_file()).count(),
        changed: rows.iter().filter(|r| r.is_changed()).count(),
        total_bytes: rows.iter().map(|r| r.entry.sort_size()).sum(),
    };
    let listing = JsonListing {
        version: env!("CARGO_PKG_VERSION"),
        directory: dir.display().to_string(),
        sort,
        ascending: order.is_ascending(),
        entries: rows,
        summary,
    };
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

pub fn print_status(path: &Path, status: ChangeStatus, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }
    let label = match status {
        ChangeStatus::Changed => status.label().yellow().bold().to_string(),
        ChangeStatus::Unchanged => status.label().green().to_string(),
        ChangeStatus::Untracked => status.label().dimmed().to_string(),
        ChangeStatus::Unknown => status.label().red().to_string(),
    };
    println!("{:<10} {}", label, path.display());
}

pub fn print_session_summary(summary: &SessionSummary, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }
    let stats = &summary.stats;
    println!(
        "{} Recorded {} of {} files",
        "OK".green().bold(),
        stats.recorded,
        stats.visited
    );
    if stats.failed > 0 {
        println!(
            "{} {} files could not be read and kept their previous fingerprint",
            "Warning:".yellow(),
            stats.failed
        );
    }
    if mode == OutputMode::Verbose || mode == OutputMode::VeryVerbose {
        let elapsed = summary.finished_at - summary.started_at;
        println!("Session length: {} ms", elapsed.num_milliseconds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(0, true), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(0, false), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(1, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(3, false), OutputMode::VeryVerbose);
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short.txt", 35), "short.txt");
        let long = "a".repeat(40);
        let truncated = truncate_name(&long, 35);
        assert_eq!(truncated.chars().count(), 35);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_format_time_unknown_is_empty() {
        assert_eq!(format_time(0), "");
        assert_eq!(format_time(1_700_000_000_000).len(), 19);
    }
}
