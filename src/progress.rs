use crate::output::OutputMode;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for hashing `total` files; hidden in quiet mode
pub fn hashing_bar(total: u64, mode: OutputMode) -> ProgressBar {
    if mode == OutputMode::Quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    pb.set_style(style);
    pb.set_message("hashing");
    pb
}
