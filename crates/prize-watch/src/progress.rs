use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub fn watch_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{bar:40.cyan/blue} {percent:>3}% {pos}/{len} frames [{elapsed_precise}<{eta_precise}] {msg}",
    )
    .expect("invalid watch bar template")
}

pub fn watch_spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan.bold} [{elapsed_precise}] frames {pos} • {msg}")
        .expect("invalid watch spinner template")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

/// Builds the operator status line; hidden when running headless.
pub fn watch_progress(headless: bool, total_frames: Option<u64>) -> ProgressBar {
    if headless {
        return ProgressBar::hidden();
    }
    let progress = match total_frames {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(watch_bar_style());
            bar
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(watch_spinner_style());
            spinner
        }
    };
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
