//! Terminal progress rendering for long-running commands.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use weekplan_core::calendar::{ExportProgress, ExportReport, ProgressSink};

/// Draws calendar export progress as a bar.
pub struct ExportProgressBar {
    bar: ProgressBar,
}

impl ExportProgressBar {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for ExportProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ExportProgressBar {
    fn on_progress(&mut self, progress: &ExportProgress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.attempted() as u64);
        let message = match &progress.current {
            Some(title) => format!("{} - {}", progress.message(), title),
            None => progress.message(),
        };
        self.bar.set_message(message);
    }

    fn on_finished(&mut self, report: &ExportReport) {
        self.bar.set_message(report.message.clone());
    }

    fn on_cleared(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner shown while waiting on the model.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
