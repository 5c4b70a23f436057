//! Progress indicators for searchform boot runs.

use bootstrap::{BootstrapStep, ProgressCallback};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui;

/// Spinner showing the running step, with one line per finished step.
pub struct StepProgress {
    bar: ProgressBar,
}

impl StepProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix:.blue.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Clear the spinner
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for StepProgress {
    fn on_step_start(&mut self, index: usize, total: usize, step: &BootstrapStep) {
        self.bar.set_prefix(format!("[{}/{total}]", index + 1));
        self.bar.set_message(step.description.clone());
    }

    fn on_step_complete(&mut self, step: &BootstrapStep, success: bool) {
        let mark = ui::outcome(step, success);
        self.bar.println(format!("{mark} {} {}", step.id, step.description.dimmed()));
    }
}

impl Drop for StepProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
