//! Progress bar for a running download job.

use indicatif::{ProgressBar, ProgressStyle};

use clipfetch_core::DownloadJobEvent;

/// Renders coordinator events on stderr; hidden when disabled.
pub(crate) struct JobProgress {
    bar: ProgressBar,
}

impl JobProgress {
    pub(crate) fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message("Starting download...");
        Self { bar }
    }

    pub(crate) fn observe(&self, event: &DownloadJobEvent) {
        match event {
            DownloadJobEvent::Progress { percent, stage, .. } => {
                self.bar.set_position(percent_position(*percent));
                self.bar.set_message(stage.clone());
            }
            DownloadJobEvent::Completed { filename, .. } => {
                self.bar.set_position(100);
                self.bar.finish_with_message(format!("Download ready! {filename}"));
            }
            DownloadJobEvent::Failed(failure) => {
                self.bar.abandon_with_message(failure.message.clone());
            }
            DownloadJobEvent::Cancelled => self.bar.abandon_with_message("Cancelled"),
        }
    }

    pub(crate) fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_position(percent: f64) -> u64 {
    percent.clamp(0.0, 100.0).round() as u64
}
