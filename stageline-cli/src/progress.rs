//! Terminal progress bar for runs.

use indicatif::{ProgressBar, ProgressStyle};
use stageline::observability::ProgressReporter;

/// Draws one bar unit per completed stage.
pub struct BarProgress {
    bar: ProgressBar,
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, total: usize) {
        let style = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        self.bar.set_style(style);
        self.bar.set_length(total as u64);
        self.bar.set_message("Running engines...");
    }

    fn advance(&self, stage: &str) {
        self.bar.set_message(format!("Finished {stage}"));
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_stages() {
        let progress = BarProgress::with_bar(ProgressBar::hidden());

        progress.start(3);
        assert_eq!(progress.bar.length(), Some(3));
        assert_eq!(progress.bar.position(), 0);

        progress.advance("EngineA");
        progress.advance("EngineB");
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.message(), "Finished EngineB");

        progress.finish();
        assert!(progress.bar.is_finished());
        // An aborted run leaves the bar short of its length.
        assert_eq!(progress.bar.position(), 2);
    }
}
