use crate::ui::{theme, Icons};
use indicatif::{HumanDuration, ProgressBar};
use owo_colors::OwoColorize;
use std::time::Instant;

/// Progress bar for a batch import; hidden when stdout is not a terminal
pub struct ImportProgress {
    pb: ProgressBar,
    started: Instant,
    visible: bool,
}

impl ImportProgress {
    /// `visible: false` keeps the bar and the summary off the terminal entirely
    pub fn new(total_files: usize, visible: bool) -> Self {
        let visible = visible && !crate::output::is_quiet();
        let pb = if visible && console::Term::stdout().is_term() {
            ProgressBar::new(total_files as u64).with_message("Importing sources")
        } else {
            ProgressBar::hidden()
        };
        Self {
            pb,
            started: Instant::now(),
            visible,
        }
    }

    pub fn file_done(&self, filename: &str) {
        self.pb.set_message(format!("Imported: {}", filename));
        self.pb.inc(1);
    }

    pub fn finish(&self, imported: usize, duplicates: usize, failed: usize) {
        self.pb.finish_and_clear();
        if !self.visible {
            return;
        }
        println!(
            "{} {}",
            Icons::IMPORT,
            format!("Import finished in {}", HumanDuration(self.started.elapsed()))
                .style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::NEW.style(theme().info.clone()),
            imported,
            Icons::SKIP.style(theme().info.clone()),
            duplicates,
            Icons::CROSS.style(theme().info.clone()),
            failed
        );
    }
}
