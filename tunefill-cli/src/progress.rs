//! Terminal progress bar driven by batch progress callbacks

use core_metadata::{BatchProgress, BatchSummary, FileResult};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (ETA: {eta})";

pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message("Resolving");
        Self { bar }
    }
}

impl BatchProgress for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_file(&self, result: &FileResult, stats: BatchSummary) {
        if let Some(error) = &result.error {
            let name = result
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.bar.println(format!("  {}: {}", name, error));
        }
        self.bar.set_message(format!(
            "updated {} skipped {} errors {}",
            stats.updated, stats.skipped, stats.errors
        ));
        self.bar.inc(1);
    }

    fn on_finish(&self, _summary: BatchSummary) {
        self.bar.finish_and_clear();
    }
}
