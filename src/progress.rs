use indicatif::{ProgressBar, ProgressStyle};

use crate::models::Module;
use crate::scan::Progress;

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Terminal progress bar shown while modules are scanned.
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// A visible bar, or a hidden one when `quiet` is set.
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        };
        Self { bar }
    }
}

impl Progress for ScanProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, module: &Module) {
        self.bar.set_message(module.name.clone());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
