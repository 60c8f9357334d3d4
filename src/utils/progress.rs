use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// A steady-ticking spinner; `silent` turns every call into a no-op.
    pub fn new_spinner(message: &str, silent: bool) -> Self {
        if silent {
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}] {pos} reports")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_counts_reports() {
        let progress = ProgressReporter::new_spinner("Decoding reports", false);
        progress.increment(3);
        progress.increment(2);

        let pb = progress.progress_bar.as_ref().expect("spinner");
        assert_eq!(pb.position(), 5);
        progress.finish_with_message("done");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_silent_spinner_has_no_bar() {
        let progress = ProgressReporter::new_spinner("Decoding reports", true);
        progress.increment(1);
        assert!(progress.progress_bar.is_none());
    }
}
