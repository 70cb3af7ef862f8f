//! Terminal progress presentation.

use indicatif::{ProgressBar, ProgressStyle};

use netexp::{ExperimentObserver, Phase};

/// Drives an indicatif bar from the trial loop's notifications: the
/// message slot shows the current phase, the position tracks archived
/// trials.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:>12} [{bar:40}] {pos}/{len}")
                .progress_chars("=> "),
        );
        ProgressObserver { bar }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl ExperimentObserver for ProgressObserver {
    fn phase_changed(&mut self, _trial_index: usize, phase: Phase) {
        self.bar.set_message(phase.label());
    }

    fn trial_completed(&mut self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }
}
