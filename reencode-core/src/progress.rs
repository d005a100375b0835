// ============================================================================
// reencode-core/src/progress.rs
// ============================================================================
//
// PROGRESS TRACKING: Encoder Event Handling
//
// The worker feeds every encoder event through a ProgressTracker. The
// tracker takes the total duration from the first duration announcement and
// the current position from each progress update, drives a terminal
// progress bar and writes one log line per completed decile so the file log
// stays readable.

use crate::config::PROGRESS_LOG_INTERVAL_PERCENT;
use crate::external::EncoderEvent;
use crate::utils::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Per-run progress state. Positions only ever move forward.
pub struct ProgressTracker {
    total: Option<f64>,
    position: f64,
    last_logged_step: u32,
    show_bar: bool,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Creates a tracker that draws a bar on stderr when it is a terminal.
    pub fn new() -> Self {
        Self::with_bar(console::Term::stderr().is_term())
    }

    /// Creates a tracker that never draws.
    pub fn hidden() -> Self {
        Self::with_bar(false)
    }

    fn with_bar(show_bar: bool) -> Self {
        Self {
            total: None,
            position: 0.0,
            last_logged_step: 0,
            show_bar,
            bar: None,
        }
    }

    pub fn total(&self) -> Option<f64> {
        self.total
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Completion in percent, if the total is known.
    pub fn percent(&self) -> Option<f64> {
        self.total
            .filter(|&t| t > 0.0)
            .map(|t| (self.position * 100.0 / t).min(100.0))
    }

    /// Applies one encoder event.
    pub fn handle_event(&mut self, event: &EncoderEvent) {
        match event {
            EncoderEvent::Duration(total) if self.total.is_none() => self.start(*total),
            EncoderEvent::Duration(_) => {}
            EncoderEvent::Progress(position) => self.advance(*position),
            EncoderEvent::Log(line) | EncoderEvent::Error(line) => {
                log::debug!(target: "reencode::encoder", "{line}");
            }
        }
    }

    fn start(&mut self, total: f64) {
        log::debug!("Encoder reported duration {}", format_duration(total));
        self.total = Some(total);

        let bar = if self.show_bar {
            ProgressBar::new(to_millis(total))
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  Encoding: {percent:>3}% [{bar:30}] ({elapsed} / eta {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##."),
        );
        if self.show_bar {
            bar.enable_steady_tick(Duration::from_millis(200));
        }
        self.bar = Some(bar);
    }

    fn advance(&mut self, position: f64) {
        if position <= self.position {
            return;
        }
        let delta = to_millis(position) - to_millis(self.position);
        self.position = position;
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
        self.log_progress_if_needed();
    }

    fn log_progress_if_needed(&mut self) {
        let (Some(total), Some(percent)) = (self.total, self.percent()) else {
            return;
        };

        let step = percent as u32 / u32::from(PROGRESS_LOG_INTERVAL_PERCENT);
        if step > self.last_logged_step {
            let remaining = (total - self.position).max(0.0);
            log::info!(
                target: "reencode::progress",
                "Progress: {:.0}% | {} remaining",
                percent,
                format_duration(remaining)
            );
            self.last_logged_step = step;
        }
    }

    /// Highest completion mark that has been logged, in percent.
    pub fn last_logged_percent(&self) -> u32 {
        self.last_logged_step * u32::from(PROGRESS_LOG_INTERVAL_PERCENT)
    }

    /// Removes the bar from the terminal.
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0) as u64
    } else {
        0
    }
}
