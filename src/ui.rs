use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use behavior_lens::MetricsVector;

/// Plain-mode live lines are throttled to this interval.
const PLAIN_LINE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    fn pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

    /// Live metrics display for a run expected to publish about `expected_frames`.
    pub fn live(&self, expected_frames: u64) -> LiveView {
        let bar = self.pretty().then(|| {
            let bar = ProgressBar::new(expected_frames);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::with_template("{bar:24} {pos:>5} frames  {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        LiveView {
            bar,
            last_line: None,
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

pub struct LiveView {
    bar: Option<ProgressBar>,
    last_line: Option<Instant>,
}

impl LiveView {
    pub fn update(&mut self, sequence: u64, metrics: &MetricsVector) {
        if let Some(bar) = &self.bar {
            bar.set_position(sequence);
            bar.set_message(summary(metrics));
            return;
        }
        if self
            .last_line
            .map_or(true, |at| at.elapsed() >= PLAIN_LINE_INTERVAL)
        {
            eprintln!("#{sequence:<6} {}", summary(metrics));
            self.last_line = Some(Instant::now());
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// One-line digest of a metrics vector.
pub fn summary(m: &MetricsVector) -> String {
    let flag = |active: bool| if active { '+' } else { '-' };
    format!(
        "posture {:>3} attention {:>3} hands L{}R{} {:>3} face {:>3} {:<9} overall {:>3}/{:>3}/{:>3}/{:>3}",
        m.posture.alignment,
        m.attention.level,
        flag(m.hand_activity.left_hand_active),
        flag(m.hand_activity.right_hand_active),
        m.hand_activity.gesture_intensity,
        m.face_analysis.eye_contact,
        m.face_analysis.facial_expression.as_str(),
        m.overall.confidence,
        m.overall.engagement,
        m.overall.activity,
        m.overall.stability,
    )
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
