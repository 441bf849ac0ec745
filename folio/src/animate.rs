//! Count-up animation for the stats bar.

use crate::format::group_thousands;
use shared::config::MotionConfig;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval};

pub const COUNTER_DURATION: Duration = Duration::from_millis(1200);
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub const PLACEHOLDER_CLASS: &str = "shimmer-placeholder";
pub const BOUNCE_CLASS: &str = "bounce";

pub fn ease_out_cubic(progress: f64) -> f64 {
    1.0 - (1.0 - progress).powi(3)
}

/// Counter value `elapsed` into the animation, and whether it has finished.
pub fn counter_frame(target: u64, elapsed: Duration) -> (u64, bool) {
    let progress = (elapsed.as_secs_f64() / COUNTER_DURATION.as_secs_f64()).min(1.0);
    if progress >= 1.0 {
        return (target, true);
    }
    let value = (ease_out_cubic(progress) * target as f64).floor() as u64;
    (value, false)
}

/// Text node plus class list of a stat value element.
#[derive(Debug, Default, Clone)]
pub struct CounterElement {
    text: String,
    classes: BTreeSet<String>,
    bounce_hook: bool,
}

impl CounterElement {
    /// Element as first rendered: empty with a shimmer placeholder.
    pub fn placeholder() -> Self {
        let mut el = Self::default();
        el.classes.insert(PLACEHOLDER_CLASS.to_string());
        el
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Host signal that the CSS animation finished. The bounce hook runs once.
    pub fn animation_end(&mut self) {
        if std::mem::take(&mut self.bounce_hook) {
            self.classes.remove(BOUNCE_CLASS);
        }
    }

    fn finish(&mut self, target: u64) {
        self.text = group_thousands(target);
        self.classes.insert(BOUNCE_CLASS.to_string());
        self.bounce_hook = true;
    }
}

/// Count `el` up from 0 to `target` one frame at a time, then bounce.
///
/// With reduced motion the final value is written straight away.
pub async fn animate_counter(el: &mut CounterElement, target: u64, motion: MotionConfig) {
    el.classes.remove(PLACEHOLDER_CLASS);

    if motion.reduced_motion {
        el.text = group_thousands(target);
        return;
    }

    let start = Instant::now();
    let mut frames = interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frames.tick().await;
        let (value, done) = counter_frame(target, start.elapsed());
        if done {
            el.finish(target);
            break;
        }
        el.text = group_thousands(value);
    }
}
