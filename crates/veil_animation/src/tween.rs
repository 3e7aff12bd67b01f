//! Duration-based tweens

use serde::{Deserialize, Serialize};
use veil_core::Value;

use crate::easing::Easing;
use crate::interpolate::Interpolator;

/// Options for a tween
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenOptions {
    /// Milliseconds from start to target
    pub duration: f64,
    /// Milliseconds to wait before the first write
    pub delay: f64,
    pub easing: Easing,
    /// When superseding an in-flight tween, scale `duration` by how far the
    /// old one had progressed, so a reversal takes as long as the distance
    /// already travelled
    pub adjust_duration: bool,
}

impl Default for TweenOptions {
    fn default() -> Self {
        Self {
            duration: 400.0,
            delay: 0.0,
            easing: Easing::Linear,
            adjust_duration: false,
        }
    }
}

impl TweenOptions {
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn adjusting_duration(mut self) -> Self {
        self.adjust_duration = true;
        self
    }
}

/// Result of sampling a tween at a point in time
#[derive(Clone, Debug, PartialEq)]
pub enum TweenSample {
    /// Still inside the delay: nothing to write
    Pending,
    Running(Value),
    /// At or past the end: the exact target
    Finished(Value),
}

/// A tween in flight
#[derive(Clone, Debug)]
pub struct Tween {
    interpolator: Interpolator,
    target: Value,
    start: f64,
    end: f64,
    duration: f64,
    easing: Easing,
}

impl Tween {
    /// `start` is the absolute time (ms) of the first frame, delay included
    pub fn new(
        interpolator: Interpolator,
        target: Value,
        start: f64,
        duration: f64,
        easing: Easing,
    ) -> Self {
        let duration = duration.max(0.0);
        Self {
            interpolator,
            target,
            start,
            end: start + duration,
            duration,
            easing,
        }
    }

    pub fn sample(&self, now: f64) -> TweenSample {
        if now >= self.end {
            TweenSample::Finished(self.target.clone())
        } else if now >= self.start {
            let eased = self.easing.apply(self.progress(now));
            TweenSample::Running(self.interpolator.at(eased))
        } else {
            TweenSample::Pending
        }
    }

    /// Elapsed fraction of the duration, clamped to `[0, 1]`
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return if now >= self.start { 1.0 } else { 0.0 };
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tween(start: f64, duration: f64, easing: Easing) -> Tween {
        let interp = Interpolator::new(&Value::from(0.0), &Value::from(100.0)).unwrap();
        Tween::new(interp, Value::from(100.0), start, duration, easing)
    }

    #[test]
    fn test_nothing_written_during_delay() {
        let t = tween(50.0, 100.0, Easing::Linear);
        assert_eq!(t.sample(10.0), TweenSample::Pending);
        assert_eq!(t.progress(10.0), 0.0);
    }

    #[test]
    fn test_linear_midpoint_and_end() {
        let t = tween(0.0, 400.0, Easing::Linear);
        assert_eq!(t.sample(100.0), TweenSample::Running(Value::from(25.0)));
        assert_eq!(t.sample(400.0), TweenSample::Finished(Value::from(100.0)));
        assert_eq!(t.sample(900.0), TweenSample::Finished(Value::from(100.0)));
        assert_eq!(t.progress(100.0), 0.25);
    }

    #[test]
    fn test_eased_sample() {
        let t = tween(0.0, 100.0, Easing::EaseOutCubic);
        assert_eq!(t.sample(50.0), TweenSample::Running(Value::from(87.5)));
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let t = tween(0.0, 0.0, Easing::Linear);
        assert_eq!(t.sample(0.0), TweenSample::Finished(Value::from(100.0)));
        assert_eq!(t.progress(0.0), 1.0);
    }

    #[test]
    fn test_options_defaults() {
        let options = TweenOptions::default();
        assert_eq!(options.duration, 400.0);
        assert_eq!(options.delay, 0.0);
        assert_eq!(options.easing, Easing::Linear);
        assert!(!options.adjust_duration);
    }
}
