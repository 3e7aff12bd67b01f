//! Veil Animation System
//!
//! Tweens, springs, and the frame scheduler that drives them.
//!
//! # Features
//!
//! - **Interpolation**: numbers, dates, and arrays/records of them, with
//!   snapping for values that cannot be blended
//! - **Tweens**: duration-based transitions with delays and easing curves
//! - **Springs**: velocity-based transitions that settle on their target
//! - **Frame Scheduler**: one loop for every animating component, writing
//!   one batched update per component per frame
//! - **Interruptible**: a new animation on a key supersedes the old one, and a
//!   plain write to a key aborts it
//! - **Completions**: every animation returns a promise of its outcome

pub mod clock;
pub mod easing;
pub mod error;
pub mod interpolate;
pub mod scheduler;
pub mod spring;
pub mod tween;

pub use clock::{FrameClock, ManualClock, SystemClock};
pub use easing::Easing;
pub use error::{InterpolateError, Result};
pub use interpolate::Interpolator;
pub use scheduler::{
    AnimationHandle, AnimationOutcome, Completion, FrameScheduler, ProgressRatio,
    SchedulerHandle, TrackId, Transition,
};
pub use spring::{SpringConfig, SpringStepper};
pub use tween::{Tween, TweenOptions, TweenSample};
