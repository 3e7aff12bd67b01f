//! Frame scheduler
//!
//! One scheduler drives every animation in a UI. Components with at least
//! one animation record are registered; each tick advances every record,
//! batches the per-key results into a single `set` per component and drops
//! components whose records have all finished. The loop asks the host for a
//! frame only while something is registered.
//!
//! # Host integration
//!
//! ```rust
//! use veil_animation::{FrameScheduler, ManualClock, TweenOptions};
//! use veil_core::{Component, Value};
//!
//! let clock = ManualClock::new();
//! let scheduler = FrameScheduler::new(clock.clone());
//! scheduler.set_frame_requester(|| { /* requestAnimationFrame */ });
//!
//! let component = Component::with_state([("opacity", 0.0)]);
//! let handle = scheduler
//!     .animate_tween(&component, "opacity", 1.0, TweenOptions::default())
//!     .unwrap();
//!
//! clock.advance(400.0);
//! scheduler.tick();
//! assert_eq!(component.get("opacity"), Some(Value::from(1.0)));
//! assert!(handle.completion.is_settled());
//! assert!(!scheduler.is_running());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use veil_core::{
    Component, ComponentId, Promise, Resolver, Subscription, Value, WeakComponent, WriteOrigin,
};

use crate::clock::{FrameClock, SystemClock};
use crate::error::Result;
use crate::interpolate::Interpolator;
use crate::spring::{SpringConfig, SpringStepper};
use crate::tween::{Tween, TweenOptions, TweenSample};

new_key_type! {
    /// Handle to one animation record
    pub struct TrackId;
}

/// How an animation's completion settled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Reached its target
    Finished,
    /// Replaced by a newer animation on the same key
    Superseded,
    /// Cancelled through [`AnimationHandle::abort`] or an external write
    Aborted,
    /// The component was destroyed mid-animation
    Detached,
}

/// Completion signal of one animation
pub type Completion = Promise<AnimationOutcome>;

/// Fraction of an animation that had elapsed when it was stopped
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct ProgressRatio(pub f64);

impl ProgressRatio {
    pub const COMPLETE: ProgressRatio = ProgressRatio(1.0);

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Either kind of transition, as chosen by configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Tween(TweenOptions),
    Spring(SpringConfig),
}

impl Default for Transition {
    fn default() -> Self {
        Transition::Tween(TweenOptions::default())
    }
}

/// Returned by every animate call
pub struct AnimationHandle {
    /// Settles when the animation finishes, is superseded, aborted or detached
    pub completion: Completion,
    scheduler: SchedulerHandle,
    track: Option<TrackId>,
}

impl AnimationHandle {
    fn settled(outcome: AnimationOutcome, scheduler: SchedulerHandle) -> Self {
        Self {
            completion: Promise::resolved(outcome),
            scheduler,
            track: None,
        }
    }

    /// Stop the animation now, leaving the key at its last written value
    ///
    /// Returns how far it had progressed. An animation that already ended
    /// reports [`ProgressRatio::COMPLETE`].
    pub fn abort(&self) -> ProgressRatio {
        match (self.track, self.scheduler.upgrade()) {
            (Some(track), Some(scheduler)) => scheduler
                .abort_track(track, AnimationOutcome::Aborted)
                .unwrap_or(ProgressRatio::COMPLETE),
            _ => ProgressRatio::COMPLETE,
        }
    }

    pub fn track(&self) -> Option<TrackId> {
        self.track
    }
}

impl std::fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("track", &self.track)
            .field("completion", &self.completion)
            .finish()
    }
}

#[derive(Clone, Debug)]
enum Driver {
    Tween(Tween),
    Spring(SpringStepper),
}

impl Driver {
    /// Advance one frame: the value to write (if any) and whether it is done
    fn advance(&mut self, now: f64) -> (Option<Value>, bool) {
        match self {
            Driver::Tween(tween) => match tween.sample(now) {
                TweenSample::Pending => (None, false),
                TweenSample::Running(value) => (Some(value), false),
                TweenSample::Finished(value) => (Some(value), true),
            },
            Driver::Spring(spring) => {
                let moving = spring.step();
                (Some(spring.value()), !moving)
            }
        }
    }

    fn progress(&self, now: f64) -> f64 {
        match self {
            Driver::Tween(tween) => tween.progress(now),
            Driver::Spring(spring) => spring.progress(),
        }
    }
}

struct Track {
    id: TrackId,
    driver: Driver,
    resolver: Resolver<AnimationOutcome>,
}

struct Entry {
    component: WeakComponent,
    tracks: IndexMap<String, Track>,
    /// Write hook and destroy listener on the component
    hooks: Vec<Subscription>,
}

struct SchedulerInner {
    clock: Rc<dyn FrameClock>,
    request_frame: Option<Rc<dyn Fn()>>,
    frame_requested: bool,
    running: bool,
    entries: IndexMap<ComponentId, Entry>,
    locations: SlotMap<TrackId, (ComponentId, String)>,
    frames: u64,
}

impl SchedulerInner {
    /// Keep `running` in step with the registry, logging transitions
    fn sync_running(&mut self) {
        let running = !self.entries.is_empty();
        if running != self.running {
            self.running = running;
            if running {
                tracing::debug!("frame loop started");
            } else {
                tracing::debug!("frame loop stopped after {} frame(s)", self.frames);
            }
        }
    }

    /// Claim the next frame request, if none is outstanding
    fn claim_frame(&mut self) -> Option<Rc<dyn Fn()>> {
        if self.running && !self.frame_requested {
            self.frame_requested = true;
            self.request_frame.clone()
        } else {
            None
        }
    }

    /// Remove one track; drops the component entry when it was the last
    fn take_track(
        &mut self,
        component: ComponentId,
        key: &str,
    ) -> Option<(Track, Vec<Subscription>)> {
        let entry = self.entries.get_mut(&component)?;
        let track = entry.tracks.shift_remove(key)?;
        self.locations.remove(track.id);
        let released = if entry.tracks.is_empty() {
            self.entries
                .shift_remove(&component)
                .map(|entry| entry.hooks)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        self.sync_running();
        Some((track, released))
    }
}

/// The shared frame scheduler
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new(clock: impl FrameClock + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                clock: Rc::new(clock),
                request_frame: None,
                frame_requested: false,
                running: false,
                entries: IndexMap::new(),
                locations: SlotMap::with_key(),
                frames: 0,
            })),
        }
    }

    /// Install the host's "call me back on the next display frame" hook
    pub fn set_frame_requester<F>(&self, request: F)
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().request_frame = Some(Rc::new(request));
    }

    /// Get a weak handle for callbacks that must not keep the scheduler alive
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn now(&self) -> f64 {
        let clock = self.inner.borrow().clock.clone();
        clock.now()
    }

    // =========================================================================
    // Animate
    // =========================================================================

    /// Animate with whichever transition configuration says
    pub fn animate(
        &self,
        component: &Component,
        key: &str,
        target: impl Into<Value>,
        transition: Transition,
    ) -> Result<AnimationHandle> {
        match transition {
            Transition::Tween(options) => self.animate_tween(component, key, target, options),
            Transition::Spring(config) => self.animate_spring(component, key, target, config),
        }
    }

    /// Tween `key` from its current value to `target`
    ///
    /// Shape errors are returned before anything is registered.
    pub fn animate_tween(
        &self,
        component: &Component,
        key: &str,
        target: impl Into<Value>,
        options: TweenOptions,
    ) -> Result<AnimationHandle> {
        if component.is_destroyed() {
            return Ok(AnimationHandle::settled(AnimationOutcome::Detached, self.handle()));
        }
        let target = target.into();
        let current = component.get(key).unwrap_or_default();
        let interpolator = Interpolator::new(&current, &target)?;

        let now = self.now();
        let mut duration = options.duration;
        if let Some(ratio) = self.progress_of(component.id(), key, now) {
            if options.adjust_duration {
                duration *= ratio;
            }
        }
        let tween = Tween::new(interpolator, target, now + options.delay, duration, options.easing);
        tracing::trace!("tween {:?}.{} over {}ms", component.id(), key, duration);
        Ok(self.insert(component, key, Driver::Tween(tween)))
    }

    /// Spring `key` from its current value (at rest) to `target`
    pub fn animate_spring(
        &self,
        component: &Component,
        key: &str,
        target: impl Into<Value>,
        config: SpringConfig,
    ) -> Result<AnimationHandle> {
        if component.is_destroyed() {
            return Ok(AnimationHandle::settled(AnimationOutcome::Detached, self.handle()));
        }
        let target = target.into();
        let current = component.get(key).unwrap_or_default();
        let spring = SpringStepper::new(&current, &target, config)?;
        tracing::trace!("spring {:?}.{}", component.id(), key);
        Ok(self.insert(component, key, Driver::Spring(spring)))
    }

    fn progress_of(&self, component: ComponentId, key: &str, now: f64) -> Option<f64> {
        let inner = self.inner.borrow();
        inner
            .entries
            .get(&component)
            .and_then(|entry| entry.tracks.get(key))
            .map(|track| track.driver.progress(now))
    }

    fn insert(&self, component: &Component, key: &str, driver: Driver) -> AnimationHandle {
        let id = component.id();
        let registered = self.inner.borrow().entries.contains_key(&id);
        let hooks = if registered {
            Vec::new()
        } else {
            self.install_hooks(component)
        };

        let (completion, resolver) = Promise::pending();
        let (track, superseded, request) = {
            let mut inner = self.inner.borrow_mut();
            let SchedulerInner {
                entries, locations, ..
            } = &mut *inner;
            let track = locations.insert((id, key.to_string()));
            let entry = entries.entry(id).or_insert_with(|| Entry {
                component: component.downgrade(),
                tracks: IndexMap::new(),
                hooks: Vec::new(),
            });
            entry.hooks.extend(hooks);
            let previous = entry.tracks.insert(
                key.to_string(),
                Track {
                    id: track,
                    driver,
                    resolver,
                },
            );
            let superseded = previous.map(|old| {
                locations.remove(old.id);
                old.resolver
            });
            inner.sync_running();
            (track, superseded, inner.claim_frame())
        };

        if let Some(old) = superseded {
            old.resolve(AnimationOutcome::Superseded);
        }
        if let Some(request) = request {
            request();
        }
        AnimationHandle {
            completion,
            scheduler: self.handle(),
            track: Some(track),
        }
    }

    fn install_hooks(&self, component: &Component) -> Vec<Subscription> {
        let id = component.id();
        let on_write = self.handle();
        let on_destroy = self.handle();
        vec![
            // A plain write wins over an animation on the same key
            component.on_write(move |origin, keys| {
                if origin != WriteOrigin::External {
                    return;
                }
                if let Some(scheduler) = on_write.upgrade() {
                    for key in keys {
                        scheduler.abort(id, key);
                    }
                }
            }),
            component.on("destroy", move |_| {
                if let Some(scheduler) = on_destroy.upgrade() {
                    scheduler.detach(id);
                }
            }),
        ]
    }

    // =========================================================================
    // Abort / detach
    // =========================================================================

    /// Abort the animation on `key`, if one is running
    pub fn abort(&self, component: ComponentId, key: &str) -> Option<ProgressRatio> {
        let now = self.now();
        let taken = self.inner.borrow_mut().take_track(component, key);
        let (track, released) = taken?;
        let ratio = ProgressRatio(track.driver.progress(now));
        tracing::trace!("aborted {:?}.{} at {:.2}", component, key, ratio.0);
        release(released);
        track.resolver.resolve(AnimationOutcome::Aborted);
        Some(ratio)
    }

    fn abort_track(&self, track: TrackId, outcome: AnimationOutcome) -> Option<ProgressRatio> {
        let (component, key) = self.inner.borrow().locations.get(track).cloned()?;
        let now = self.now();
        let (track, released) = self.inner.borrow_mut().take_track(component, &key)?;
        let ratio = ProgressRatio(track.driver.progress(now));
        release(released);
        track.resolver.resolve(outcome);
        Some(ratio)
    }

    /// Drop a component and settle its completions as detached
    pub fn detach(&self, component: ComponentId) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let removed = inner.entries.shift_remove(&component);
            if let Some(entry) = &removed {
                for track in entry.tracks.values() {
                    inner.locations.remove(track.id);
                }
            }
            inner.sync_running();
            removed
        };
        let Some(entry) = removed else {
            return;
        };
        tracing::debug!(
            "detached {:?} with {} animation(s) in flight",
            component,
            entry.tracks.len()
        );
        release(entry.hooks);
        for (_, track) in entry.tracks {
            track.resolver.resolve(AnimationOutcome::Detached);
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance every animation to the clock's current time
    ///
    /// Returns true if another frame is needed.
    pub fn tick(&self) -> bool {
        let now = self.now();
        self.tick_at(now)
    }

    /// Advance every animation to `now` (milliseconds)
    pub fn tick_at(&self, now: f64) -> bool {
        let mut writes: Vec<(Component, Vec<(String, Value)>)> = Vec::new();
        let mut finished: Vec<Resolver<AnimationOutcome>> = Vec::new();
        let mut detached: Vec<Resolver<AnimationOutcome>> = Vec::new();
        let mut released: Vec<Subscription> = Vec::new();

        {
            let mut inner = self.inner.borrow_mut();
            inner.frame_requested = false;
            inner.frames += 1;
            let SchedulerInner {
                entries, locations, ..
            } = &mut *inner;

            entries.retain(|id, entry| {
                let component = match entry.component.upgrade() {
                    Some(component) if !component.is_destroyed() => component,
                    _ => {
                        tracing::warn!("dropping {:?}: destroyed mid-animation", id);
                        for (_, track) in entry.tracks.drain(..) {
                            locations.remove(track.id);
                            detached.push(track.resolver);
                        }
                        released.append(&mut entry.hooks);
                        return false;
                    }
                };

                let mut batch = Vec::new();
                entry.tracks.retain(|key, track| {
                    let (value, done) = track.driver.advance(now);
                    if let Some(value) = value {
                        batch.push((key.clone(), value));
                    }
                    if done {
                        locations.remove(track.id);
                        finished.push(track.resolver.clone());
                    }
                    !done
                });
                if !batch.is_empty() {
                    writes.push((component, batch));
                }
                if entry.tracks.is_empty() {
                    released.append(&mut entry.hooks);
                    return false;
                }
                true
            });
            inner.sync_running();
        }

        release(released);
        for (component, batch) in writes {
            tracing::trace!("frame write {:?}: {} key(s)", component.id(), batch.len());
            component.set_from(WriteOrigin::Animation, batch);
        }
        for resolver in finished {
            resolver.resolve(AnimationOutcome::Finished);
        }
        for resolver in detached {
            resolver.resolve(AnimationOutcome::Detached);
        }

        let request = self.inner.borrow_mut().claim_frame();
        if let Some(request) = request {
            request();
        }
        self.is_running()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Whether any component has an animation in flight
    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Whether a frame has been requested and not yet ticked
    pub fn frame_requested(&self) -> bool {
        self.inner.borrow().frame_requested
    }

    pub fn active_components(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn active_records(&self) -> usize {
        self.inner.borrow().locations.len()
    }

    pub fn is_registered(&self, component: ComponentId) -> bool {
        self.inner.borrow().entries.contains_key(&component)
    }

    pub fn is_animating(&self, component: ComponentId, key: &str) -> bool {
        self.inner
            .borrow()
            .entries
            .get(&component)
            .map_or(false, |entry| entry.tracks.contains_key(key))
    }

    /// Ticks processed so far
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frames
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

fn release(subscriptions: impl IntoIterator<Item = Subscription>) {
    for mut subscription in subscriptions {
        subscription.cancel();
    }
}

/// A weak handle to the frame scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    pub fn upgrade(&self) -> Option<FrameScheduler> {
        self.inner.upgrade().map(|inner| FrameScheduler { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
