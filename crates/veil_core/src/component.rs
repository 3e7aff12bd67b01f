//! Observable component state
//!
//! A [`Component`] is a key/value store with change detection, keyed
//! observers, named events, computed fields and an optional mounted
//! [`Fragment`] that patches the document when state changes.
//!
//! A `set` call runs in a fixed order:
//!
//! 1. notify write hooks with every key written, changed or not (the
//!    animation scheduler listens here)
//! 2. diff the update against current state (see [`differs`]); stop if
//!    nothing changed
//! 3. merge, then recompute computed fields whose dependencies changed
//! 4. run `pre` observers for each changed key
//! 5. patch the fragment
//! 6. run `post` observers (registered with `defer: true`)
//!
//! An observer that is currently running is never re-entered for its own key
//! by a nested `set` issued from inside it.
//!
//! Handles are cheap clones of one shared instance. After [`Component::destroy`]
//! the instance is inert: every call becomes a silent no-op.
//!
//! # Example
//!
//! ```rust
//! use veil_core::component::{Component, ObserveOptions};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let component = Component::with_state([("count", 0)]);
//! let seen = Rc::new(Cell::new(0.0));
//!
//! let s = seen.clone();
//! let _sub = component.observe(
//!     "count",
//!     move |value, _old| s.set(value.as_f64().unwrap_or_default()),
//!     ObserveOptions::default(),
//! );
//!
//! component.set([("count", 3)]);
//! assert_eq!(seen.get(), 3.0);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::subscription::Subscription;
use crate::value::{differs, Record, Value};

new_key_type! {
    /// Identifier of a registered observer
    pub struct ObserverId;
    /// Identifier of a registered event handler
    pub struct HandlerId;
    /// Identifier of a registered write hook
    pub struct WriteHookId;
}

/// Process-unique component identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Who issued a write
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteOrigin {
    /// Application or widget code
    #[default]
    External,
    /// The animation scheduler applying a frame
    Animation,
}

/// Options for [`Component::observe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Invoke the callback immediately with the current value
    pub init: bool,
    /// Run after the fragment patch instead of before it
    pub defer: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            init: true,
            defer: false,
        }
    }
}

impl ObserveOptions {
    /// Only fire on later changes
    pub fn changes_only() -> Self {
        Self {
            init: false,
            defer: false,
        }
    }

    /// Post-patch observer, fired on later changes only
    pub fn deferred() -> Self {
        Self {
            init: false,
            defer: true,
        }
    }
}

/// One changed key of a `set` call
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub key: String,
    pub value: Value,
    /// `None` when the key did not exist before
    pub previous: Option<Value>,
}

/// The keys changed by one `set` call, in the order they were written
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Every key of `state`, as if it had just been written
    pub fn from_state(state: &Record) -> Self {
        Self {
            changes: state
                .iter()
                .map(|(key, value)| Change {
                    key: key.clone(),
                    value: value.clone(),
                    previous: None,
                })
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.changes.iter().any(|c| c.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&Change> {
        self.changes.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn record(&mut self, key: String, value: Value, previous: Option<Value>) {
        match self.changes.iter_mut().find(|c| c.key == key) {
            // Same key twice in one update: keep the original previous value
            Some(existing) => existing.value = value,
            None => self.changes.push(Change {
                key,
                value,
                previous,
            }),
        }
    }
}

/// The document patcher mounted on a component
pub trait Fragment {
    /// Apply the changed keys to the document
    fn update(&mut self, changed: &ChangeSet, state: &Record);

    /// Detach the fragment's nodes from their parent
    fn unmount(&mut self) {}

    /// Release everything the fragment created
    fn destroy(&mut self) {}
}

type ObserverFn = Rc<dyn Fn(&Value, Option<&Value>)>;
type HandlerFn = Rc<dyn Fn(&Value)>;
type ComputeFn = Rc<dyn Fn(&Record) -> Value>;
type WriteHookFn = Rc<dyn Fn(WriteOrigin, &[String])>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
    Pre,
    Post,
}

struct Observer {
    key: String,
    group: Group,
    callback: ObserverFn,
}

#[derive(Clone)]
struct Computed {
    name: String,
    deps: Vec<String>,
    compute: ComputeFn,
}

struct ComponentInner {
    id: ComponentId,
    state: Record,
    observers: SlotMap<ObserverId, Observer>,
    pre: FxHashMap<String, SmallVec<[ObserverId; 2]>>,
    post: FxHashMap<String, SmallVec<[ObserverId; 2]>>,
    handlers: SlotMap<HandlerId, HandlerFn>,
    events: FxHashMap<String, SmallVec<[HandlerId; 4]>>,
    computed: Vec<Computed>,
    write_hooks: SlotMap<WriteHookId, WriteHookFn>,
    fragment: Option<Box<dyn Fragment>>,
    /// Observers currently executing
    dispatching: FxHashSet<ObserverId>,
    destroying: bool,
    destroyed: bool,
}

impl ComponentInner {
    fn remove_observer(&mut self, id: ObserverId) {
        let Some(observer) = self.observers.remove(id) else {
            return;
        };
        let table = match observer.group {
            Group::Pre => &mut self.pre,
            Group::Post => &mut self.post,
        };
        if let Some(ids) = table.get_mut(&observer.key) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                table.remove(&observer.key);
            }
        }
    }

    fn remove_handler(&mut self, event: &str, id: HandlerId) {
        if self.handlers.remove(id).is_none() {
            return;
        }
        if let Some(ids) = self.events.get_mut(event) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.events.remove(event);
            }
        }
    }
}

/// Releases an observer's dispatching mark, even if the callback unwinds
struct DispatchGuard {
    inner: Weak<RefCell<ComponentInner>>,
    id: ObserverId,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut inner) = inner.try_borrow_mut() {
                inner.dispatching.remove(&self.id);
            }
        }
    }
}

fn canonical_event(name: &str) -> &str {
    if name == "teardown" {
        "destroy"
    } else {
        name
    }
}

/// Shared handle to a component instance
#[derive(Clone)]
pub struct Component {
    inner: Rc<RefCell<ComponentInner>>,
}

/// Non-owning component handle
#[derive(Clone)]
pub struct WeakComponent {
    inner: Weak<RefCell<ComponentInner>>,
}

impl WeakComponent {
    pub fn upgrade(&self) -> Option<Component> {
        self.inner.upgrade().map(|inner| Component { inner })
    }
}

impl Component {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComponentInner {
                id: ComponentId::next(),
                state: Record::new(),
                observers: SlotMap::with_key(),
                pre: FxHashMap::default(),
                post: FxHashMap::default(),
                handlers: SlotMap::with_key(),
                events: FxHashMap::default(),
                computed: Vec::new(),
                write_hooks: SlotMap::with_key(),
                fragment: None,
                dispatching: FxHashSet::default(),
                destroying: false,
                destroyed: false,
            })),
        }
    }

    /// Create a component with initial state (no observers fire)
    pub fn with_state<K, V, I>(initial: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let component = Self::new();
        {
            let mut inner = component.inner.borrow_mut();
            for (key, value) in initial {
                inner.state.insert(key.into(), value.into());
            }
        }
        component
    }

    pub fn id(&self) -> ComponentId {
        self.inner.borrow().id
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current value of `key`; `None` if absent or destroyed
    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.borrow();
        if inner.destroyed {
            return None;
        }
        inner.state.get(key).cloned()
    }

    /// Snapshot of the whole state (empty once destroyed)
    pub fn state(&self) -> Record {
        self.inner.borrow().state.clone()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Apply a partial update issued by application code
    pub fn set<K, V, I>(&self, update: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.set_from(WriteOrigin::External, update);
    }

    /// Apply a partial update, tagging who issued it
    pub fn set_from<K, V, I>(&self, origin: WriteOrigin, update: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<(String, Value)> = update
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if entries.is_empty() || self.is_destroyed() {
            return;
        }
        let keys: SmallVec<[String; 4]> = entries.iter().map(|(k, _)| k.clone()).collect();
        self.run_write_hooks(origin, &keys);

        let mut changed = ChangeSet::default();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            for (key, value) in entries {
                let previous = inner.state.get(&key).cloned();
                if previous.as_ref().map_or(true, |old| differs(&value, old)) {
                    inner.state.insert(key.clone(), value.clone());
                    changed.record(key, value, previous);
                }
            }
        }
        if changed.is_empty() {
            return;
        }

        self.recompute(&mut changed);
        self.dispatch_observers(Group::Pre, &changed);
        self.patch_fragment(&changed);
        self.dispatch_observers(Group::Post, &changed);
    }

    fn recompute(&self, changed: &mut ChangeSet) {
        let computed: Vec<Computed> = self.inner.borrow().computed.clone();
        for field in computed {
            if !field.deps.iter().any(|dep| changed.contains(dep)) {
                continue;
            }
            let snapshot = self.state();
            let value = (field.compute)(&snapshot);
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            let previous = inner.state.get(&field.name).cloned();
            if previous.as_ref().map_or(true, |old| differs(&value, old)) {
                inner.state.insert(field.name.clone(), value.clone());
                changed.record(field.name, value, previous);
            }
        }
    }

    fn run_write_hooks(&self, origin: WriteOrigin, keys: &[String]) {
        let hooks: SmallVec<[WriteHookFn; 2]> =
            self.inner.borrow().write_hooks.values().cloned().collect();
        for hook in hooks {
            hook(origin, keys);
        }
    }

    fn dispatch_observers(&self, group: Group, changed: &ChangeSet) {
        for change in changed.iter() {
            let ids: SmallVec<[ObserverId; 4]> = {
                let inner = self.inner.borrow();
                if inner.destroyed {
                    return;
                }
                let table = match group {
                    Group::Pre => &inner.pre,
                    Group::Post => &inner.post,
                };
                match table.get(&change.key) {
                    Some(ids) => ids.iter().copied().collect(),
                    None => continue,
                }
            };
            for id in ids {
                self.invoke_observer(id, &change.value, change.previous.as_ref());
            }
        }
    }

    fn invoke_observer(&self, id: ObserverId, value: &Value, previous: Option<&Value>) {
        let callback = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed || inner.dispatching.contains(&id) {
                return;
            }
            let callback = match inner.observers.get(id) {
                Some(observer) => observer.callback.clone(),
                None => return,
            };
            inner.dispatching.insert(id);
            callback
        };
        let _guard = DispatchGuard {
            inner: Rc::downgrade(&self.inner),
            id,
        };
        callback(value, previous);
    }

    fn patch_fragment(&self, changed: &ChangeSet) {
        let (fragment, state) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            (inner.fragment.take(), inner.state.clone())
        };
        let Some(mut fragment) = fragment else {
            return;
        };
        fragment.update(changed, &state);

        let stale = {
            let mut inner = self.inner.borrow_mut();
            if !inner.destroyed && inner.fragment.is_none() {
                inner.fragment = Some(fragment);
                None
            } else {
                Some(fragment)
            }
        };
        if let Some(mut stale) = stale {
            stale.destroy();
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Observe a key
    ///
    /// The callback receives `(new, old)`; `old` is `None` for the initial
    /// call and for keys that did not exist before.
    pub fn observe<F>(&self, key: &str, callback: F, options: ObserveOptions) -> Subscription
    where
        F: Fn(&Value, Option<&Value>) + 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Subscription::noop();
            }
            let group = if options.defer { Group::Post } else { Group::Pre };
            let id = inner.observers.insert(Observer {
                key: key.to_string(),
                group,
                callback: Rc::new(callback),
            });
            let table = match group {
                Group::Pre => &mut inner.pre,
                Group::Post => &mut inner.post,
            };
            table.entry(key.to_string()).or_default().push(id);
            id
        };

        if options.init {
            let current = self.get(key).unwrap_or_default();
            self.invoke_observer(id, &current, None);
        }

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().remove_observer(id);
            }
        })
    }

    /// Listen for a named event; `"teardown"` is an alias of `"destroy"`
    pub fn on<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        let event = canonical_event(event).to_string();
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Subscription::noop();
            }
            let id = inner.handlers.insert(Rc::new(handler));
            inner.events.entry(event.clone()).or_default().push(id);
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().remove_handler(&event, id);
            }
        })
    }

    /// Dispatch a discrete event to its handlers
    ///
    /// Handlers run in registration order over a snapshot taken at the
    /// start; a handler cancelled by an earlier one is skipped.
    pub fn fire(&self, event: &str, data: impl Into<Value>) {
        let event = canonical_event(event);
        let ids: SmallVec<[HandlerId; 4]> = {
            let inner = self.inner.borrow();
            if inner.destroyed {
                return;
            }
            match inner.events.get(event) {
                Some(ids) => ids.iter().copied().collect(),
                None => return,
            }
        };
        let data = data.into();
        for id in ids {
            let handler = {
                let inner = self.inner.borrow();
                if inner.destroyed {
                    return;
                }
                inner.handlers.get(id).cloned()
            };
            if let Some(handler) = handler {
                handler(&data);
            }
        }
    }

    /// Register a computed field, recomputed whenever one of `deps` changes
    pub fn computed<F>(&self, name: &str, deps: &[&str], compute: F)
    where
        F: Fn(&Record) -> Value + 'static,
    {
        let compute: ComputeFn = Rc::new(compute);
        let snapshot = {
            let inner = self.inner.borrow();
            if inner.destroyed {
                return;
            }
            inner.state.clone()
        };
        let value = compute(&snapshot);
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return;
        }
        inner.state.insert(name.to_string(), value);
        inner.computed.push(Computed {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            compute,
        });
    }

    /// Register a hook called with the keys of every `set`, before diffing
    pub fn on_write<F>(&self, hook: F) -> Subscription
    where
        F: Fn(WriteOrigin, &[String]) + 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Subscription::noop();
            }
            inner.write_hooks.insert(Rc::new(hook))
        };
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().write_hooks.remove(id);
            }
        })
    }

    /// Mount the document patcher, replacing (and destroying) any previous one
    ///
    /// The fragment is first updated with the full current state.
    pub fn mount_fragment(&self, mut fragment: Box<dyn Fragment>) {
        let state = {
            let inner = self.inner.borrow();
            if inner.destroyed {
                return;
            }
            inner.state.clone()
        };
        fragment.update(&ChangeSet::from_state(&state), &state);
        let previous = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                Some(fragment)
            } else {
                inner.fragment.replace(fragment)
            }
        };
        if let Some(mut previous) = previous {
            previous.unmount();
            previous.destroy();
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Destroy and detach from the document
    pub fn destroy(&self) {
        self.destroy_with(true);
    }

    /// Fire `destroy`, tear down the fragment and drop all state
    ///
    /// With `detach == false` the fragment's nodes are left where they are
    /// (a parent being torn down removes them anyway).
    pub fn destroy_with(&self, detach: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed || inner.destroying {
                return;
            }
            inner.destroying = true;
        }

        self.fire("destroy", Value::Null);

        let (fragment, _released) = {
            let mut inner = self.inner.borrow_mut();
            inner.destroyed = true;
            inner.dispatching.clear();
            inner.pre.clear();
            inner.post.clear();
            inner.events.clear();
            let released = (
                std::mem::take(&mut inner.state),
                std::mem::take(&mut inner.observers),
                std::mem::take(&mut inner.handlers),
                std::mem::take(&mut inner.computed),
                std::mem::take(&mut inner.write_hooks),
            );
            (inner.fragment.take(), released)
        };

        if let Some(mut fragment) = fragment {
            if detach {
                fragment.unmount();
            }
            fragment.destroy();
        }
        tracing::trace!("component {:?} destroyed", self.id());
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Component")
            .field("id", &inner.id)
            .field("destroyed", &inner.destroyed)
            .field("keys", &inner.state.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct RecordingFragment {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Fragment for RecordingFragment {
        fn update(&mut self, changed: &ChangeSet, _state: &Record) {
            let keys: Vec<&str> = changed.keys().collect();
            self.log.borrow_mut().push(format!("patch {}", keys.join(",")));
        }

        fn unmount(&mut self) {
            self.log.borrow_mut().push("unmount".into());
        }

        fn destroy(&mut self) {
            self.log.borrow_mut().push("destroy".into());
        }
    }

    fn counter(calls: &Rc<Cell<u32>>) -> impl Fn(&Value, Option<&Value>) + 'static {
        let calls = calls.clone();
        move |_, _| calls.set(calls.get() + 1)
    }

    #[test]
    fn test_set_equal_scalar_is_noop() {
        let c = Component::with_state([("k", 1)]);
        let log = Rc::new(RefCell::new(Vec::new()));
        c.mount_fragment(Box::new(RecordingFragment { log: log.clone() }));
        log.borrow_mut().clear();

        let calls = Rc::new(Cell::new(0));
        let _sub = c.observe("k", counter(&calls), ObserveOptions::changes_only());
        c.set([("k", 1)]);

        assert_eq!(calls.get(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_object_values_always_dispatch() {
        let c = Component::with_state([("style", Value::record([("opacity", 1.0)]))]);
        let calls = Rc::new(Cell::new(0));
        let _sub = c.observe("style", counter(&calls), ObserveOptions::changes_only());
        c.set([("style", Value::record([("opacity", 1.0)]))]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_pre_patch_post_order() {
        let c = Component::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        c.mount_fragment(Box::new(RecordingFragment { log: log.clone() }));
        log.borrow_mut().clear();

        let l = log.clone();
        let _pre = c.observe(
            "x",
            move |_, _| l.borrow_mut().push("pre".into()),
            ObserveOptions::changes_only(),
        );
        let l = log.clone();
        let _post = c.observe(
            "x",
            move |_, _| l.borrow_mut().push("post".into()),
            ObserveOptions::deferred(),
        );

        c.set([("x", 1)]);
        assert_eq!(*log.borrow(), vec!["pre", "patch x", "post"]);
    }

    #[test]
    fn test_observer_not_reentered_for_own_key() {
        let c = Component::with_state([("count", 0)]);
        let calls = Rc::new(Cell::new(0));
        let handle = c.clone();
        let calls2 = calls.clone();
        let _sub = c.observe(
            "count",
            move |value, _| {
                calls2.set(calls2.get() + 1);
                let n = value.as_f64().unwrap_or_default();
                if n < 10.0 {
                    handle.set([("count", n + 1.0)]);
                }
            },
            ObserveOptions::changes_only(),
        );

        c.set([("count", 1)]);
        assert_eq!(calls.get(), 1);
        assert_eq!(c.get("count"), Some(Value::Number(2.0)));

        // The guard is released once the callback returns
        c.set([("count", 20)]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_observe_init_and_cancel() {
        let c = Component::with_state([("a", "x")]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut sub = c.observe(
            "a",
            move |value, old| s.borrow_mut().push((value.clone(), old.cloned())),
            ObserveOptions::default(),
        );
        c.set([("a", "y")]);
        sub.cancel();
        c.set([("a", "z")]);

        assert_eq!(
            *seen.borrow(),
            vec![
                (Value::from("x"), None),
                (Value::from("y"), Some(Value::from("x"))),
            ]
        );
    }

    #[test]
    fn test_computed_recomputes_on_dependency_change() {
        let c = Component::with_state([("hiding", false), ("opening", false)]);
        c.computed("transitioning", &["hiding", "opening"], |state| {
            let flag = |k: &str| state.get(k).map_or(false, Value::is_truthy);
            Value::Bool(flag("hiding") || flag("opening"))
        });
        assert_eq!(c.get("transitioning"), Some(Value::Bool(false)));

        let calls = Rc::new(Cell::new(0));
        let _sub = c.observe("transitioning", counter(&calls), ObserveOptions::changes_only());
        c.set([("opening", true)]);
        assert_eq!(c.get("transitioning"), Some(Value::Bool(true)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_write_hooks_see_origin() {
        let c = Component::new();
        let origins = Rc::new(RefCell::new(Vec::new()));
        let o = origins.clone();
        let _hook = c.on_write(move |origin, keys| {
            o.borrow_mut().push((origin, keys.len()));
        });
        c.set([("a", 1)]);
        c.set_from(WriteOrigin::Animation, [("a", 2), ("b", 3)]);
        // Unchanged writes still reach the hooks
        c.set([("a", 2)]);
        assert_eq!(
            *origins.borrow(),
            vec![
                (WriteOrigin::External, 1),
                (WriteOrigin::Animation, 2),
                (WriteOrigin::External, 1),
            ]
        );
    }

    #[test]
    fn test_teardown_alias_and_inert_after_destroy() {
        let c = Component::with_state([("k", 1)]);
        let log = Rc::new(RefCell::new(Vec::new()));
        c.mount_fragment(Box::new(RecordingFragment { log: log.clone() }));
        let l = log.clone();
        let _sub = c.on("teardown", move |_| l.borrow_mut().push("teardown".into()));

        c.destroy();
        assert_eq!(*log.borrow(), vec!["patch k", "teardown", "unmount", "destroy"]);
        assert!(c.is_destroyed());

        c.set([("k", 2)]);
        assert_eq!(c.get("k"), None);
        assert!(!c.on("x", |_| {}).is_active());
        c.fire("x", 1);
        c.destroy();
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_destroy_without_detach_skips_unmount() {
        let c = Component::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        c.mount_fragment(Box::new(RecordingFragment { log: log.clone() }));
        c.destroy_with(false);
        assert_eq!(log.borrow().last().map(String::as_str), Some("destroy"));
        assert!(!log.borrow().iter().any(|l| l == "unmount"));
    }

    #[test]
    fn test_fire_skips_handler_cancelled_mid_dispatch() {
        let c = Component::new();
        let calls = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let v = victim.clone();
        let _first = c.on("ping", move |_| {
            if let Some(sub) = v.borrow_mut().as_mut() {
                sub.cancel();
            }
        });
        let calls2 = calls.clone();
        *victim.borrow_mut() = Some(c.on("ping", move |_| calls2.set(calls2.get() + 1)));
        c.fire("ping", Value::Null);
        assert_eq!(calls.get(), 0);
        c.fire("ping", Value::Null);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_fire_snapshot_excludes_handlers_added_mid_dispatch() {
        let c = Component::new();
        let calls = Rc::new(Cell::new(0));
        let added: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let (weak, calls2, added2) = (c.downgrade(), calls.clone(), added.clone());
        let _first = c.on("ping", move |_| {
            if let Some(c) = weak.upgrade() {
                let calls = calls2.clone();
                added2
                    .borrow_mut()
                    .push(c.on("ping", move |_| calls.set(calls.get() + 1)));
            }
        });
        c.fire("ping", Value::Null);
        assert_eq!(calls.get(), 0);
        c.fire("ping", Value::Null);
        assert_eq!(calls.get(), 1);
    }
}
