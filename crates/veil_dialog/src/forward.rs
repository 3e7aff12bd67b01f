//! Relaying state and events between nested widgets
//!
//! A wrapper widget (Alert around Dialog around Modal) owns the options its
//! host sets and re-exposes the events of the widget it wraps. These helpers
//! do the plumbing; the returned subscription cancels every relay at once.

use veil_core::{Component, ObserveOptions, Subscription};

/// Copy `keys` from `from` to `to`, now and on every later change
///
/// `to` is held weakly, so the relay does not keep it alive.
pub fn forward_data(from: &Component, to: &Component, keys: &[&str]) -> Subscription {
    let subscriptions = keys.iter().map(|key| {
        let target = to.downgrade();
        let name = key.to_string();
        from.observe(
            key,
            move |value, _| {
                if let Some(target) = target.upgrade() {
                    target.set([(name.clone(), value.clone())]);
                }
            },
            ObserveOptions::default(),
        )
    });
    Subscription::merge(subscriptions.collect::<Vec<_>>())
}

/// Re-fire the named events of `from` on `to`, with the same payload
pub fn forward_events(from: &Component, to: &Component, names: &[&str]) -> Subscription {
    let subscriptions = names.iter().map(|name| {
        let target = to.downgrade();
        let event = name.to_string();
        from.on(name, move |data| {
            if let Some(target) = target.upgrade() {
                target.fire(&event, data.clone());
            }
        })
    });
    Subscription::merge(subscriptions.collect::<Vec<_>>())
}
