mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{record, Harness};
use veil_core::{Key, ObserveOptions, Value};
use veil_dialog::{fires, Modal, ModalConfig};

#[test]
fn test_reversing_mid_open_hides_in_elapsed_time() {
    let h = Harness::new();
    let modal = Modal::new(&h.ctx, h.ctx.body(), ModalConfig::tweened()).unwrap();
    let log = record(modal.component(), &[fires::OPENED, fires::HIDDEN]);

    h.frame_after(85.0);
    assert!(modal.is_transitioning());
    modal.dismiss(Value::Null).unwrap();

    h.frame_after(84.0);
    assert!(modal.is_transitioning());
    assert!(!modal.is_hidden());

    h.frame_after(10.0);
    assert!(modal.is_hidden());
    assert!(!modal.is_transitioning());
    assert_eq!(*log.borrow(), vec!["hidden"]);
    assert_eq!(
        h.ctx.document().style(modal.root(), "visibility").as_deref(),
        Some("hidden")
    );
}

#[test]
fn test_frame_loop_only_runs_while_animating() {
    let h = Harness::new();
    let requests = Rc::new(Cell::new(0));
    let counter = requests.clone();
    h.ctx
        .scheduler()
        .set_frame_requester(move || counter.set(counter.get() + 1));

    let modal = Modal::new(
        &h.ctx,
        h.ctx.body(),
        ModalConfig::instant().with_initially_hidden(true),
    )
    .unwrap();
    assert_eq!(requests.get(), 0);
    assert!(!h.ctx.scheduler().is_running());

    modal.open().unwrap();
    assert_eq!(requests.get(), 1);
    assert!(h.ctx.scheduler().is_running());

    assert!(!h.frame());
    assert!(modal.is_open());
    assert_eq!(requests.get(), 1);
    assert_eq!(h.ctx.scheduler().active_components(), 0);

    modal.dismiss(Value::Null).unwrap();
    assert_eq!(requests.get(), 2);
    h.settle();
    assert!(modal.is_hidden());
    assert_eq!(requests.get(), 2);
}

#[test]
fn test_unchanged_write_notifies_nobody() {
    let h = Harness::new();
    let modal = Modal::new(
        &h.ctx,
        h.ctx.body(),
        ModalConfig::instant().with_center(false),
    )
    .unwrap();
    h.settle();
    let doc = h.ctx.document();
    assert_eq!(doc.attribute(modal.root(), "data-center").as_deref(), Some("false"));

    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = calls.clone();
    let _watch = modal.component().observe(
        "center",
        move |value, _| sink.borrow_mut().push(value.clone()),
        ObserveOptions::changes_only(),
    );

    modal.component().set([("center", false)]);
    assert!(calls.borrow().is_empty());

    modal.component().set([("center", true)]);
    assert_eq!(*calls.borrow(), vec![Value::Bool(true)]);
    assert_eq!(doc.attribute(modal.root(), "data-center").as_deref(), Some("true"));
}

#[test]
fn test_destroy_mid_animation_stops_frames() {
    let h = Harness::new();
    let modal = Modal::new(&h.ctx, h.ctx.body(), ModalConfig::tweened()).unwrap();
    let log = record(modal.component(), &[fires::OPENED, fires::HIDDEN]);
    let root = modal.root();

    h.frame();
    assert_eq!(h.ctx.scheduler().active_components(), 1);
    modal.destroy();

    assert_eq!(h.ctx.scheduler().active_components(), 0);
    assert!(!h.ctx.document().exists(root));
    assert!(!h.frame());
    h.ctx.flush();
    assert!(log.borrow().is_empty());
    assert!(h.ctx.stack().is_empty());
}

#[test]
fn test_escape_while_opening_dismisses() {
    let h = Harness::new();
    let modal = Modal::new(&h.ctx, h.ctx.body(), ModalConfig::standard()).unwrap();
    let log = record(
        modal.component(),
        &[fires::RESULT, fires::DISMISSED, fires::HIDING, fires::OPENED, fires::HIDDEN],
    );
    h.frame();
    h.press(Key::Escape);
    h.settle();
    assert_eq!(*log.borrow(), vec!["result", "dismissed", "hiding", "hidden"]);
}
