//! Shared services for every widget in a document
//!
//! One `UiContext` is built at application start and handed to each widget.
//! Clones share the same document, scheduler, focus coordinator and stack.

use veil_animation::{FrameClock, FrameScheduler, SystemClock};
use veil_core::{DeferredQueue, Document, NodeId};
use veil_focus::{FocusCoordinator, ModalStack};

/// Bundle of the document and the services driving it
#[derive(Clone)]
pub struct UiContext {
    document: Document,
    tasks: DeferredQueue,
    scheduler: FrameScheduler,
    focus: FocusCoordinator,
    stack: ModalStack,
}

impl UiContext {
    pub fn new(document: Document, scheduler: FrameScheduler) -> Self {
        let tasks = DeferredQueue::new();
        let focus = FocusCoordinator::new(document.clone(), tasks.clone());
        let stack = ModalStack::new(tasks.clone());
        tracing::debug!("ui context created");
        Self {
            document,
            tasks,
            scheduler,
            focus,
            stack,
        }
    }

    /// Fresh document driven by `clock`
    pub fn with_clock(clock: impl FrameClock + 'static) -> Self {
        Self::new(Document::new(), FrameScheduler::new(clock))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn body(&self) -> NodeId {
        self.document.body()
    }

    pub fn tasks(&self) -> &DeferredQueue {
        &self.tasks
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn focus(&self) -> &FocusCoordinator {
        &self.focus
    }

    pub fn stack(&self) -> &ModalStack {
        &self.stack
    }

    /// Run the work deferred by the event that just finished dispatching
    ///
    /// Hosts call this after every input event they dispatch.
    pub fn flush(&self) -> usize {
        self.tasks.run_pending()
    }

    /// One display frame: advance animations, then drain deferred work
    ///
    /// Returns true while animations are still running.
    pub fn frame(&self) -> bool {
        let running = self.scheduler.tick();
        self.flush();
        running
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("stack", &self.stack)
            .field("pending_tasks", &self.tasks.len())
            .field("animating", &self.scheduler.is_running())
            .finish()
    }
}
