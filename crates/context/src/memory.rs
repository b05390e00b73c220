//! In-memory browsing contexts.
//!
//! A [`MemoryWindow`] behaves like a browser window for the purposes of the
//! relay: it has a console, a location, an optional parent, listeners, and
//! a message queue. Posted messages are queued on the target and delivered
//! by [`MemoryWindow::dispatch_pending`], mirroring the event loop's
//! separate task for each message.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use framerelay_protocol::constants::ANY_ORIGIN;
use framerelay_value::{Boundary, Thrown, Value, isolate};

use crate::console::ConsoleTable;
use crate::window::{
    EmbeddedFrame, ErrorEvent, EventKind, Listener, ListenerId, MessageEvent, MessageSource,
    RejectionEvent, Window, WindowEvent, WindowId, WindowRef,
};

struct Registered {
    id: ListenerId,
    kind: EventKind,
    listener: Listener,
}

/// A window living in process memory.
pub struct MemoryWindow {
    id: WindowId,
    origin: String,
    me: Weak<MemoryWindow>,
    top_level: bool,
    parent: Mutex<Option<Weak<MemoryWindow>>>,
    console: ConsoleTable,
    href: Mutex<Option<String>>,
    closed: AtomicBool,
    listeners: Mutex<Vec<Registered>>,
    next_listener: AtomicU64,
    queue: Mutex<VecDeque<MessageEvent>>,
}

impl MemoryWindow {
    /// A top-level window: its own parent.
    pub fn top(origin: impl Into<String>) -> Arc<Self> {
        Self::build(origin.into(), None)
    }

    /// A window embedded in `parent`.
    pub fn child(parent: &Arc<MemoryWindow>, origin: impl Into<String>) -> Arc<Self> {
        Self::build(origin.into(), Some(Arc::downgrade(parent)))
    }

    fn build(origin: String, parent: Option<Weak<MemoryWindow>>) -> Arc<Self> {
        let href = format!("{origin}/");
        Arc::new_cyclic(|me| MemoryWindow {
            id: WindowId::next(),
            origin,
            me: me.clone(),
            top_level: parent.is_none(),
            parent: Mutex::new(parent),
            console: ConsoleTable::new(),
            href: Mutex::new(Some(href)),
            closed: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            queue: Mutex::new(VecDeque::new()),
        })
    }

    /// This window as a trait object.
    pub fn as_window(self: &Arc<Self>) -> WindowRef {
        Arc::clone(self) as WindowRef
    }

    /// The element that embeds this window, as its host sees it.
    pub fn frame_element(self: &Arc<Self>) -> FrameElement {
        FrameElement {
            content: Mutex::new(Some(Arc::downgrade(self))),
        }
    }

    pub fn set_location(&self, href: impl Into<String>) {
        if let Ok(mut slot) = self.href.lock() {
            *slot = Some(href.into());
        }
    }

    /// Makes the location unreadable, as for a cross-origin document.
    pub fn set_location_inaccessible(&self) {
        if let Ok(mut slot) = self.href.lock() {
            *slot = None;
        }
    }

    /// Cuts the link to the parent, as when the frame is removed.
    pub fn sever_parent(&self) {
        if let Ok(mut slot) = self.parent.lock() {
            *slot = None;
        }
    }

    /// Closes the window. Posting to a closed window throws.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut queue) = self.queue.lock() {
            queue.clear();
        }
    }

    /// Number of messages waiting for delivery.
    pub fn pending_messages(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Delivers every queued message to the message listeners, in the
    /// order posted. Returns how many were delivered.
    ///
    /// Messages posted while delivering are left for the next call.
    pub fn dispatch_pending(&self) -> usize {
        let batch: Vec<MessageEvent> = match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => return 0,
        };
        let count = batch.len();
        for event in batch {
            self.dispatch_event(&WindowEvent::Message(event));
        }
        count
    }

    /// Dispatches `event` synchronously to the listeners of its kind.
    ///
    /// A listener that fails does not stop the others.
    pub fn dispatch_event(&self, event: &WindowEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(registered) => registered
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| Arc::clone(&r.listener))
                .collect(),
            Err(_) => return,
        };
        for listener in listeners {
            isolate(Boundary::Callback, || {
                listener(event);
                Ok(())
            });
        }
    }

    /// Reports an uncaught error thrown by page script.
    pub fn raise_error(&self, message: impl Into<String>, error: Option<Value>) {
        self.dispatch_event(&WindowEvent::Error(ErrorEvent {
            message: message.into(),
            error,
        }));
    }

    /// Reports a rejected promise nobody handled.
    pub fn reject_unhandled(&self, reason: Value) {
        self.dispatch_event(&WindowEvent::UnhandledRejection(RejectionEvent { reason }));
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .map(|r| r.iter().filter(|l| l.kind == kind).count())
            .unwrap_or(0)
    }
}

impl Window for MemoryWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn console(&self) -> &ConsoleTable {
        &self.console
    }

    fn location_href(&self) -> Result<String, Thrown> {
        self.href
            .lock()
            .ok()
            .and_then(|href| href.clone())
            .ok_or_else(|| {
                Thrown::error(
                    "SecurityError",
                    "Blocked a frame from accessing a cross-origin location",
                )
            })
    }

    fn parent(&self) -> Option<WindowRef> {
        if self.top_level {
            return self.me.upgrade().map(|me| me as WindowRef);
        }
        let parent = self.parent.lock().ok()?.as_ref()?.upgrade()?;
        Some(parent as WindowRef)
    }

    fn post_message(
        &self,
        data: serde_json::Value,
        target_origin: &str,
        source: MessageSource,
    ) -> Result<(), Thrown> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Thrown::error("InvalidStateError", "target window is closed"));
        }
        if target_origin != ANY_ORIGIN && target_origin != self.origin {
            tracing::trace!(
                target_origin,
                recipient = %self.origin,
                "message dropped: target origin mismatch"
            );
            return Ok(());
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(MessageEvent {
                data: Some(data),
                origin: source.origin,
                source: Some(source.window),
            });
        }
        Ok(())
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut registered) = self.listeners.lock() {
            registered.push(Registered { id, kind, listener });
        }
        id
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        if let Ok(mut registered) = self.listeners.lock() {
            registered.retain(|r| !(r.id == id && r.kind == kind));
        }
    }
}

/// Host-side handle on the element embedding a [`MemoryWindow`].
pub struct FrameElement {
    content: Mutex<Option<Weak<MemoryWindow>>>,
}

impl FrameElement {
    /// Unloads the frame's document; the element no longer has a window.
    pub fn unload(&self) {
        if let Ok(mut content) = self.content.lock() {
            *content = None;
        }
    }
}

impl EmbeddedFrame for FrameElement {
    fn content_window(&self) -> Option<WindowId> {
        let content = self.content.lock().ok()?;
        content.as_ref()?.upgrade().map(|w| w.id)
    }
}
