use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use framerelay_value::{Thrown, Value};

use crate::console::ConsoleTable;

/// Shared handle to a window.
pub type WindowRef = Arc<dyn Window>;

/// Event listener registered on a window.
pub type Listener = Arc<dyn Fn(&WindowEvent) + Send + Sync>;

/// Identity of a window, as compared when matching a message's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    /// Allocates an identity not used by any other window in the process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        WindowId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle returned by [`Window::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Event types a window dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    Error,
    UnhandledRejection,
}

/// Sender of a posted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSource {
    pub window: WindowId,
    pub origin: String,
}

/// A message delivered over the channel.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub data: Option<serde_json::Value>,
    /// Origin of the sender.
    pub origin: String,
    /// Window that posted the message, when known.
    pub source: Option<WindowId>,
}

/// An uncaught synchronous error.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    /// Text the environment reports for the error.
    pub message: String,
    /// The thrown value itself, when available. Need not be an `Error`.
    pub error: Option<Value>,
}

/// An unhandled asynchronous rejection.
#[derive(Debug, Clone)]
pub struct RejectionEvent {
    pub reason: Value,
}

#[derive(Debug, Clone)]
pub enum WindowEvent {
    Message(MessageEvent),
    Error(ErrorEvent),
    UnhandledRejection(RejectionEvent),
}

impl WindowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WindowEvent::Message(_) => EventKind::Message,
            WindowEvent::Error(_) => EventKind::Error,
            WindowEvent::UnhandledRejection(_) => EventKind::UnhandledRejection,
        }
    }
}

/// A browsing context: the global object the relay attaches to.
pub trait Window: Send + Sync {
    fn id(&self) -> WindowId;

    /// Origin of the document currently loaded.
    fn origin(&self) -> String;

    fn console(&self) -> &ConsoleTable;

    /// Current location. Fails when the location cannot be read.
    fn location_href(&self) -> Result<String, Thrown>;

    /// The parent window. A top-level window is its own parent; `None` means
    /// the parent is unreachable.
    fn parent(&self) -> Option<WindowRef>;

    /// Whether this window is embedded in another.
    fn is_embedded(&self) -> bool {
        self.parent().is_some_and(|p| p.id() != self.id())
    }

    /// Posts `data` to this window on behalf of `source`.
    ///
    /// Delivery is restricted to documents whose origin equals
    /// `target_origin`, or to any document when it is `"*"`. Delivery is
    /// asynchronous and unacknowledged.
    fn post_message(
        &self,
        data: serde_json::Value,
        target_origin: &str,
        source: MessageSource,
    ) -> Result<(), Thrown>;

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Removes a listener. Unknown ids are ignored.
    fn remove_event_listener(&self, kind: EventKind, id: ListenerId);
}

/// The element embedding a frame, as seen from its host.
pub trait EmbeddedFrame: Send + Sync {
    /// Window currently loaded in the frame, if any.
    fn content_window(&self) -> Option<WindowId>;
}
