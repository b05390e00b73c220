//! The browsing-context collaborators the relay consumes: a leveled console,
//! a window with a message channel and global error notifications, and the
//! handles that undo an attachment.
//!
//! [`Window`] is the seam. [`MemoryWindow`] implements it in memory, with
//! queued message delivery and parent/child frames, so the relay can run
//! and be tested outside a browser.

pub mod console;
pub mod memory;
pub mod teardown;
pub mod window;

pub use console::{ConsoleCall, ConsoleMethod, ConsoleRecorder, ConsoleTable};
pub use memory::{FrameElement, MemoryWindow};
pub use teardown::Teardown;
pub use window::{
    EmbeddedFrame, ErrorEvent, EventKind, Listener, ListenerId, MessageEvent, MessageSource,
    RejectionEvent, Window, WindowEvent, WindowId, WindowRef,
};
