use std::fmt;
use std::sync::{Arc, Mutex};

use framerelay_value::{Boundary, isolate};

type Undo = Box<dyn FnOnce() + Send>;

/// Handle that undoes an attachment.
///
/// [`run`](Teardown::run) executes the undo step synchronously, at most
/// once across all clones; later calls do nothing. This is the only
/// cancellation primitive in the relay.
#[derive(Clone)]
pub struct Teardown {
    undo: Arc<Mutex<Option<Undo>>>,
}

impl Teardown {
    pub fn new<F>(undo: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            undo: Arc::new(Mutex::new(Some(Box::new(undo)))),
        }
    }

    /// A handle with nothing to undo.
    pub fn noop() -> Self {
        Self {
            undo: Arc::new(Mutex::new(None)),
        }
    }

    /// Undoes the attachment if that has not happened yet.
    pub fn run(&self) {
        let undo = match self.undo.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(undo) = undo {
            isolate(Boundary::Teardown, || {
                undo();
                Ok(())
            });
        }
    }

    /// Whether there is nothing left to undo.
    pub fn is_done(&self) -> bool {
        self.undo.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }

    /// Whether both handles undo the same attachment.
    pub fn same_as(&self, other: &Teardown) -> bool {
        Arc::ptr_eq(&self.undo, &other.undo)
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("done", &self.is_done())
            .finish()
    }
}
