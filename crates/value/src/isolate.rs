//! Isolate-and-continue: run a side-effecting call whose failure must not
//! reach the caller.
//!
//! Every boundary where the relay touches code it does not own (a field
//! getter, the transport, a user callback, a console method) goes through
//! [`isolate`]. Thrown values and panics are both contained.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::value::Thrown;

/// Where an isolated call happens. Used only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Reading or serializing one field of a value.
    Field,
    /// Posting an envelope over the message channel.
    Transport,
    /// A consumer's event callback.
    Callback,
    /// Invoking a console method.
    Console,
    /// Undoing a previous attachment.
    Teardown,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Boundary::Field => "field",
            Boundary::Transport => "transport",
            Boundary::Callback => "callback",
            Boundary::Console => "console",
            Boundary::Teardown => "teardown",
        })
    }
}

/// Runs `f`, returning `None` if it throws or panics.
pub fn isolate<T, F>(boundary: Boundary, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, Thrown>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(thrown)) => {
            tracing::debug!(%boundary, error = %thrown, "isolated thrown value");
            None
        }
        Err(payload) => {
            tracing::debug!(%boundary, panic = panic_message(&*payload), "isolated panic");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_success() {
        assert_eq!(isolate(Boundary::Field, || Ok(7)), Some(7));
    }

    #[test]
    fn contains_thrown_values() {
        let out: Option<()> = isolate(Boundary::Transport, || Err(Thrown::message("offline")));
        assert!(out.is_none());
    }

    #[test]
    fn contains_panics() {
        let out: Option<()> = isolate(Boundary::Callback, || panic!("callback exploded"));
        assert!(out.is_none());
    }

    #[test]
    fn panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*boxed), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(&*boxed), "<non-string panic payload>");
    }
}
