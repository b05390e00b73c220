use std::sync::{Arc, Weak};

use framerelay_context::{
    ConsoleMethod, ErrorEvent, EventKind, Listener, ListenerId, MessageSource, RejectionEvent,
    Teardown, Window, WindowEvent, WindowRef,
};
use framerelay_protocol::constants::{DEFAULT_SCRIPT_ERROR, ERROR_TYPE_MARKER};
use framerelay_protocol::{Envelope, Level};
use framerelay_value::{Boundary, ErrorValue, Thrown, Value, isolate, serialize};

use crate::options::FrameRelayOptions;

/// Builds envelopes and posts them to the parent window.
struct Poster {
    window: Weak<dyn Window>,
    target_origin: String,
    session_id: Option<String>,
}

impl Poster {
    /// Serializes `args` and posts one envelope. Never fails.
    fn post(&self, level: Level, args: &[Value]) {
        let Some(window) = self.window.upgrade() else {
            return;
        };

        let envelope = Envelope::new(
            level,
            args.iter().map(serialize).collect(),
            now_millis(),
            isolate(Boundary::Field, || window.location_href()),
            self.session_id.clone(),
        );

        isolate(Boundary::Transport, || {
            let data = envelope
                .to_message()
                .map_err(|e| Thrown::message(e.to_string()))?;
            let parent = window
                .parent()
                .ok_or_else(|| Thrown::error("TypeError", "parent window is unreachable"))?;
            parent.post_message(
                data,
                &self.target_origin,
                MessageSource {
                    window: window.id(),
                    origin: window.origin(),
                },
            )
        });
    }
}

/// Starts relaying `window`'s console to its parent.
///
/// Each selected console method is replaced by a wrapper that calls the
/// original first, then posts an envelope. With `capture_global_errors`,
/// uncaught errors and unhandled rejections are posted at `error` level.
///
/// Without a window this does nothing and returns a no-op handle.
pub fn start(window: Option<&WindowRef>, options: FrameRelayOptions) -> Teardown {
    let Some(window) = window else {
        tracing::debug!("no window available, frame relay not started");
        return Teardown::noop();
    };

    let poster = Arc::new(Poster {
        window: Arc::downgrade(window),
        target_origin: options.target_origin.clone(),
        session_id: options.session_id.clone(),
    });

    // Exact references captured here are what teardown puts back.
    let mut originals: Vec<(Level, ConsoleMethod)> = Vec::new();
    for level in options.level_mask().iter() {
        let Some(original) = window.console().get(level) else {
            continue;
        };
        window
            .console()
            .set(level, wrap(level, Arc::clone(&original), Arc::clone(&poster)));
        originals.push((level, original));
    }

    let mut listeners: Vec<(EventKind, ListenerId)> = Vec::new();
    if options.capture_global_errors {
        let p = Arc::clone(&poster);
        let on_error: Listener = Arc::new(move |event: &WindowEvent| {
            if let WindowEvent::Error(ev) = event {
                p.post(Level::Error, &[uncaught_error(ev)]);
            }
        });
        listeners.push((
            EventKind::Error,
            window.add_event_listener(EventKind::Error, on_error),
        ));

        let p = Arc::clone(&poster);
        let on_rejection: Listener = Arc::new(move |event: &WindowEvent| {
            if let WindowEvent::UnhandledRejection(ev) = event {
                p.post(Level::Error, &[rejection_error(ev)]);
            }
        });
        listeners.push((
            EventKind::UnhandledRejection,
            window.add_event_listener(EventKind::UnhandledRejection, on_rejection),
        ));
    }

    tracing::debug!(
        levels = originals.len(),
        global_errors = options.capture_global_errors,
        target_origin = %options.target_origin,
        "frame relay started"
    );

    let weak = Arc::downgrade(window);
    Teardown::new(move || {
        let Some(window) = weak.upgrade() else {
            return;
        };
        for (level, original) in originals {
            window.console().set(level, original);
        }
        for (kind, id) in listeners {
            window.remove_event_listener(kind, id);
        }
        tracing::debug!("frame relay torn down");
    })
}

/// Console wrapper: original first, then the relay. Neither step's failure
/// reaches the caller.
fn wrap(level: Level, original: ConsoleMethod, poster: Arc<Poster>) -> ConsoleMethod {
    Arc::new(move |args: &[Value]| -> Result<(), Thrown> {
        isolate(Boundary::Console, || original(args));
        poster.post(level, args);
        Ok(())
    })
}

/// The thrown value if it is an error, otherwise a synthetic error carrying
/// the event's message.
fn uncaught_error(event: &ErrorEvent) -> Value {
    match &event.error {
        Some(error @ Value::Error(_)) => error.clone(),
        _ => {
            let message = if event.message.is_empty() {
                DEFAULT_SCRIPT_ERROR
            } else {
                event.message.as_str()
            };
            Value::error(ErrorValue::capture(ERROR_TYPE_MARKER, message))
        }
    }
}

/// The rejection reason if it is an error, otherwise a synthetic error
/// whose message is the reason's text.
fn rejection_error(event: &RejectionEvent) -> Value {
    match &event.reason {
        error @ Value::Error(_) => error.clone(),
        reason => {
            let text =
                isolate(Boundary::Field, || Ok(reason.to_display_string())).unwrap_or_default();
            Value::error(ErrorValue::capture(ERROR_TYPE_MARKER, text))
        }
    }
}

/// Current timestamp in milliseconds.
fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
