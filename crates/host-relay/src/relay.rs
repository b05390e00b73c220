use std::sync::Arc;

use framerelay_context::{
    EventKind, Listener, MessageEvent, Teardown, Window, WindowEvent, WindowRef,
};
use framerelay_protocol::{Envelope, Level, RelayEvent};
use framerelay_value::{Boundary, Value, isolate};

use crate::options::HostRelayOptions;

/// Handle that removes the host-side listener.
pub type Detach = Teardown;

/// Starts accepting relay envelopes on `window`'s message channel.
///
/// A message is accepted only if it is relay traffic, its origin is
/// allowed, and (when `iframe` is set) it was sent by that frame's current
/// window. Accepted events go to `on_event`, then to the console when
/// `forward_to_console` is set. Neither step's failure escapes.
///
/// Without a window this does nothing and returns a no-op handle.
pub fn attach(window: Option<&WindowRef>, options: HostRelayOptions) -> Detach {
    let Some(window) = window else {
        tracing::debug!("no window available, host relay not attached");
        return Detach::noop();
    };

    tracing::debug!(
        allowed_origins = ?options.allowed_origins,
        frame_bound = options.iframe.is_some(),
        forward_to_console = options.forward_to_console,
        "host relay attached"
    );

    let weak = Arc::downgrade(window);
    let console_window = weak.clone();
    let listener: Listener = Arc::new(move |event: &WindowEvent| {
        let WindowEvent::Message(message) = event else {
            return;
        };
        let Some(accepted) = accept(message, &options) else {
            return;
        };

        if let Some(callback) = &options.on_event {
            isolate(Boundary::Callback, || {
                callback(&accepted);
                Ok(())
            });
        }
        if options.forward_to_console
            && let Some(window) = console_window.upgrade()
        {
            forward(window.as_ref(), &accepted);
        }
    });
    let id = window.add_event_listener(EventKind::Message, listener);

    Detach::new(move || {
        if let Some(window) = weak.upgrade() {
            window.remove_event_listener(EventKind::Message, id);
            tracing::debug!("host relay detached");
        }
    })
}

/// Applies the three filters in order, returning the event if all pass.
fn accept(message: &MessageEvent, options: &HostRelayOptions) -> Option<RelayEvent> {
    let envelope = match Envelope::from_message(message.data.as_ref()) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::trace!(origin = %message.origin, reason = %err, "message ignored");
            return None;
        }
    };

    if !options.allowed_origins.allows(&message.origin) {
        tracing::trace!(origin = %message.origin, "envelope rejected: origin not allowed");
        return None;
    }

    if let Some(iframe) = &options.iframe {
        let expected = iframe.content_window();
        if expected.is_none() || expected != message.source {
            tracing::trace!(
                origin = %message.origin,
                "envelope rejected: not from the bound frame"
            );
            return None;
        }
    }

    Some(RelayEvent {
        envelope,
        origin: message.origin.clone(),
    })
}

/// Re-emits `event` on the host console under an `[iframe <origin>]` tag.
fn forward(window: &dyn Window, event: &RelayEvent) {
    let level = event.envelope.level;
    let console = window.console();
    let Some(method) = console.get(level).or_else(|| console.get(Level::Log)) else {
        return;
    };

    let mut args = Vec::with_capacity(event.envelope.args.len() + 1);
    args.push(Value::from(format!("[iframe {}]", event.origin)));
    args.extend(event.envelope.args.iter().map(Value::from));

    isolate(Boundary::Console, || method(&args));
}
