use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use framerelay_context::{Teardown, WindowRef};
use framerelay_frame_relay::FrameRelayOptions;
use framerelay_host_relay::{Detach, HostRelayOptions};
use framerelay_protocol::Level;
use framerelay_protocol::constants::ADVISORY_PREFIX;
use framerelay_value::{Boundary, Value, isolate};

/// What [`Session::auto_attach`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoAttach {
    /// An explicit attach happened first; nothing was attached.
    Preempted,
    /// No window to attach to.
    Unavailable,
    /// Attached a producer: the window is embedded.
    Frame,
    /// Attached a consumer: the window is top-level.
    Host,
}

#[derive(Default)]
struct SessionState {
    producer: Option<Teardown>,
    consumer: Option<Detach>,
    explicitly_configured: bool,
    advisory_emitted: bool,
}

/// Tracks the active producer and consumer of one context.
///
/// Attaching a role first undoes the active attachment of that role, so at
/// most one of each is ever live. Clones share state.
#[derive(Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

#[derive(Clone, Copy)]
enum Role {
    Producer,
    Consumer,
}

impl Session {
    /// A fresh session with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide session, created on first use.
    pub fn global() -> &'static Session {
        static GLOBAL: OnceLock<Session> = OnceLock::new();
        GLOBAL.get_or_init(Session::new)
    }

    /// Relays `window`'s console to its parent, replacing any producer this
    /// session started before.
    ///
    /// Marks the session explicitly configured. The returned handle tears
    /// the producer down and forgets it, unless a later call already
    /// replaced it.
    pub fn relay_console_to_parent(
        &self,
        window: Option<&WindowRef>,
        options: FrameRelayOptions,
    ) -> Teardown {
        if let Some(prior) = self.take(Role::Producer) {
            prior.run();
        }
        let inner = framerelay_frame_relay::start(window, options);
        self.with_state(|state| {
            if !inner.is_done() {
                state.producer = Some(inner.clone());
            }
            state.explicitly_configured = true;
        });
        self.releasing(Role::Producer, inner)
    }

    /// Accepts relayed console output on `window`, replacing any consumer
    /// this session attached before.
    ///
    /// Marks the session explicitly configured. The returned handle detaches
    /// and forgets the consumer, unless a later call already replaced it.
    pub fn attach_console_relay(
        &self,
        window: Option<&WindowRef>,
        options: HostRelayOptions,
    ) -> Detach {
        if let Some(prior) = self.take(Role::Consumer) {
            prior.run();
        }
        let inner = framerelay_host_relay::attach(window, options);
        self.with_state(|state| {
            if !inner.is_done() {
                state.consumer = Some(inner.clone());
            }
            state.explicitly_configured = true;
        });
        self.releasing(Role::Consumer, inner)
    }

    /// Waits `delay`, then attaches a permissive default unless an explicit
    /// attach happened in the meantime.
    ///
    /// An embedded window gets a producer posting to any origin; a
    /// top-level window gets a consumer accepting any origin. A one-time
    /// advisory about the wildcard is written to the window's console.
    pub async fn auto_attach(&self, window: Option<WindowRef>, delay: Duration) -> AutoAttach {
        tokio::time::sleep(delay).await;

        if self.is_explicitly_configured() {
            tracing::debug!("auto-attach preempted by explicit configuration");
            return AutoAttach::Preempted;
        }
        let Some(window) = window else {
            tracing::debug!("auto-attach skipped: no window");
            return AutoAttach::Unavailable;
        };

        let (role, outcome) = if window.is_embedded() {
            (Role::Producer, AutoAttach::Frame)
        } else {
            (Role::Consumer, AutoAttach::Host)
        };

        if let Some(prior) = self.take(role) {
            prior.run();
        }
        let handle = match role {
            Role::Producer => {
                framerelay_frame_relay::start(Some(&window), FrameRelayOptions::default())
            }
            Role::Consumer => {
                framerelay_host_relay::attach(Some(&window), HostRelayOptions::default())
            }
        };

        let (preempted, emit_advisory) = self
            .with_state(|state| {
                if state.explicitly_configured {
                    return (true, false);
                }
                match role {
                    Role::Producer => state.producer = Some(handle.clone()),
                    Role::Consumer => state.consumer = Some(handle.clone()),
                }
                let first = !state.advisory_emitted;
                state.advisory_emitted = true;
                (false, first)
            })
            .unwrap_or((true, false));

        if preempted {
            handle.run();
            return AutoAttach::Preempted;
        }
        if emit_advisory {
            emit(&window, &advisory(outcome));
        }
        tracing::debug!(outcome = ?outcome, "auto-attached with permissive defaults");
        outcome
    }

    /// Undoes both attachments and clears every flag.
    pub fn reset(&self) {
        let handles = self.with_state(|state| {
            let handles = (state.producer.take(), state.consumer.take());
            *state = SessionState::default();
            handles
        });
        let Some((producer, consumer)) = handles else {
            return;
        };
        for handle in [producer, consumer].into_iter().flatten() {
            handle.run();
        }
    }

    /// Whether an explicit attach has happened since creation or reset.
    pub fn is_explicitly_configured(&self) -> bool {
        self.with_state(|state| state.explicitly_configured)
            .unwrap_or(false)
    }

    pub fn has_active_producer(&self) -> bool {
        self.with_state(|state| state.producer.is_some())
            .unwrap_or(false)
    }

    pub fn has_active_consumer(&self) -> bool {
        self.with_state(|state| state.consumer.is_some())
            .unwrap_or(false)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> Option<T> {
        self.state.lock().ok().map(|mut state| f(&mut state))
    }

    fn take(&self, role: Role) -> Option<Teardown> {
        self.with_state(|state| match role {
            Role::Producer => state.producer.take(),
            Role::Consumer => state.consumer.take(),
        })
        .flatten()
    }

    /// Wraps `inner` so running it also clears the slot, if the slot still
    /// holds `inner`.
    fn releasing(&self, role: Role, inner: Teardown) -> Teardown {
        let state = Arc::clone(&self.state);
        Teardown::new(move || {
            inner.run();
            if let Ok(mut state) = state.lock() {
                let slot = match role {
                    Role::Producer => &mut state.producer,
                    Role::Consumer => &mut state.consumer,
                };
                if slot.as_ref().is_some_and(|held| held.same_as(&inner)) {
                    *slot = None;
                }
            }
        })
    }
}

fn advisory(outcome: AutoAttach) -> String {
    match outcome {
        AutoAttach::Frame => format!(
            "{ADVISORY_PREFIX} Auto-enabled in iframe with default target origin \"*\". \
             For production, call relay_console_to_parent with a target_origin to restrict."
        ),
        _ => format!(
            "{ADVISORY_PREFIX} Auto-enabled in parent with default allowed origins \"*\". \
             For production, call attach_console_relay with allowed_origins to restrict."
        ),
    }
}

fn emit(window: &WindowRef, text: &str) {
    tracing::warn!("{text}");
    isolate(Boundary::Console, || {
        window.console().call(Level::Warn, &[Value::from(text)])
    });
}

#[cfg(test)]
mod tests {
    use framerelay_context::{ConsoleRecorder, EventKind, MemoryWindow, Window, WindowEvent};
    use framerelay_host_relay::AllowedOrigins;
    use framerelay_protocol::{Envelope, RelayEvent};

    use super::*;

    struct Page {
        host: Arc<MemoryWindow>,
        frame: Arc<MemoryWindow>,
        host_console: ConsoleRecorder,
        frame_console: ConsoleRecorder,
    }

    impl Page {
        fn new() -> Self {
            let host = MemoryWindow::top("https://host.example");
            let frame = MemoryWindow::child(&host, "https://embed.example");
            let host_console = ConsoleRecorder::new();
            host_console.install(host.console());
            let frame_console = ConsoleRecorder::new();
            frame_console.install(frame.console());
            Self {
                host,
                frame,
                host_console,
                frame_console,
            }
        }

        fn host(&self) -> WindowRef {
            self.host.as_window()
        }

        fn frame(&self) -> WindowRef {
            self.frame.as_window()
        }

        /// Raw envelopes delivered to the host from now on.
        fn capture(&self) -> Arc<Mutex<Vec<Envelope>>> {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            self.host.add_event_listener(
                EventKind::Message,
                Arc::new(move |event: &WindowEvent| {
                    if let WindowEvent::Message(m) = event
                        && let Ok(envelope) = Envelope::from_message(m.data.as_ref())
                    {
                        sink.lock().unwrap().push(envelope);
                    }
                }),
            );
            seen
        }
    }

    #[test]
    fn second_producer_replaces_the_first() {
        let page = Page::new();
        let original = page.frame.console().get(Level::Log).unwrap();
        let seen = page.capture();
        let session = Session::new();

        session.relay_console_to_parent(Some(&page.frame()), FrameRelayOptions::default());
        let second = session.relay_console_to_parent(
            Some(&page.frame()),
            FrameRelayOptions::default().with_session_id("second"),
        );

        page.frame.console().call(Level::Log, &[Value::from("once")]).unwrap();
        page.host.dispatch_pending();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].session_id.as_deref(), Some("second"));
        assert_eq!(page.frame_console.calls_at(Level::Log).len(), 1);

        second.run();
        let restored = page.frame.console().get(Level::Log).unwrap();
        assert!(Arc::ptr_eq(&restored, &original));
        assert!(!session.has_active_producer());
    }

    #[test]
    fn stale_handle_leaves_newer_attachment_alone() {
        let page = Page::new();
        let session = Session::new();

        let first = session.attach_console_relay(Some(&page.host()), HostRelayOptions::default());
        let second = session.attach_console_relay(
            Some(&page.host()),
            HostRelayOptions::default()
                .with_allowed_origins(AllowedOrigins::list(["https://embed.example"])),
        );
        assert_eq!(page.host.listener_count(EventKind::Message), 1);

        first.run();
        assert!(session.has_active_consumer());
        assert_eq!(page.host.listener_count(EventKind::Message), 1);

        second.run();
        second.run();
        assert!(!session.has_active_consumer());
        assert_eq!(page.host.listener_count(EventKind::Message), 0);
    }

    #[test]
    fn explicit_attach_without_window_still_counts() {
        let session = Session::new();
        let handle = session.relay_console_to_parent(None, FrameRelayOptions::default());
        assert!(session.is_explicitly_configured());
        assert!(!session.has_active_producer());
        handle.run();
        assert!(!session.has_active_producer());

        let detach = session.attach_console_relay(None, HostRelayOptions::default());
        assert!(!session.has_active_consumer());
        detach.run();
        assert!(session.is_explicitly_configured());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_attach_in_frame_starts_producer() {
        let page = Page::new();
        let seen = page.capture();
        let session = Session::new();

        let outcome = session.auto_attach(Some(page.frame()), Duration::ZERO).await;
        assert_eq!(outcome, AutoAttach::Frame);
        assert!(session.has_active_producer());
        assert!(!session.is_explicitly_configured());

        page.host.dispatch_pending();
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, Level::Warn);
        let advisory = seen[0].args[0].as_str().unwrap();
        assert!(advisory.starts_with(ADVISORY_PREFIX));
        assert!(advisory.contains("target origin"));
        assert_eq!(page.frame_console.calls_at(Level::Warn).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_attach_on_top_level_accepts_any_origin() {
        let page = Page::new();
        let events = Arc::new(Mutex::new(Vec::<RelayEvent>::new()));
        let session = Session::new();

        let outcome = session.auto_attach(Some(page.host()), Duration::from_millis(5)).await;
        assert_eq!(outcome, AutoAttach::Host);
        assert!(session.has_active_consumer());

        let warns = page.host_console.calls_at(Level::Warn);
        assert_eq!(warns.len(), 1);
        assert!(warns[0].texts()[0].contains("allowed origins"));

        let sink = Arc::clone(&events);
        framerelay_host_relay::attach(
            Some(&page.host()),
            HostRelayOptions::default()
                .with_forward_to_console(false)
                .on_event(move |e| sink.lock().unwrap().push(e.clone())),
        );
        framerelay_frame_relay::start(Some(&page.frame()), FrameRelayOptions::default());
        page.frame.console().call(Level::Info, &[Value::from("hi")]).unwrap();
        page.host.dispatch_pending();

        assert_eq!(events.lock().unwrap().len(), 1);
        let infos = page.host_console.calls_at(Level::Info);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].texts(), vec!["[iframe https://embed.example]", "hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_call_preempts_pending_auto_attach() {
        let page = Page::new();
        let session = Session::new();

        let pending = {
            let session = session.clone();
            let window = page.host();
            tokio::spawn(async move {
                session
                    .auto_attach(Some(window), Duration::from_millis(10))
                    .await
            })
        };
        session.attach_console_relay(Some(&page.host()), HostRelayOptions::default());

        assert_eq!(pending.await.unwrap(), AutoAttach::Preempted);
        assert_eq!(page.host.listener_count(EventKind::Message), 1);
        assert!(page.host_console.calls_at(Level::Warn).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_attach_without_window() {
        let session = Session::new();
        let outcome = session.auto_attach(None, Duration::ZERO).await;
        assert_eq!(outcome, AutoAttach::Unavailable);
        assert!(!session.has_active_producer());
        assert!(!session.has_active_consumer());
    }

    #[tokio::test(start_paused = true)]
    async fn advisory_is_emitted_once() {
        let page = Page::new();
        let session = Session::new();

        session.auto_attach(Some(page.host()), Duration::ZERO).await;
        session.auto_attach(Some(page.host()), Duration::ZERO).await;

        assert_eq!(page.host_console.calls_at(Level::Warn).len(), 1);
        assert_eq!(page.host.listener_count(EventKind::Message), 1);
    }

    #[test]
    fn reset_undoes_everything() {
        let page = Page::new();
        let original = page.frame.console().get(Level::Error).unwrap();
        let session = Session::new();
        session.relay_console_to_parent(Some(&page.frame()), FrameRelayOptions::default());
        session.attach_console_relay(Some(&page.host()), HostRelayOptions::default());

        session.reset();

        assert!(!session.is_explicitly_configured());
        assert!(!session.has_active_producer());
        assert!(!session.has_active_consumer());
        assert_eq!(page.host.listener_count(EventKind::Message), 0);
        assert_eq!(page.frame.listener_count(EventKind::Error), 0);
        let restored = page.frame.console().get(Level::Error).unwrap();
        assert!(Arc::ptr_eq(&restored, &original));
    }

    #[test]
    fn global_session_is_shared() {
        assert!(std::ptr::eq(Session::global(), Session::global()));
    }
}
