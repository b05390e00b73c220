//! Relays console output from embedded frames to their host.
//!
//! The frame side ([`relay_console_to_parent`](Session::relay_console_to_parent))
//! wraps console methods and posts every call to the parent window; the
//! host side ([`attach_console_relay`](Session::attach_console_relay))
//! filters what arrives and echoes it into the host console. A [`Session`]
//! keeps at most one of each active and can pick a permissive default role
//! on its own via [`auto_attach`](Session::auto_attach).

pub mod config;
mod session;

pub use config::{ConfigError, RelayConfig};
pub use session::{AutoAttach, Session};

pub use framerelay_context as context;
pub use framerelay_context::Teardown;
pub use framerelay_frame_relay::FrameRelayOptions;
pub use framerelay_host_relay::{
    AllowedOrigins, Detach, EventCallback, FrameLog, FrameLogStore, HostRelayConfig,
    HostRelayOptions,
};
pub use framerelay_protocol::{Envelope, Level, RelayEvent, SerializedValue};
pub use framerelay_value::{ErrorValue, Value, serialize};
