//! Host-side console relay.
//!
//! [`attach`] listens for relay envelopes on a window's message channel,
//! drops those from untrusted origins or from frames other than the one
//! configured, and hands accepted events to a callback and/or echoes them
//! into the host console. [`FrameLogStore`] keeps a bounded history per
//! frame for hosts embedding several.

mod buffer;
mod options;
mod relay;
mod store;

pub use buffer::RingBuffer;
pub use options::{AllowedOrigins, EventCallback, HostRelayConfig, HostRelayOptions};
pub use relay::{Detach, attach};
pub use store::{DEFAULT_CAPACITY, FrameLog, FrameLogStore};
