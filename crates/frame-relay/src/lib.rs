//! Frame-side console relay.
//!
//! [`start`] wraps the selected console methods of a window so that every
//! call is also posted to the parent window as an
//! [`Envelope`](framerelay_protocol::Envelope), and optionally relays
//! uncaught errors and unhandled rejections at `error` level. The returned
//! [`Teardown`](framerelay_context::Teardown) restores everything.

mod options;
mod relay;

pub use options::FrameRelayOptions;
pub use relay::start;
