//! Wire protocol for relaying console output out of an embedded frame.
//!
//! One [`Envelope`] is posted per console call or uncaught error. Its
//! arguments are [`SerializedValue`] trees, which are always acyclic and
//! JSON-representable.

pub mod constants;
pub mod envelope;
pub mod level;
pub mod value;

// Re-export primary types for convenience.
pub use constants::RELAY_KIND;
pub use envelope::{Envelope, ProtocolError, RelayEvent};
pub use level::{Level, LevelMask};
pub use value::{ErrorDescriptor, SerializedValue};
