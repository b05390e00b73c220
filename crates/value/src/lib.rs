//! Runtime values observed inside a frame, and their conversion into
//! transport-safe [`SerializedValue`](framerelay_protocol::SerializedValue)s.
//!
//! [`Value`] models what a console call can receive: primitives, big
//! integers, symbols, functions, errors, shared (possibly cyclic) arrays and
//! objects, and opaque host values. [`serialize`] never fails: fields that
//! cannot be read degrade to placeholders and cycles become a marker.

mod display;
pub mod isolate;
pub mod serialize;
pub mod value;

pub use isolate::{Boundary, isolate};
pub use serialize::{InProgress, MAX_DEPTH, serialize, serialize_with};
pub use value::{
    ArrayRef, ErrorValue, FunctionValue, Getter, HostValue, ObjectRef, Property, RefId, Thrown,
    Value,
};
