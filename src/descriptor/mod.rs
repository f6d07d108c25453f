//! # Descriptor Module
//!
//! Turns compiled protobuf descriptors into the route IR consumed by the
//! emitter.
//!
//! ```text
//! CodeGeneratorRequest / FileDescriptorSet
//!        │  decode each proto_file on its own
//!        ▼
//!   DescriptorBatch ──► walk_file ──► Vec<Route>
//! ```
//!
//! Each method yields exactly one [`Route`]: the HTTP verb and path come from
//! the `google.api.http` binding when present, otherwise the route defaults
//! to `POST` with no path and is only used by the RPC-style emitter.

mod load;
pub mod proto;
mod types;
mod walk;

pub use load::*;
pub use types::*;
pub use walk::*;
