//! # Emitter Module
//!
//! Renders the route IR and the table IR into source [`Fragments`] using the
//! askama templates under `templates/`.
//!
//! Everything here is a pure function of its input: no file system access, no
//! clock, no environment. Two runs over the same routes or table produce
//! byte-identical fragments, which is what makes re-running the generator
//! against an existing project safe to diff.
//!
//! Fragments still carry the project placeholder tokens (`module_name_example`,
//! `server_name_example`); the replacer stamps the real identifiers in.
//!
//! | Mode | Fragments |
//! |------|-----------|
//! | [`EmitMode::RoutesOnly`] | `RouteTable` |
//! | [`EmitMode::Handler`] | `RouteTable`, `Router`, `Handler`, `ErrorCode` |
//! | [`EmitMode::Service`] | `RouteTable`, `Router`, `Service`, `ErrorCode` |
//! | [`emit_table`] | `Model`, `Dao`, `DaoTest` |

mod fragment;
mod routes;
mod table;
mod templates;

pub use fragment::{FragmentKind, Fragments};
pub use routes::*;
pub use table::emit_table;
