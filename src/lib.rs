//! # scaffolder
//!
//! **scaffolder** generates ready-to-compile Rust service code from compiled
//! protobuf descriptors and relational table schemas, and stamps it into an
//! existing project tree without ever discarding hand-written work.
//!
//! ## Architecture
//!
//! - **[`descriptor`]** - decodes compiled file descriptors into the route IR
//! - **[`schema`]** - parses table definitions (DDL) into the table IR
//! - **[`emitter`]** - renders IR into source fragments with askama templates
//! - **[`replacer`]** - applies ordered replacement rules and marker slots to
//!   template trees
//! - **[`writer`]** - persists files with the non-destructive output policy
//! - **[`pipeline`]** - runs the stages for proto and DAO batches
//! - **[`cli`]**, **[`config`]**, **[`logging`]** - the run boundary
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant Entry as protoc-gen-scaffold /<br/>scaffolder
//!     participant Walk as descriptor::walk_file
//!     participant Schema as schema::SchemaSource
//!     participant Emit as emitter
//!     participant Replace as replacer::Replacer
//!     participant Write as writer::OutputWriter
//!     participant FS as File System
//!
//!     User->>Entry: protoc --scaffold_opt=plugin=handler ...
//!     Entry->>Walk: walk_file(descriptor)
//!     Walk-->>Entry: Vec<Route>
//!     Entry->>Emit: emit_routes(file, routes, mode)
//!     Emit-->>Entry: Fragments
//!     Entry->>Replace: render_text(fragment, identifier rules)
//!     Replace-->>Entry: stamped source
//!     Entry->>Write: write(dest, content, Preserve)
//!     Write->>FS: dest missing? create : dest.gen<timestamp>
//!     Write-->>Entry: WriteOutcome
//!
//!     User->>Entry: scaffolder dao --db-table t_order
//!     Entry->>Schema: load_table("t_order")
//!     Schema-->>Entry: Table
//!     Entry->>Emit: emit_table(table)
//!     Emit-->>Entry: Model / Dao / DaoTest
//!     Entry->>Replace: apply(template tree, slot + identifier rules)
//!     Replace-->>Entry: RenderedTree
//!     Entry->>Write: write_tree(out, tree, Preserve)
//! ```
//!
//! ### Key Properties
//!
//! 1. **Deterministic**: the same descriptor or table renders byte-identical output
//! 2. **Non-destructive**: an existing file is never overwritten unless asked
//! 3. **Batch-tolerant**: a broken file or table is reported, the rest still generate
//! 4. **Single writer**: an advisory lock rejects concurrent runs on one tree

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod emitter;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod replacer;
pub mod schema;
pub mod writer;

pub use error::{ErrorKind, Result, ScaffoldError};
