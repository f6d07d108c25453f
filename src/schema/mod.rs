//! # Schema Module
//!
//! Reads relational table definitions into the [`Table`]/[`Column`] IR used by
//! the DAO emitter.
//!
//! Column types go through a fixed lookup table ([`TargetType::from_sql`]).
//! A type that is not in the table stops generation for that table with
//! [`ScaffoldError::UnmappedColumnType`](crate::error::ScaffoldError); there is
//! no "string" fallback.

mod ddl;
mod source;
mod types;

pub use ddl::{parse_table, resource_name};
pub use source::*;
pub use types::*;
