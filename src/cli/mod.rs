//! # CLI Module
//!
//! Command-line surface of the `scaffolder` binary.
//!
//! ## Commands
//!
//! ### `proto`
//!
//! Same pipeline as the protoc plugin, driven from a descriptor set:
//!
//! ```bash
//! protoc --include_imports --descriptor_set_out=api.pb api/v1/order.proto
//! scaffolder proto --descriptor-set api.pb --plugin handler \
//!     --module-name shop_api --server-name shop
//! ```
//!
//! ### `dao`
//!
//! Model, DAO and DAO test per table:
//!
//! ```bash
//! scaffolder dao --db-dsn ddl:schema.sql --db-table t_order,t_user \
//!     --module-name shop --table-prefix t_ --embed --out .
//! ```
//!
//! Both commands write `<file>.gen<YYYYMMDDThhmmss>` next to any file that
//! already exists unless `--force` is given, and exit non-zero when at least
//! one item of the batch failed.

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
