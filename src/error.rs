//! # Error Module
//!
//! Every failure the generation engine can report is a [`ScaffoldError`]. Each
//! variant belongs to one [`ErrorKind`], and the kind decides how far the
//! failure reaches:
//!
//! - **Input** - a malformed descriptor, an unmapped column type, an unpaired
//!   marker region. Only the current file or table is abandoned.
//! - **Configuration** - a missing module/server identifier, an unknown plugin
//!   or template set. The whole run stops before anything is written.
//! - **Io** - directory creation or file write failure, reported verbatim.
//! - **External** - the schema source cannot be reached. Nothing is generated.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ScaffoldError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Defect in a single input item (descriptor file, table, template file)
    Input,
    /// Run-level defect in identifiers, options or config
    Configuration,
    /// Filesystem failure
    Io,
    /// Unreachable collaborator (schema source)
    External,
}

/// Errors raised by the scaffolding engine
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Descriptor for a requested proto file is malformed or missing
    #[error("descriptor '{file}': {message}")]
    Descriptor { file: String, message: String },

    /// A column type has no entry in the type lookup table
    #[error("table '{table}': column '{column}' has unmapped type '{sql_type}'")]
    UnmappedColumnType {
        table: String,
        column: String,
        sql_type: String,
    },

    /// The schema source has no definition for the table
    #[error("table '{table}' not found in schema source")]
    TableNotFound { table: String },

    /// The DDL for a table could not be parsed
    #[error("table '{table}': malformed DDL: {message}")]
    MalformedDdl { table: String, message: String },

    /// A marker region is missing its begin or end line
    #[error("{}:{line}: unpaired marker '{marker}' for slot '{slot}'", file.display())]
    UnpairedMarker {
        file: PathBuf,
        slot: String,
        marker: String,
        line: usize,
    },

    /// A project identifier required to resolve placeholders was not supplied
    #[error("'{name}' cannot be empty when generating {what}")]
    MissingIdentifier { name: &'static str, what: String },

    /// The plugin selector is not one of `handler`, `service` or empty
    #[error("unknown plugin '{0}', supported values: handler, service")]
    UnknownPlugin(String),

    /// No template set is registered under that name
    #[error("unknown template set '{0}'")]
    UnknownTemplateSet(String),

    /// Configuration file or option could not be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Another run holds the advisory lock on the output tree
    #[error("output tree is locked by another run: {}", path.display())]
    Locked { path: PathBuf },

    /// The schema source could not be reached
    #[error("schema source '{dsn}' unavailable: {message}")]
    SchemaSourceUnavailable { dsn: String, message: String },

    /// Filesystem failure
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Askama template failed to render
    #[error("render failed: {0}")]
    Render(#[from] askama::Error),
}

impl ScaffoldError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScaffoldError::Io {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a descriptor defect
    pub fn descriptor(file: impl Into<String>, message: impl Into<String>) -> Self {
        ScaffoldError::Descriptor {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScaffoldError::Descriptor { .. }
            | ScaffoldError::UnmappedColumnType { .. }
            | ScaffoldError::TableNotFound { .. }
            | ScaffoldError::MalformedDdl { .. }
            | ScaffoldError::UnpairedMarker { .. }
            | ScaffoldError::Render(_) => ErrorKind::Input,
            ScaffoldError::MissingIdentifier { .. }
            | ScaffoldError::UnknownPlugin(_)
            | ScaffoldError::UnknownTemplateSet(_)
            | ScaffoldError::InvalidConfig(_)
            | ScaffoldError::Locked { .. } => ErrorKind::Configuration,
            ScaffoldError::Io { .. } => ErrorKind::Io,
            ScaffoldError::SchemaSourceUnavailable { .. } => ErrorKind::External,
        }
    }

    /// Whether a batch may continue with its next item after this error
    pub fn is_item_local(&self) -> bool {
        matches!(self.kind(), ErrorKind::Input | ErrorKind::Io)
    }
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;
