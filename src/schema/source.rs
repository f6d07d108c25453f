use super::ddl::parse_table;
use super::types::{SchemaOptions, Table};
use crate::error::{Result, ScaffoldError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where table definitions come from
///
/// The pipeline only ever asks for one table at a time, so a source backed by
/// a live database can fetch lazily.
pub trait SchemaSource {
    fn load_table(&self, table: &str, options: &SchemaOptions) -> Result<Table>;

    /// Human readable description for logs
    fn describe(&self) -> String;
}

/// Table definitions read from a static DDL script
#[derive(Debug, Clone)]
pub struct DdlSource {
    origin: String,
    ddl: String,
}

impl DdlSource {
    pub fn new(origin: impl Into<String>, ddl: impl Into<String>) -> Self {
        DdlSource {
            origin: origin.into(),
            ddl: ddl.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let ddl = std::fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))?;
        Ok(Self::new(path.display().to_string(), ddl))
    }
}

impl SchemaSource for DdlSource {
    fn load_table(&self, table: &str, options: &SchemaOptions) -> Result<Table> {
        parse_table(&self.ddl, table, options)
    }

    fn describe(&self) -> String {
        format!("ddl:{}", self.origin)
    }
}

fn ddl_path(dsn: &str) -> Option<PathBuf> {
    if let Some(rest) = dsn.strip_prefix("ddl:") {
        return Some(PathBuf::from(rest));
    }
    if let Some(rest) = dsn.strip_prefix("file://") {
        return Some(PathBuf::from(rest));
    }
    if !dsn.contains("://") && dsn.to_ascii_lowercase().ends_with(".sql") {
        return Some(PathBuf::from(dsn));
    }
    None
}

/// Resolve a connection string into a schema source
///
/// Static DDL files are the only source this crate can read. Any other scheme
/// (a live `mysql://` or `postgres://` server) is reported as an unreachable
/// collaborator before generation starts.
pub fn source_from_dsn(dsn: &str) -> Result<Box<dyn SchemaSource>> {
    let unavailable = |message: String| ScaffoldError::SchemaSourceUnavailable {
        dsn: dsn.to_string(),
        message,
    };
    let trimmed = dsn.trim();
    if trimmed.is_empty() {
        return Err(unavailable("connection string is empty".to_string()));
    }
    let path = ddl_path(trimmed).ok_or_else(|| {
        let scheme = trimmed.split("://").next().unwrap_or(trimmed);
        unavailable(format!(
            "no driver for '{scheme}', export the schema with a DDL dump and pass ddl:<path>"
        ))
    })?;
    let source = DdlSource::from_file(&path).map_err(|e| unavailable(e.to_string()))?;
    info!(source = %source.describe(), "schema source ready");
    Ok(Box::new(source))
}
