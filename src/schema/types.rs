use heck::{ToLowerCamelCase, ToSnakeCase};
use std::collections::BTreeMap;
use std::fmt;

/// Target-language type a source column maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    I64,
    F32,
    F64,
    Decimal,
    Bool,
    Text,
    Timestamp,
    Json,
    Bytes,
}

impl TargetType {
    /// Rust spelling used in generated models
    pub fn rust_type(self) -> &'static str {
        match self {
            TargetType::I64 => "i64",
            TargetType::F32 => "f32",
            TargetType::F64 => "f64",
            TargetType::Decimal => "rust_decimal::Decimal",
            TargetType::Bool => "bool",
            TargetType::Text => "String",
            TargetType::Timestamp => "chrono::NaiveDateTime",
            TargetType::Json => "serde_json::Value",
            TargetType::Bytes => "Vec<u8>",
        }
    }

    /// Literal used for the column in generated DAO tests
    pub fn sample_literal(self) -> &'static str {
        match self {
            TargetType::I64 => "1",
            TargetType::F32 => "1.0",
            TargetType::F64 => "1.0",
            TargetType::Decimal => "rust_decimal::Decimal::new(100, 2)",
            TargetType::Bool => "true",
            TargetType::Text => "\"example\".to_string()",
            TargetType::Timestamp => "chrono::Utc::now().naive_utc()",
            TargetType::Json => "serde_json::json!({})",
            TargetType::Bytes => "vec![0u8]",
        }
    }

    /// Map a lower-cased base SQL type through the fixed lookup table
    ///
    /// Returns `None` for anything not in the table; callers turn that into an
    /// error rather than guessing.
    pub fn from_sql(base_type: &str) -> Option<Self> {
        let ty = match base_type {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "int2"
            | "int4" | "int8" | "serial" | "smallserial" | "bigserial" | "year" => TargetType::I64,
            "float" | "real" | "float4" => TargetType::F32,
            "double" | "double precision" | "float8" => TargetType::F64,
            "decimal" | "numeric" | "dec" | "money" => TargetType::Decimal,
            "bool" | "boolean" | "bit" => TargetType::Bool,
            "char" | "varchar" | "character" | "character varying" | "nchar" | "nvarchar"
            | "text" | "tinytext" | "mediumtext" | "longtext" | "enum" | "set" | "uuid"
            | "citext" => TargetType::Text,
            "date" | "datetime" | "timestamp" | "timestamptz" | "time" | "timetz"
            | "timestamp without time zone" | "timestamp with time zone" => TargetType::Timestamp,
            "json" | "jsonb" => TargetType::Json,
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob"
            | "bytea" => TargetType::Bytes,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rust_type())
    }
}

/// Naming convention for serialization tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TagNaming {
    /// `created_at`
    Snake,
    /// `createdAt`
    #[default]
    Camel,
}

impl TagNaming {
    pub fn apply(self, column: &str) -> String {
        match self {
            TagNaming::Snake => column.to_snake_case(),
            TagNaming::Camel => column.to_lower_camel_case(),
        }
    }
}

/// Options shared by every table of one schema generation run
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    pub naming: TagNaming,
    /// Absorb id/created_at/updated_at/deleted_at into an embedded base
    pub embed_audit: bool,
    /// Prefix stripped from table names to derive the resource name
    pub table_prefix: Option<String>,
}

/// Columns absorbed by the embedded audit base
pub const AUDIT_COLUMNS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Source type as written in the DDL, lower-cased
    pub sql_type: String,
    pub target: TargetType,
    pub nullable: bool,
    pub primary_key: bool,
    pub comment: Option<String>,
    /// `json` and `db` tag names
    pub tags: BTreeMap<String, String>,
}

impl Column {
    /// Field name in the generated struct
    pub fn field_name(&self) -> String {
        self.name.to_snake_case()
    }

    /// Rust type including `Option<...>` for nullable columns
    pub fn field_type(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.target.rust_type())
        } else {
            self.target.rust_type().to_string()
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name as declared
    pub name: String,
    /// Resource name derived from the table name (prefix stripped, snake case)
    pub resource: String,
    /// Own columns in declaration order
    pub columns: Vec<Column>,
    /// Audit columns present in the DDL but carried by the embedded base
    pub absorbed: Vec<Column>,
    /// Primary key column name
    pub primary_key: Option<String>,
    /// Whether the audit base is embedded into the model
    pub embed_audit: bool,
}

impl Table {
    pub fn primary_column(&self) -> Option<&Column> {
        let pk = self.primary_key.as_deref()?;
        self.columns
            .iter()
            .chain(self.absorbed.iter())
            .find(|c| c.name == pk)
    }

    /// Every column selected by reads: own columns then absorbed ones
    pub fn selected_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().chain(self.absorbed.iter())
    }

    /// Columns written on insert/update (everything except the primary key)
    pub fn writable_columns(&self) -> impl Iterator<Item = &Column> {
        let pk = self.primary_key.clone();
        self.columns
            .iter()
            .filter(move |c| Some(&c.name) != pk.as_ref())
    }
}
