//! Columns shared by every table of module_name_example.

/// Key and lifecycle timestamps, flattened into each model
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct AuditFields {
    pub id: i64,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    /// Set by soft deletes; rows with a value are hidden from reads
    pub deleted_at: Option<chrono::NaiveDateTime>,
}
