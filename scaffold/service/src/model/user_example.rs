//! Row model of `user_example`, generated by scaffolder.

// scaffold:begin model
/// Row of table `user_example`
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct UserExample {
    pub id: i64,
    pub name: String,
}

impl UserExample {
    pub const TABLE: &'static str = "user_example";
}
// scaffold:end model
