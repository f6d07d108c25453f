//! Data access for `user_example`, generated by scaffolder.
//!
//! Regenerating writes `user_example_dao.rs.gen<timestamp>` next to this file
//! instead of replacing it; merge by hand.

// scaffold:begin dao
use sqlx::MySqlPool;

use crate::model::user_example::UserExample;

/// CRUD access to table `user_example`
#[derive(Debug, Clone)]
pub struct UserExampleDao {
    pool: MySqlPool,
}

impl UserExampleDao {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> sqlx::Result<Option<UserExample>> {
        sqlx::query_as::<_, UserExample>("SELECT `id`, `name` FROM `user_example` WHERE `id` = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
// scaffold:end dao
