use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_admin: bool,
    pub registered_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_user_name(
        user_name: &str,
        pool: &sqlx::PgPool,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_name = $1")
            .bind(user_name)
            .fetch_optional(pool)
            .await
    }
}
