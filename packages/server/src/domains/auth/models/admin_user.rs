use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{AdminId, AppError, AppResult};

/// Administrator account (`admin_users` table).
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AdminUser {
    pub id: AdminId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    pub async fn find_by_id(id: AdminId, pool: &PgPool) -> AppResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM admin_users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> AppResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM admin_users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn insert(&self, pool: &PgPool) -> AppResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO admin_users (id, email, name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.name)
        .bind(&self.password_hash)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            let duplicate = e.as_database_error().and_then(|d| d.code()).as_deref() == Some("23505");
            if duplicate {
                AppError::Conflict("Admin account")
            } else {
                AppError::Database(e)
            }
        })
    }
}
