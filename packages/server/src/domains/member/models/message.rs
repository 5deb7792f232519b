use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use crate::common::{AppResult, MemberId, MessageId};

/// Admin-to-member note shown on the member dashboard (`member_messages`).
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberMessage {
    pub id: MessageId,
    pub member_id: MemberId,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl MemberMessage {
    pub fn new(member_id: MemberId, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            member_id,
            subject: subject.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO member_messages (id, member_id, subject, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.member_id)
        .bind(&self.subject)
        .bind(&self.body)
        .bind(self.created_at)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Newest first.
    pub async fn find_for_member(member_id: MemberId, pool: &PgPool) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM member_messages WHERE member_id = $1 ORDER BY created_at DESC",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
