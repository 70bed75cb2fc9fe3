use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;

/// Revoked refresh tokens, keyed by their `jti` claim.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    async fn revoke(&self, jti: Uuid, user_id: Uuid, expires_at: OffsetDateTime) -> AppResult<()>;
    async fn is_revoked(&self, jti: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgTokenBlacklist {
    db: PgPool,
}

impl PgTokenBlacklist {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenBlacklist for PgTokenBlacklist {
    async fn revoke(&self, jti: Uuid, user_id: Uuid, expires_at: OffsetDateTime) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO token_blacklist (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> AppResult<bool> {
        let revoked: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM token_blacklist WHERE jti = $1)"#)
                .bind(jti)
                .fetch_one(&self.db)
                .await?;
        Ok(revoked)
    }
}
