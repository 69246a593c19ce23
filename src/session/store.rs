//! Persistent session records.
//!
//! A session is an opaque URL-safe token tied to one user with a fixed
//! expiry (`now + TTL` at creation, no sliding extension). The store owns
//! the rows; everything else holds the token as a non-owning reference.
//! Lifecycle: created, active while `now < expires_at`, then expired
//! (detected lazily) or revoked (explicit removal). Both ends are terminal.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Token byte length before base64 encoding.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: String,
    pub user_id: Uuid,
    pub ip_address: String,
    pub device_info: String,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct SessionStore {
    db: SqlitePool,
    ttl_secs: i64,
}

impl SessionStore {
    pub fn new(db: SqlitePool, ttl_secs: i64) -> Self {
        Self { db, ttl_secs }
    }

    /// Mint a session for an authenticated user and return the token.
    ///
    /// A persistence failure is an error, never a token: the caller must be
    /// able to tell "no session exists" from "here is your session".
    pub async fn create(
        &self,
        user_id: Uuid,
        ip_address: &str,
        device_info: &str,
    ) -> Result<String, sqlx::Error> {
        let token = generate_token();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let expires_at = now + self.ttl_secs;

        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, ip_address, device_info, created_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(ip_address)
        .bind(device_info)
        .bind(now)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        debug!(user_id = %user_id, expires_at, "session created");
        Ok(token)
    }

    /// Resolve a token to its owning user, if the session is still active.
    ///
    /// Expired and unknown tokens both come back as `None`; the expiry is
    /// not extended by validation.
    pub async fn validate(&self, session_id: &str) -> Result<Option<User>, sqlx::Error> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.password, u.salt, u.hash_algo, u.role, \
                    u.full_name, u.phone, u.address, u.created_at, u.last_login, u.active \
             FROM sessions s \
             INNER JOIN users u ON u.id = s.user_id \
             WHERE s.session_id = ? AND s.expires_at > ?",
        )
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.db)
        .await
    }

    /// Revoke a session. Returns whether a row was actually removed.
    pub async fn remove(&self, session_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every expired session, returning the count removed.
    ///
    /// Meant to be driven by an external scheduler; the store does not
    /// schedule itself.
    pub async fn cleanup_expired(&self) -> Result<u64, sqlx::Error> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.db)
            .await?;
        if result.rows_affected() > 0 {
            debug!(removed = result.rows_affected(), "expired sessions cleaned up");
        }
        Ok(result.rows_affected())
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
