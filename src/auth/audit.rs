use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::warn;

/// The desktop client has no reliable view of its own source address, so
/// every attempt is recorded with this placeholder until a caller-supplied
/// address exists.
const PLACEHOLDER_IP: &str = "0.0.0.0";

/// Best-effort sink for login attempts.
///
/// Nothing in this crate ever reads `login_attempts` back; it exists for
/// external security review. By contract the recorder must never fail out
/// to the login path: every storage error is logged and swallowed.
#[derive(Clone)]
pub struct AuditLog {
    db: SqlitePool,
}

impl AuditLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn record_login_attempt(&self, username: &str, success: bool) {
        let result = sqlx::query(
            "INSERT INTO login_attempts (username, success, attempt_time, ip_address) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(success)
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .bind(PLACEHOLDER_IP)
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            warn!(error = %e, username, "failed to record login attempt");
        }
    }
}
