use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::auth::audit::AuditLog;
use crate::auth::password::{self, HashAlgorithm};
use crate::auth::repo_types::{NewUser, Role, User};
use crate::config::AppConfig;
use crate::error::AuthError;
use crate::session::store::SessionStore;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// The principal and session for one UI session, carried explicitly by the
/// caller instead of living in process-global state. One context per
/// operator window; two windows get two contexts and cannot race each other.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<User>,
    session_id: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.user.as_ref().map(|u| u.role == role).unwrap_or(false)
    }

    fn clear(&mut self) {
        self.user = None;
        self.session_id = None;
    }
}

/// Orchestrates credential verification, the audit trail, and session
/// persistence. Constructed once by the application's composition root and
/// shared by reference.
pub struct AuthService {
    db: SqlitePool,
    audit: AuditLog,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(db: SqlitePool, config: &AppConfig) -> Self {
        let audit = AuditLog::new(db.clone());
        let sessions = SessionStore::new(db.clone(), config.session_ttl_secs());
        Self { db, audit, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Authenticate by username or email.
    ///
    /// `Ok(None)` covers unknown identifier, wrong password, and inactive
    /// account alike; callers get no way to tell which. A legacy MD5
    /// credential that matches is rewritten to the salted scheme before
    /// anything else happens.
    pub async fn login(
        &self,
        ctx: &mut SessionContext,
        identifier: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        // Pre-commit audit write: recorded as failed before lookup so that a
        // crash mid-verification still leaves a trace.
        self.audit.record_login_attempt(identifier, false).await;

        let user = match User::find_by_username(&self.db, identifier).await? {
            Some(user) => Some(user),
            None => User::find_by_email(&self.db, identifier).await?,
        };
        let Some(mut user) = user else {
            debug!(identifier, "login: unknown identifier");
            return Ok(None);
        };

        if !password::verify(password, &user.password, &user.salt, user.credential_algorithm()) {
            debug!(user_id = %user.id, "login: password mismatch");
            return Ok(None);
        }

        if user.is_legacy() {
            // One-time silent migration to the salted scheme. Happens even
            // for inactive accounts: the credential matched, so upgrade it.
            let salt = password::generate_salt();
            let digest = password::hash(password, &salt);
            User::update_credential(&self.db, user.id, &digest, &salt, HashAlgorithm::Sha256)
                .await?;
            user.password = digest;
            user.salt = salt;
            user.hash_algo = HashAlgorithm::Sha256;
            info!(user_id = %user.id, "legacy credential upgraded");
        }

        if !user.active {
            warn!(user_id = %user.id, "login: inactive account");
            return Ok(None);
        }

        let now = OffsetDateTime::now_utc();
        User::update_last_login(&self.db, user.id, now).await?;
        user.last_login = Some(now);

        self.audit.record_login_attempt(identifier, true).await;
        info!(user_id = %user.id, username = %user.username, "user logged in");

        ctx.user = Some(user.clone());
        ctx.session_id = None;
        Ok(Some(user))
    }

    /// Drop the current principal and revoke its persisted session, if any.
    ///
    /// The context is cleared before touching storage: a dead database must
    /// not leave the UI signed in.
    pub async fn logout(&self, ctx: &mut SessionContext) -> Result<(), AuthError> {
        let session_id = ctx.session_id.take();
        ctx.clear();
        if let Some(session_id) = session_id {
            self.sessions.remove(&session_id).await?;
            debug!("session revoked on logout");
        }
        Ok(())
    }

    /// Rehydrate a context from a previously issued token.
    pub async fn resume_session(
        &self,
        ctx: &mut SessionContext,
        session_id: &str,
    ) -> Result<bool, AuthError> {
        match self.sessions.validate(session_id).await? {
            Some(user) => {
                debug!(user_id = %user.id, "session resumed");
                ctx.user = Some(user);
                ctx.session_id = Some(session_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Create an account under the current hashing scheme.
    ///
    /// `Ok(None)` when the username or email is already taken or the email
    /// is malformed; existing rows are never touched. The insert itself is
    /// a single atomic write, so there is no partial state to clean up.
    pub async fn register(&self, mut new: NewUser) -> Result<Option<User>, AuthError> {
        new.username = new.username.trim().to_string();
        new.email = new.email.trim().to_lowercase();

        if !is_valid_email(&new.email) {
            warn!(email = %new.email, "register: invalid email");
            return Ok(None);
        }
        if User::find_by_username(&self.db, &new.username).await?.is_some() {
            warn!(username = %new.username, "register: username taken");
            return Ok(None);
        }
        if User::find_by_email(&self.db, &new.email).await?.is_some() {
            warn!(email = %new.email, "register: email taken");
            return Ok(None);
        }

        let salt = password::generate_salt();
        let digest = password::hash(&new.password, &salt);
        let user = User::create(&self.db, &new, &digest, &salt).await?;
        info!(user_id = %user.id, username = %user.username, role = ?user.role, "user registered");
        Ok(Some(user))
    }

    /// Mint a session and retain its token as the context's current session.
    pub async fn create_session(
        &self,
        ctx: &mut SessionContext,
        user: &User,
        ip_address: &str,
        device_info: &str,
    ) -> Result<String, AuthError> {
        let token = self.sessions.create(user.id, ip_address, device_info).await?;
        ctx.session_id = Some(token.clone());
        Ok(token)
    }

    pub async fn validate_session(&self, session_id: &str) -> Result<Option<User>, AuthError> {
        Ok(self.sessions.validate(session_id).await?)
    }

    pub async fn remove_session(&self, session_id: &str) -> Result<bool, AuthError> {
        Ok(self.sessions.remove(session_id).await?)
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthError> {
        Ok(self.sessions.cleanup_expired().await?)
    }
}
