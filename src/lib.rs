//! Authentication and session core for the HMS desktop client.
//!
//! The UI layer owns screens and CRUD plumbing; everything security-relevant
//! funnels through this crate: credential verification (including the lazy
//! upgrade of legacy MD5 credentials), session token lifecycle, and the
//! best-effort login audit trail.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod session;

pub use auth::repo_types::{NewUser, Role, User};
pub use auth::service::{AuthService, SessionContext};
pub use config::AppConfig;
pub use error::AuthError;
pub use session::store::{Session, SessionStore};
