use thiserror::Error;

/// Failures that cross the public API.
///
/// Bad credentials, unknown identifiers, and inactive accounts are *not*
/// errors: those surface as `Ok(None)` / `Ok(false)` so callers cannot tell
/// them apart (and cannot leak which one happened to the end user). Only
/// infrastructure problems reach this type.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
