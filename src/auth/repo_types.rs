use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::HashAlgorithm;

/// Account roles recognized by the HMS client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Laboratory,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // hex digest, not exposed in JSON
    #[serde(skip_serializing)]
    pub salt: String,
    #[serde(skip_serializing)]
    pub hash_algo: HashAlgorithm,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
    pub active: bool,
}

impl User {
    /// Algorithm to verify this credential under.
    ///
    /// Rows imported without an explicit tag pick up the schema default
    /// (`sha256`), so a default tag is cross-checked against the credential's
    /// shape: an MD5-length digest paired with the sentinel salt is legacy
    /// regardless of what the column says. An explicit `md5` tag is trusted
    /// as-is.
    pub fn credential_algorithm(&self) -> HashAlgorithm {
        match self.hash_algo {
            HashAlgorithm::Md5 => HashAlgorithm::Md5,
            HashAlgorithm::Sha256 => HashAlgorithm::infer(&self.password, &self.salt),
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.credential_algorithm() == HashAlgorithm::Md5
    }
}

/// Registration input. The password arrives in the clear and is hashed
/// before anything touches the database.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
