use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::HashAlgorithm;
use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password, salt, hash_algo, role, \
                            full_name, phone, address, created_at, last_login, active";

impl User {
    /// Find a user by username (case-insensitive, per schema collation).
    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(db)
            .await
    }

    /// Find a user by email (case-insensitive, per schema collation).
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await
    }

    /// Insert a new user with an already-hashed credential.
    pub async fn create(
        db: &SqlitePool,
        new: &NewUser,
        digest: &str,
        salt: &str,
    ) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users \
             (id, username, email, password, salt, hash_algo, role, \
              full_name, phone, address, created_at, active) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.username)
            .bind(&new.email)
            .bind(digest)
            .bind(salt)
            .bind(HashAlgorithm::Sha256)
            .bind(new.role)
            .bind(&new.full_name)
            .bind(&new.phone)
            .bind(&new.address)
            .bind(OffsetDateTime::now_utc())
            .bind(true)
            .fetch_one(db)
            .await
    }

    /// Replace the stored credential (digest, salt, algorithm tag).
    pub async fn update_credential(
        db: &SqlitePool,
        id: Uuid,
        digest: &str,
        salt: &str,
        algorithm: HashAlgorithm,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password = ?, salt = ?, hash_algo = ? WHERE id = ?")
            .bind(digest)
            .bind(salt)
            .bind(algorithm)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_last_login(
        db: &SqlitePool,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password;
    use crate::auth::repo_types::Role;
    use crate::db::test_pool;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password: "pw123".into(),
            role: Role::Patient,
            full_name: Some("Test User".into()),
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_username_and_email() {
        let db = test_pool().await;
        let salt = password::generate_salt();
        let digest = password::hash("pw123", &salt);
        let created = User::create(&db, &new_user("alice", "alice@x.com"), &digest, &salt)
            .await
            .expect("create");
        assert!(created.active);
        assert_eq!(created.hash_algo, HashAlgorithm::Sha256);
        assert!(created.last_login.is_none());

        let by_name = User::find_by_username(&db, "alice")
            .await
            .expect("query")
            .expect("found");
        assert_eq!(by_name.id, created.id);

        let by_email = User::find_by_email(&db, "alice@x.com")
            .await
            .expect("query")
            .expect("found");
        assert_eq!(by_email.id, created.id);

        assert!(User::find_by_username(&db, "nobody")
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn update_credential_and_last_login_round_trip() {
        let db = test_pool().await;
        let salt = password::generate_salt();
        let digest = password::hash("pw123", &salt);
        let user = User::create(&db, &new_user("bob", "bob@x.com"), &digest, &salt)
            .await
            .expect("create");

        let new_salt = password::generate_salt();
        let new_digest = password::hash("changed", &new_salt);
        User::update_credential(&db, user.id, &new_digest, &new_salt, HashAlgorithm::Sha256)
            .await
            .expect("update credential");

        let now = OffsetDateTime::now_utc();
        User::update_last_login(&db, user.id, now).await.expect("update last_login");

        let reloaded = User::find_by_username(&db, "bob")
            .await
            .expect("query")
            .expect("found");
        assert_eq!(reloaded.password, new_digest);
        assert_eq!(reloaded.salt, new_salt);
        assert!(reloaded.last_login.is_some());
    }

    #[test]
    fn serialized_user_omits_credential_fields() {
        let salt = password::generate_salt();
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password: password::hash("pw123", &salt),
            salt,
            hash_algo: HashAlgorithm::Sha256,
            role: Role::Patient,
            full_name: None,
            phone: None,
            address: None,
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
            active: true,
        };
        let json = serde_json::to_value(&user).expect("serialize");
        assert!(json.get("password").is_none());
        assert!(json.get("salt").is_none());
        assert!(json.get("hash_algo").is_none());
        assert_eq!(json["username"], "alice");
    }
}
