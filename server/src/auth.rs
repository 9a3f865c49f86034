use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{NaiveDate, Utc};
use password_hash::SaltString;
use rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::entity::user;

/// Error type for the account store.
#[derive(Debug)]
pub enum AuthError {
    NotFound,
    InvalidPassword,
    Db(sea_orm::DbErr),
    Hash(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NotFound => write!(f, "User not found"),
            AuthError::InvalidPassword => write!(f, "Invalid password"),
            AuthError::Db(e) => write!(f, "Database error: {e}"),
            AuthError::Hash(e) => write!(f, "Hash error: {e}"),
        }
    }
}

impl std::error::Error for AuthError {}

pub struct Auth {
    db: DatabaseConnection,
}

impl Auth {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Verify username/password against the store, returning the model on success.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, AuthError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(AuthError::Db)?
            .ok_or(AuthError::NotFound)?;

        Self::verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    /// Create a new account with an Argon2-hashed password.
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        birthdate: NaiveDate,
        password: &str,
    ) -> Result<user::Model, AuthError> {
        let password_hash = Self::hash_password(password)?;
        let now = Utc::now().naive_utc();
        user::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_owned()),
            username: Set(username.to_owned()),
            birthdate: Set(birthdate),
            password_hash: Set(password_hash),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(AuthError::Db)
    }

    /// Replace the stored password hash for an existing account.
    pub async fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(AuthError::Db)?
            .ok_or(AuthError::NotFound)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(Self::hash_password(new_password)?);
        active.update(&self.db).await.map_err(AuthError::Db)?;
        Ok(())
    }

    /// Return the total number of accounts in the store.
    pub async fn count_users(&self) -> Result<u64, AuthError> {
        user::Entity::find().count(&self.db).await.map_err(AuthError::Db)
    }

    /// Hash a plaintext password with Argon2id + a random salt.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Check a plaintext password against a stored PHC hash string.
    pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
        let hash = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .map_err(|_| AuthError::InvalidPassword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    fn birthdate() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()
    }

    async fn setup() -> Auth {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Auth::new(db)
    }

    // --- hash_password / verify_password ---

    #[tokio::test]
    async fn test_hash_produces_argon2_format() {
        let hash = Auth::hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"), "Expected Argon2 PHC string, got: {}", hash);
    }

    #[tokio::test]
    async fn test_hash_unique_per_call() {
        // Two hashes of the same password must differ (random salt)
        let h1 = Auth::hash_password("same").unwrap();
        let h2 = Auth::hash_password("same").unwrap();
        assert_ne!(h1, h2, "Same password hashed twice should produce different hashes");
    }

    #[tokio::test]
    async fn test_hash_verifies_correctly() {
        let hash = Auth::hash_password("correct horse battery staple").unwrap();
        Auth::verify_password("correct horse battery staple", &hash)
            .expect("Should verify successfully");
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_password() {
        let hash = Auth::hash_password("right").unwrap();
        let err = Auth::verify_password("wrong", &hash).unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    // --- count_users / create_user ---

    #[tokio::test]
    async fn test_empty_store_count_is_zero() {
        let auth = setup().await;
        assert_eq!(auth.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_user_increments_count() {
        let auth = setup().await;
        auth.create_user("alice@example.com", "alice", birthdate(), "pw1")
            .await
            .unwrap();
        assert_eq!(auth.count_users().await.unwrap(), 1);
        auth.create_user("bob@example.com", "bob", birthdate(), "pw2")
            .await
            .unwrap();
        assert_eq!(auth.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_not_plaintext() {
        let auth = setup().await;
        let created = auth
            .create_user("alice@example.com", "alice", birthdate(), "supersecret")
            .await
            .unwrap();

        assert_ne!(created.password_hash, "supersecret", "Plaintext must never be stored");
        assert!(created.password_hash.starts_with("$argon2"), "Must be Argon2 PHC string");
    }

    #[tokio::test]
    async fn test_create_user_stores_correct_fields() {
        let auth = setup().await;
        let created = auth
            .create_user("charlie@example.com", "charlie", birthdate(), "pw")
            .await
            .unwrap();

        assert_eq!(created.email, "charlie@example.com");
        assert_eq!(created.username, "charlie");
        assert_eq!(created.birthdate, birthdate());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username_errors() {
        let auth = setup().await;
        auth.create_user("alice@example.com", "alice", birthdate(), "pw")
            .await
            .unwrap();
        let result = auth
            .create_user("other@example.com", "alice", birthdate(), "pw")
            .await;
        assert!(result.is_err(), "Duplicate username must fail");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_errors() {
        let auth = setup().await;
        auth.create_user("alice@example.com", "alice", birthdate(), "pw")
            .await
            .unwrap();
        let result = auth
            .create_user("alice@example.com", "alice2", birthdate(), "pw")
            .await;
        assert!(result.is_err(), "Duplicate email must fail");
    }

    // --- authenticate ---

    #[tokio::test]
    async fn test_authenticate_success_returns_model() {
        let auth = setup().await;
        auth.create_user("alice@example.com", "alice", birthdate(), "correct")
            .await
            .unwrap();

        let user = auth.authenticate("alice", "correct").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password_rejected() {
        let auth = setup().await;
        auth.create_user("alice@example.com", "alice", birthdate(), "correct")
            .await
            .unwrap();

        let err = auth.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword), "Expected InvalidPassword, got {:?}", err);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_rejected() {
        let auth = setup().await;

        let err = auth.authenticate("nobody", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    // --- reset_password ---

    #[tokio::test]
    async fn test_reset_password_replaces_hash() {
        let auth = setup().await;
        auth.create_user("alice@example.com", "alice", birthdate(), "old-pw")
            .await
            .unwrap();

        auth.reset_password("alice", "new-pw").await.unwrap();

        assert!(auth.authenticate("alice", "old-pw").await.is_err());
        auth.authenticate("alice", "new-pw")
            .await
            .expect("New password should authenticate");
    }

    #[tokio::test]
    async fn test_reset_password_unknown_user_rejected() {
        let auth = setup().await;
        let err = auth.reset_password("nobody", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }
}
