use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub token: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            token: model.token,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields accepted when registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    #[must_use]
    pub fn member(email: &str, password: &str, name: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Staff + superuser flags set; only reachable from the CLI.
    #[must_use]
    pub fn superuser(email: &str, password: &str, name: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            is_staff: true,
            is_superuser: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("email must not be blank")]
    BlankEmail,

    #[error("a user with this email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create and persist a user. The email is normalized before storage and
    /// the password is only ever persisted as an Argon2id hash.
    pub async fn create(
        &self,
        new_user: NewUser,
        security: Option<&SecurityConfig>,
    ) -> Result<User, CreateUserError> {
        if new_user.email.trim().is_empty() {
            return Err(CreateUserError::BlankEmail);
        }

        let email = normalize_email(&new_user.email);

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(&self.conn)
            .await
            .context("Failed to check for existing email")?;
        if existing.is_some() {
            return Err(CreateUserError::DuplicateEmail);
        }

        let password = new_user.password.clone();
        let security = security.cloned();
        let password_hash =
            task::spawn_blocking(move || hash_password(&password, security.as_ref()))
                .await
                .context("Password hashing task panicked")?
                .map_err(CreateUserError::Other)?;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(new_user.name),
            is_active: Set(true),
            is_staff: Set(new_user.is_staff),
            is_superuser: Set(new_user.is_superuser),
            token: Set(generate_token()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Verify credentials and return the matching user.
    ///
    /// Returns `None` for both "no such user" and "wrong password" so callers
    /// cannot distinguish the two (account-enumeration hardening). Argon2
    /// verification runs in `spawn_blocking` because it is CPU-intensive and
    /// would block the async runtime if run directly.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.conn)
            .await
            .context("Failed to query user for credential verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid && user.is_active {
            Ok(Some(User::from(user)))
        } else {
            Ok(None)
        }
    }

    /// Resolve an auth token to its user
    pub async fn verify_token(&self, token: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by token")?;

        Ok(user.map(User::from))
    }
}

/// Normalize an email by lower-casing only the domain portion (text after
/// the last `@`). The local part keeps its case.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random auth token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(
            normalize_email("Test.User@EXAMPLE.Com"),
            "Test.User@example.com"
        );
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_normalize_email_uses_last_at_sign() {
        // Quoted local parts may themselves contain '@'
        assert_eq!(normalize_email("\"a@B\"@Example.COM"), "\"a@B\"@example.com");
    }

    #[test]
    fn test_normalize_email_without_at_sign_is_untouched() {
        assert_eq!(normalize_email("NotAnEmail"), "NotAnEmail");
    }

    #[test]
    fn test_generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }
}
