//! Credential store: verification and administrative user management.
//!
//! Passwords are stored as a salted SHA-256 verifier plus a plaintext
//! escrow copy for administrative display. The escrow never participates
//! in verification; the decision path recomputes the salted hash and
//! compares it in constant time.

use base64::{Engine as _, engine::general_purpose};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::db::models::DbUser;
use crate::db::sqlite::Storage;
use crate::error::GradeError;

/// The protected administrator username. Role is derived from this name,
/// never stored.
pub const ADMIN_USERNAME: &str = "admin";

/// Shown in place of the escrowed password when none was captured.
pub const PASSWORD_RESET_SENTINEL: &str = "请重新设置密码";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialSummary {
    pub username: String,
    pub display_name: String,
    pub email: String,
    /// Escrowed plaintext, or [`PASSWORD_RESET_SENTINEL`] when absent.
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct AuthResult {
    pub username: String,
    pub display_name: String,
}

#[derive(Clone)]
pub struct AccountService {
    storage: Storage,
}

impl AccountService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Verify a username/password pair. Fails closed: an unknown username
    /// and a wrong password are indistinguishable to the caller.
    pub async fn verify(&self, username: &str, password: &str) -> Result<AuthResult, GradeError> {
        let Some(user) = self.storage.get_user(username).await? else {
            return Err(GradeError::AuthFailed);
        };
        let computed = hash_password(password, &user.salt);
        let matches: bool = computed
            .as_bytes()
            .ct_eq(user.password_hash.as_bytes())
            .into();
        if !matches {
            return Err(GradeError::AuthFailed);
        }
        Ok(AuthResult {
            username: user.username,
            display_name: user.display_name,
        })
    }

    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), GradeError> {
        let salt = generate_salt();
        let user = DbUser {
            username: username.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
            plain_password: Some(password.to_string()),
        };
        if self.storage.insert_user(&user).await? {
            Ok(())
        } else {
            Err(GradeError::UserExists)
        }
    }

    pub async fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), GradeError> {
        let salt = generate_salt();
        let hash = hash_password(new_password, &salt);
        if self
            .storage
            .update_password(username, &hash, &salt, new_password)
            .await?
        {
            Ok(())
        } else {
            Err(GradeError::UserNotFound)
        }
    }

    pub async fn delete(&self, username: &str) -> Result<(), GradeError> {
        if username == ADMIN_USERNAME {
            return Err(GradeError::ProtectedUser);
        }
        if self.storage.delete_user(username).await? {
            Ok(())
        } else {
            Err(GradeError::UserNotFound)
        }
    }

    pub async fn list_all(&self) -> Result<Vec<CredentialSummary>, GradeError> {
        let users = self.storage.list_users().await?;
        Ok(users.into_iter().map(summarize).collect())
    }

    pub async fn count(&self) -> Result<i64, GradeError> {
        self.storage.count_users().await
    }

    /// Startup bootstrap: guarantee the admin credential exists. Returns
    /// true when it had to be created.
    pub async fn ensure_admin(
        &self,
        display_name: &str,
        email: &str,
        initial_password: &str,
    ) -> Result<bool, GradeError> {
        if self.storage.get_user(ADMIN_USERNAME).await?.is_some() {
            return Ok(false);
        }
        match self
            .create(ADMIN_USERNAME, display_name, email, initial_password)
            .await
        {
            Ok(()) => Ok(true),
            // Lost a bootstrap race with another instance: admin exists.
            Err(GradeError::UserExists) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn summarize(user: DbUser) -> CredentialSummary {
    let role = if user.username == ADMIN_USERNAME {
        Role::Admin
    } else {
        Role::User
    };
    CredentialSummary {
        username: user.username,
        display_name: user.display_name,
        email: user.email,
        password: user
            .plain_password
            .unwrap_or_else(|| PASSWORD_RESET_SENTINEL.to_string()),
        role,
    }
}

fn generate_salt() -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt[..]);
    general_purpose::STANDARD.encode(salt)
}

fn hash_password(password: &str, salt: &str) -> String {
    let salted = format!("{password}{salt}");
    let mut hasher = Sha256::new();
    hasher.update(salted.as_bytes());
    hex::encode(hasher.finalize())
}
