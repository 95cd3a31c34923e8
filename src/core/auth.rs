//! User accounts, roles and login sessions
//!
//! Passwords are stored as salted PBKDF2-HMAC-SHA256 digests. A login issues
//! a random bearer token; the store only keeps the token's SHA-256 digest.

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::core::store::DocumentStore;
use crate::core::Config;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const TOKEN_LEN: usize = 32;

/// Account roles
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Every role, in display order
pub const ROLES: [Role; 2] = [Role::Admin, Role::User];

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(format!("Role must be one of: admin, user (got '{}')", s)),
        }
    }
}

/// A user account (never carries the password hash)
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    pub disabled: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: None,
            full_name: None,
            role,
            disabled: false,
        }
    }
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.role.is_none()
    }
}

/// An issued login session
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token handed to the client; not recoverable from the store
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Authentication and account errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Not logged in. Run 'hwatm login' first.")]
    NotAuthenticated,

    #[error("Session expired. Run 'hwatm login' again.")]
    SessionExpired,

    #[error("Inactive user: {0}")]
    Disabled(String),

    #[error("Not enough permissions: {0} role required")]
    Forbidden(Role),

    #[error("Username '{0}' already exists")]
    UserExists(String),

    #[error("Email '{0}' already exists")]
    EmailExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long")]
    WeakPassword,

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Cannot {0} your own account")]
    SelfAction(&'static str),

    #[error("store error: {0}")]
    Store(String),
}

impl From<miette::Report> for AuthError {
    fn from(e: miette::Report) -> Self {
        AuthError::Store(e.to_string())
    }
}

/// Fail unless the user holds the given role
pub fn require_role(user: &User, role: Role) -> Result<(), AuthError> {
    if user.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden(role))
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidField {
            field: "username",
            reason: "must be non-empty and contain no whitespace".to_string(),
        });
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidField {
            field: "email",
            reason: format!("'{}' is not an email address", email),
        })
    }
}

/// Hash a password as `pbkdf2-sha256$<iterations>$<salt>$<digest>` (hex fields)
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt[..]);

    let mut digest = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut digest);

    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        to_hex(&salt),
        to_hex(&digest)
    )
}

/// Check a password against a stored hash; malformed hashes never verify
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(iterations), Some(salt), Some(expected)) =
        (iterations.parse::<u32>(), from_hex(salt), from_hex(expected))
    else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let mut digest = vec![0u8; expected.len()];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut digest);
    digest.ct_eq(&expected).into()
}

/// Random bearer token (hex)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::rng().fill(&mut bytes[..]);
    to_hex(&bytes)
}

/// Digest under which a token is stored
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() || s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Account and session operations over the document store
pub struct Authenticator<'a> {
    store: &'a DocumentStore,
    config: &'a Config,
}

impl<'a> Authenticator<'a> {
    pub fn new(store: &'a DocumentStore, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Create an account with any role
    pub fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let username = new_user.username.trim().to_string();
        validate_username(&username)?;
        validate_password(&new_user.password)?;
        if let Some(email) = &new_user.email {
            validate_email(email)?;
        }

        if self.store.get_user(&username)?.is_some() {
            return Err(AuthError::UserExists(username));
        }
        if let Some(email) = &new_user.email {
            if self.store.get_user_by_email(email)?.is_some() {
                return Err(AuthError::EmailExists(email.clone()));
            }
        }

        let hash = hash_password(&new_user.password, self.config.password_iterations);
        let user = self.store.insert_user(
            &username,
            new_user.email.as_deref(),
            new_user.full_name.as_deref(),
            new_user.role,
            new_user.disabled,
            &hash,
        )?;
        tracing::info!(username = %user.username, role = %user.role, "created user");
        Ok(user)
    }

    /// Self-service registration; always yields a `user` account
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
        full_name: Option<String>,
    ) -> Result<User, AuthError> {
        self.create_user(NewUser {
            email,
            full_name,
            ..NewUser::new(username, password, Role::User)
        })
    }

    /// Verify credentials and open a session
    pub fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let record = self
            .store
            .get_user(username.trim())?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &record.password_hash) {
            tracing::warn!(username = %username, "failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }
        if record.user.disabled {
            return Err(AuthError::Disabled(record.user.username));
        }

        let now = Utc::now();
        let expires_at = Duration::try_minutes(self.config.session_ttl_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::InvalidField {
                field: "session_ttl_minutes",
                reason: format!("{} minutes is out of range", self.config.session_ttl_minutes),
            })?;
        let token = generate_token();

        self.store.purge_expired_sessions(&now)?;
        self.store.insert_session(
            &token_digest(&token),
            &record.user.username,
            &now,
            &expires_at,
        )?;
        self.store.touch_last_login(&record.user.username, &now)?;

        let mut user = record.user;
        user.last_login = Some(now);
        Ok(Session {
            token,
            user,
            expires_at,
        })
    }

    /// Resolve a bearer token to an active user
    pub fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let (username, expires_at) = self
            .store
            .find_session(&token_digest(token))?
            .ok_or(AuthError::NotAuthenticated)?;

        if expires_at <= Utc::now() {
            self.store.delete_session(&token_digest(token))?;
            return Err(AuthError::SessionExpired);
        }

        let record = self
            .store
            .get_user(&username)?
            .ok_or(AuthError::NotAuthenticated)?;
        if record.user.disabled {
            return Err(AuthError::Disabled(record.user.username));
        }
        Ok(record.user)
    }

    /// End a session; returns false if the token was unknown
    pub fn logout(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.store.delete_session(&token_digest(token))?)
    }

    pub fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let record = self
            .store
            .get_user(&user.username)?
            .ok_or_else(|| AuthError::UserNotFound(user.username.clone()))?;
        if !verify_password(current_password, &record.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new_password)?;

        let hash = hash_password(new_password, self.config.password_iterations);
        self.store.set_password_hash(&user.username, &hash)?;
        Ok(())
    }

    pub fn update_user(&self, username: &str, update: UserUpdate) -> Result<User, AuthError> {
        if let Some(email) = &update.email {
            validate_email(email)?;
            if let Some(existing) = self.store.get_user_by_email(email)? {
                if existing.user.username != username {
                    return Err(AuthError::EmailExists(email.clone()));
                }
            }
        }

        if !self.store.update_user_fields(
            username,
            update.email.as_deref(),
            update.full_name.as_deref(),
            update.role,
        )? {
            return Err(AuthError::UserNotFound(username.to_string()));
        }
        self.get_user(username)
    }

    /// Enable or disable an account; `actor` cannot disable themselves
    pub fn set_disabled(
        &self,
        actor: &User,
        username: &str,
        disabled: bool,
    ) -> Result<User, AuthError> {
        if disabled && actor.username == username {
            return Err(AuthError::SelfAction("disable"));
        }
        if !self.store.set_user_disabled(username, disabled)? {
            return Err(AuthError::UserNotFound(username.to_string()));
        }
        if disabled {
            self.store.delete_sessions_for(username)?;
        }
        self.get_user(username)
    }

    /// Delete an account; `actor` cannot delete themselves
    pub fn delete_user(&self, actor: &User, username: &str) -> Result<(), AuthError> {
        if actor.username == username {
            return Err(AuthError::SelfAction("delete"));
        }
        if !self.store.delete_user(username)? {
            return Err(AuthError::UserNotFound(username.to_string()));
        }
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<User, AuthError> {
        self.store
            .get_user(username)?
            .map(|r| r.user)
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))
    }
}
