//! Local accounts
//!
//! Accounts live in the store's account directory keyed by normalized email.
//! Passwords are never kept in plain text.

use sha2::{Digest, Sha256};
use std::fmt::Write;
use thiserror::Error;

use crate::save::{AccountRecord, KeyValueStore, ProfileSnapshot, SessionStore};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("No account registered for {0}")]
    UnknownAccount(String),

    #[error("Invalid credentials for {0}")]
    InvalidCredentials(String),

    #[error("An account already exists for {0}")]
    AlreadyRegistered(String),
}

/// Trim and lowercase, rejecting anything without an `@`
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if !email.contains('@') {
        return Err(AuthError::InvalidEmail(email));
    }
    Ok(email)
}

/// Lowercase hex SHA-256 of `"<email>:<password>"`
pub fn obscure_password(normalized_email: &str, password: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", normalized_email, password).as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut hex, byte| {
        let _ = write!(hex, "{:02x}", byte);
        hex
    })
}

fn credentials(email: &str, password: &str) -> Result<(String, String), AuthError> {
    let email = normalize_email(email)?;
    if password.trim().is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    let obscured = obscure_password(&email, password);
    Ok((email, obscured))
}

/// Create an account with a fresh user id and a default profile
pub fn register<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    email: &str,
    password: &str,
) -> Result<AccountRecord, AuthError> {
    let (email, password) = credentials(email, password)?;

    let mut accounts = store.accounts();
    if accounts.contains_key(&email) {
        return Err(AuthError::AlreadyRegistered(email));
    }

    let record = AccountRecord {
        email: email.clone(),
        password,
        user_id: uuid::Uuid::new_v4().to_string(),
        profile: ProfileSnapshot::default(),
    };
    accounts.insert(email.clone(), record.clone());
    store.save_accounts(&accounts);
    store.set_last_identity(&email);

    tracing::info!(email = %email, user_id = %record.user_id, "account registered");
    Ok(record)
}

pub fn login<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    email: &str,
    password: &str,
) -> Result<AccountRecord, AuthError> {
    let (email, password) = credentials(email, password)?;

    let record = store
        .accounts()
        .remove(&email)
        .ok_or_else(|| AuthError::UnknownAccount(email.clone()))?;
    if record.password != password {
        tracing::warn!(email = %email, "login rejected");
        return Err(AuthError::InvalidCredentials(email));
    }

    store.set_last_identity(&email);
    tracing::info!(email = %email, user_id = %record.user_id, "logged in");
    Ok(record)
}

/// Register unknown emails, log in known ones
pub fn login_or_register<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    email: &str,
    password: &str,
) -> Result<AccountRecord, AuthError> {
    match login(store, email, password) {
        Err(AuthError::UnknownAccount(_)) => register(store, email, password),
        other => other,
    }
}

/// Mirror a user's progress into their account record
pub fn update_profile<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    email: &str,
    profile: ProfileSnapshot,
) -> bool {
    let mut accounts = store.accounts();
    let Some(record) = accounts.get_mut(email) else {
        tracing::warn!(email, "profile update for unknown account");
        return false;
    };
    if record.profile == profile {
        return true;
    }
    record.profile = profile;
    store.save_accounts(&accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemoryStore;

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new())
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Me@Example.COM ").unwrap(), "me@example.com");
        assert_eq!(normalize_email("   "), Err(AuthError::MissingField("email")));
        assert!(matches!(normalize_email("nobody"), Err(AuthError::InvalidEmail(_))));
    }

    #[test]
    fn test_obscured_password_is_hex_sha256() {
        let hash = obscure_password("a@b.c", "secret");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(hash, obscure_password("a@b.c", "Secret"));
        assert_ne!(hash, obscure_password("x@b.c", "secret"));
    }

    #[test]
    fn test_register_then_login() {
        let mut store = store();
        let registered = register(&mut store, "Me@Example.com", "pw").unwrap();
        assert_ne!(registered.password, "pw");

        let logged_in = login(&mut store, "me@example.COM", "pw").unwrap();
        assert_eq!(logged_in.user_id, registered.user_id);
        assert_eq!(store.last_identity().as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let mut store = store();
        register(&mut store, "me@example.com", "pw").unwrap();
        assert_eq!(
            login(&mut store, "me@example.com", "nope"),
            Err(AuthError::InvalidCredentials("me@example.com".into()))
        );
        assert_eq!(
            login_or_register(&mut store, "me@example.com", "nope"),
            Err(AuthError::InvalidCredentials("me@example.com".into()))
        );
    }

    #[test]
    fn test_duplicate_and_unknown() {
        let mut store = store();
        assert!(matches!(login(&mut store, "x@y.z", "pw"), Err(AuthError::UnknownAccount(_))));
        register(&mut store, "x@y.z", "pw").unwrap();
        assert!(matches!(
            register(&mut store, "X@Y.Z", "other"),
            Err(AuthError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_blank_password() {
        let mut store = store();
        assert_eq!(register(&mut store, "x@y.z", "  "), Err(AuthError::MissingField("password")));
        assert!(store.accounts().is_empty());
    }

    #[test]
    fn test_login_or_register_is_stable() {
        let mut store = store();
        let first = login_or_register(&mut store, "x@y.z", "pw").unwrap();
        let second = login_or_register(&mut store, "x@y.z", "pw").unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(store.accounts().len(), 1);
    }

    #[test]
    fn test_update_profile() {
        let mut store = store();
        register(&mut store, "x@y.z", "pw").unwrap();
        let profile = ProfileSnapshot { exp: 40, level: 2, ..ProfileSnapshot::default() };

        assert!(update_profile(&mut store, "x@y.z", profile));
        assert_eq!(store.accounts()["x@y.z"].profile, profile);
        assert!(!update_profile(&mut store, "ghost@y.z", profile));
    }
}
