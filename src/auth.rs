//! Password hashing and login.

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::model::{User, UserRole};
use crate::store::{SqliteStore, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compares every byte so the time taken does not depend on where they differ.
fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn verify_password(salt: &str, password: &str, expected_hash: &str) -> bool {
    digests_match(&hash_password(salt, password), expected_hash)
}

pub fn login(store: &SqliteStore<'_>, email: &str, password: &str) -> Result<User, AuthError> {
    let Some(creds) = store.find_credentials(email)? else {
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(&creds.salt, password, &creds.hash) {
        return Err(AuthError::InvalidCredentials);
    }
    info!(user = %creds.user.email, role = %creds.user.role, "login");
    Ok(creds.user)
}

pub fn register(
    store: &SqliteStore<'_>,
    name: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> Result<User, AuthError> {
    if password.is_empty() {
        return Err(AuthError::Store(StoreError::Invalid(
            "password must not be empty".to_string(),
        )));
    }
    let salt = new_salt();
    let hash = hash_password(&salt, password);
    Ok(store.create_user(name, email, role, &salt, &hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use rusqlite::Connection;

    #[test]
    fn hash_depends_on_salt() {
        let a = hash_password("salt-a", "password");
        let b = hash_password("salt-b", "password");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(verify_password("salt-a", "password", &a));
        assert!(!verify_password("salt-a", "Password", &a));
    }

    #[test]
    fn login_checks_password_and_email() {
        let conn = Connection::open_in_memory().expect("open memory db");
        db::apply_schema(&conn).expect("schema");
        let store = SqliteStore::new(&conn);
        register(&store, "Rajesh Kumar", "rajesh@greenvalley.edu", "secret", UserRole::Teacher)
            .expect("register");

        let user = login(&store, "Rajesh@GreenValley.edu", "secret").expect("login");
        assert_eq!(user.role, UserRole::Teacher);
        assert!(matches!(
            login(&store, "rajesh@greenvalley.edu", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, "nobody@greenvalley.edu", "secret"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn empty_password_is_rejected() {
        let conn = Connection::open_in_memory().expect("open memory db");
        db::apply_schema(&conn).expect("schema");
        let store = SqliteStore::new(&conn);
        assert!(register(&store, "X", "x@example.com", "", UserRole::Admin).is_err());
    }
}
