//! Identity collaborator and explicit auth context.
//!
//! The core only needs an opaque user id. [`AuthContext`] carries it
//! explicitly into the recorder and store calls. [`LocalIdentity`] is a
//! minimal on-device provider that keeps salted password digests in the
//! key/value store.

use std::collections::HashMap;
use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{IdentityError, ValidationError};
use crate::storage::KeyValueStore;

pub const MIN_PASSWORD_LEN: usize = 6;

const ACCOUNTS_KEY: &str = "auth_accounts";
const CURRENT_USER_KEY: &str = "auth_current_user";

/// Opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// Who the current call is acting for. Absent user means anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    user: Option<User>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Form-level checks for the sign-in screen.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    Ok(())
}

/// Form-level checks for the sign-up screen.
pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_sign_in(email, password)?;
    if confirm.is_empty() {
        return Err(ValidationError::MissingField("confirm_password"));
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Source of the signed-in user.
pub trait IdentityProvider {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, IdentityError>;

    fn sign_up(&mut self, email: &str, password: &str) -> Result<User, IdentityError>;

    fn sign_out(&mut self);

    fn current_user(&self) -> Option<&User>;

    fn require_user(&self) -> Result<&User, IdentityError> {
        self.current_user().ok_or(IdentityError::NotSignedIn)
    }

    fn context(&self) -> AuthContext {
        match self.current_user() {
            Some(user) => AuthContext::for_user(user.clone()),
            None => AuthContext::anonymous(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    id: UserId,
    email: String,
    salt: String,
    digest: String,
}

/// On-device accounts kept in the key/value store.
pub struct LocalIdentity<S: KeyValueStore> {
    store: S,
    current: Option<User>,
}

impl<S: KeyValueStore> LocalIdentity<S> {
    /// Wrap a store, restoring any user left signed in.
    pub fn new(store: S) -> Self {
        let current = match store.get(CURRENT_USER_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json)
                .map_err(|e| tracing::warn!("discarding unreadable signed-in user: {e}"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::error!("error loading signed-in user: {e}");
                None
            }
        };
        Self { store, current }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn accounts(&self) -> Result<HashMap<String, Account>, IdentityError> {
        let raw = self
            .store
            .get(ACCOUNTS_KEY)
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        match raw {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| IdentityError::Unavailable(e.to_string()))
            }
            None => Ok(HashMap::new()),
        }
    }

    fn save_accounts(&self, accounts: &HashMap<String, Account>) -> Result<(), IdentityError> {
        let json =
            serde_json::to_string(accounts).map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        self.store
            .set(ACCOUNTS_KEY, &json)
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }

    fn remember(&mut self, user: User) -> User {
        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = self.store.set(CURRENT_USER_KEY, &json) {
                    tracing::error!("error storing signed-in user: {e}");
                }
            }
            Err(e) => tracing::error!("error serializing signed-in user: {e}"),
        }
        self.current = Some(user.clone());
        user
    }
}

impl<S: KeyValueStore> IdentityProvider for LocalIdentity<S> {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, IdentityError> {
        let email = normalize_email(email);
        let accounts = self.accounts()?;
        let account = accounts
            .get(&email)
            .ok_or(IdentityError::InvalidCredentials)?;
        if password_digest(&account.salt, password) != account.digest {
            return Err(IdentityError::InvalidCredentials);
        }
        let user = User {
            id: account.id.clone(),
            email: account.email.clone(),
        };
        tracing::info!(user = %user.id, "signed in");
        Ok(self.remember(user))
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<User, IdentityError> {
        let email = normalize_email(email);
        let mut accounts = self.accounts()?;
        if accounts.contains_key(&email) {
            return Err(IdentityError::AccountExists(email));
        }

        let salt = new_salt();
        let account = Account {
            id: UserId::new(uuid::Uuid::new_v4().to_string()),
            email: email.clone(),
            digest: password_digest(&salt, password),
            salt,
        };
        let user = User {
            id: account.id.clone(),
            email: account.email.clone(),
        };
        accounts.insert(email, account);
        self.save_accounts(&accounts)?;
        tracing::info!(user = %user.id, "account created");
        Ok(self.remember(user))
    }

    fn sign_out(&mut self) {
        self.current = None;
        if let Err(e) = self.store.remove(CURRENT_USER_KEY) {
            tracing::error!("error clearing signed-in user: {e}");
        }
    }

    fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
