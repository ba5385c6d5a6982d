use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use tracing::{error, info, warn};

use crate::{
    error::{LibraryError, LibraryResult},
    store::{LibraryStore, Session},
};

pub const SESSION_TOKEN_LENGTH: usize = 128;

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// Largest multiple of the alphabet size that fits in a byte; higher bytes are
// discarded so every symbol is equally likely.
const TOKEN_SAMPLE_CEILING: u8 = (256 / TOKEN_ALPHABET.len() * TOKEN_ALPHABET.len()) as u8;

/// Who is making the current request, resolved once from the session cookie.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub is_admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn admin() -> Self {
        Self { is_admin: true }
    }

    pub fn require_admin(&self) -> LibraryResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(LibraryError::Unauthorized)
        }
    }
}

/// Issues, checks and revokes administrator sessions. Sessions carry no
/// expiry: a token stays valid until it is logged out.
#[derive(Clone)]
pub struct SessionAuthenticator {
    store: Arc<dyn LibraryStore>,
}

impl SessionAuthenticator {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    pub async fn login(&self, username: &str, password: &str) -> LibraryResult<Session> {
        if !self.store.verify_credentials(username, password).await? {
            warn!(%username, "rejected administrator login");
            return Err(LibraryError::AuthFailed);
        }

        let session = Session {
            token: generate_session_token(),
            created_at: Utc::now(),
        };
        self.store
            .create_session(&session.token, session.created_at)
            .await?;

        info!(%username, "administrator logged in");
        Ok(session)
    }

    pub async fn is_authenticated(&self, token: Option<&str>) -> LibraryResult<bool> {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Ok(false);
        };

        Ok(self.store.get_session(token).await?.is_some())
    }

    /// Resolve the request's viewer. A storage fault degrades to an anonymous
    /// viewer so public pages keep working; admin-only actions are then refused.
    pub async fn resolve(&self, token: Option<&str>) -> Viewer {
        match self.is_authenticated(token).await {
            Ok(true) => Viewer { is_admin: true },
            Ok(false) => Viewer::anonymous(),
            Err(err) => {
                error!(?err, "failed to resolve session");
                Viewer::anonymous()
            }
        }
    }

    pub async fn logout(&self, token: Option<&str>) -> LibraryResult<()> {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Ok(());
        };

        self.store.delete_session(token).await?;
        info!("administrator session revoked");
        Ok(())
    }
}

pub fn generate_session_token() -> String {
    let mut token = String::with_capacity(SESSION_TOKEN_LENGTH);
    let mut buffer = [0u8; 64];

    while token.len() < SESSION_TOKEN_LENGTH {
        OsRng.fill_bytes(&mut buffer);
        for byte in buffer {
            if token.len() == SESSION_TOKEN_LENGTH {
                break;
            }
            if byte < TOKEN_SAMPLE_CEILING {
                let index = usize::from(byte) % TOKEN_ALPHABET.len();
                token.push(char::from(TOKEN_ALPHABET[index]));
            }
        }
    }

    token
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}
