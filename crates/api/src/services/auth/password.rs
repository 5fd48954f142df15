//! Salted password credentials.
//!
//! A password is stored as `hex(HMAC-SHA1(key = salt, message = password))`
//! next to a random per-user salt. The raw password never leaves the request
//! that carried it.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

/// Stored credential material for one user.
///
/// Implements `Debug` manually to redact the hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Random per-user key (a UUID v4).
    pub salt: String,
    /// Hex-encoded HMAC of the password.
    pub hashed_password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("salt", &self.salt)
            .field("hashed_password", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    /// Derive a credential for `password` under a freshly generated salt.
    #[must_use]
    pub fn new(password: &SecretString) -> Self {
        let salt = Uuid::new_v4().to_string();
        let hashed_password = encrypt_password(&salt, password.expose_secret());
        Self {
            salt,
            hashed_password,
        }
    }

    /// Check a candidate password against the stored hash.
    ///
    /// An empty stored hash never authenticates, nor does an empty candidate.
    #[must_use]
    pub fn authenticate(&self, candidate: &str) -> bool {
        if self.hashed_password.is_empty() || candidate.is_empty() {
            return false;
        }
        let Ok(expected) = hex::decode(&self.hashed_password) else {
            return false;
        };
        let Ok(mut mac) = HmacSha1::new_from_slice(self.salt.as_bytes()) else {
            return false;
        };
        mac.update(candidate.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

/// Hash `password` under `salt`.
///
/// Returns an empty string for an empty password.
#[must_use]
pub fn encrypt_password(salt: &str, password: &str) -> String {
    if password.is_empty() {
        return String::new();
    }
    let Ok(mut mac) = HmacSha1::new_from_slice(salt.as_bytes()) else {
        return String::new();
    };
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_password_known_vector() {
        assert_eq!(
            encrypt_password("key", "The quick brown fox jumps over the lazy dog"),
            "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }

    #[test]
    fn test_encrypt_empty_password() {
        assert_eq!(encrypt_password("salt", ""), "");
    }

    #[test]
    fn test_authenticate_round_trip() {
        let credential = Credential::new(&SecretString::from("hunter22"));
        assert!(credential.authenticate("hunter22"));
        assert!(!credential.authenticate("hunter23"));
        assert!(!credential.authenticate(""));
    }

    #[test]
    fn test_fresh_salt_per_credential() {
        let password = SecretString::from("hunter22");
        let a = Credential::new(&password);
        let b = Credential::new(&password);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hashed_password, b.hashed_password);
    }

    #[test]
    fn test_empty_stored_hash_never_authenticates() {
        let credential = Credential {
            salt: "salt".to_owned(),
            hashed_password: String::new(),
        };
        assert!(!credential.authenticate("anything1"));
    }

    #[test]
    fn test_only_latest_password_authenticates() {
        let old = Credential::new(&SecretString::from("first1"));
        let new = Credential::new(&SecretString::from("second2"));
        assert!(!new.authenticate("first1"));
        assert!(new.authenticate("second2"));
        assert!(old.authenticate("first1"));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let credential = Credential::new(&SecretString::from("hunter22"));
        let debug = format!("{credential:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&credential.hashed_password));
    }
}
