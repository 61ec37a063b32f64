//! Credential resolution.
//!
//! Two secrets live here: the backend API key and the elevation token
//! that unlocks the elevated tier. Both resolve from the OS keyring
//! first and an environment variable second; the API key may also be
//! supplied interactively by the caller and stored for next time. The
//! elevation token is only ever compared server-side of the UI — there
//! is no literal in client-reachable code.

use keyring::Entry;

const KEYRING_SERVICE: &str = "sugil";
const API_KEY_ENTRY: &str = "api-key";
const UNLOCK_TOKEN_ENTRY: &str = "elevated-unlock";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const UNLOCK_TOKEN_ENV: &str = "SUGIL_UNLOCK_TOKEN";

pub struct AuthManager {
    use_keyring: bool,
    #[cfg(test)]
    fixed_api_key: Option<String>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct an AuthManager, optionally disabling keyring access
    /// (useful for tests).
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self {
            use_keyring,
            #[cfg(test)]
            fixed_api_key: None,
        }
    }

    /// Bypass keyring and environment entirely in tests.
    #[cfg(test)]
    pub fn with_fixed_api_key(key: &str) -> Self {
        Self {
            use_keyring: false,
            fixed_api_key: Some(key.to_string()),
        }
    }

    fn keyring_get(&self, entry_name: &str) -> Option<String> {
        if !self.use_keyring {
            return None;
        }
        let entry = Entry::new(KEYRING_SERVICE, entry_name).ok()?;
        match entry.get_password() {
            Ok(secret) => Some(secret),
            Err(keyring::Error::NoEntry) => None,
            Err(err) => {
                tracing::warn!("keyring lookup for '{entry_name}' failed: {err}");
                None
            }
        }
    }

    /// Resolve the backend API key: keyring first, environment second.
    /// `None` blocks submission before any network call.
    pub fn resolve_api_key(&self) -> Option<String> {
        #[cfg(test)]
        if let Some(key) = &self.fixed_api_key {
            return Some(key.clone());
        }
        self.keyring_get(API_KEY_ENTRY)
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Persist an interactively supplied API key.
    pub fn store_api_key(&self, key: &str) -> Result<(), Box<dyn std::error::Error>> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, API_KEY_ENTRY)?;
        entry.set_password(key)?;
        Ok(())
    }

    /// Check a user-supplied elevation token against the stored one.
    /// With no token configured anywhere, elevation is unavailable.
    pub fn verify_unlock_token(&self, supplied: &str) -> bool {
        let Some(expected) = self
            .keyring_get(UNLOCK_TOKEN_ENTRY)
            .or_else(|| std::env::var(UNLOCK_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
        else {
            return false;
        };
        constant_time_eq(expected.as_bytes(), supplied.as_bytes())
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
