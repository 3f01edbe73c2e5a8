//! The server's root key and its process-wide store.
//!
//! The key is loaded once from the environment and shared as `Arc<RootKey>`;
//! it is never logged, displayed or included in error messages.

use std::{
    str::FromStr,
    sync::{Arc, OnceLock},
};

use rand::RngCore;

use crate::errors::{Error, Result};

/// Environment variable holding the hex encoded root key.
pub const ROOT_KEY_ENV: &str = "LSAT_ROOT_KEY";

/// 32 byte secret every macaroon is signed under.
#[derive(Clone, PartialEq, Eq)]
pub struct RootKey([u8; 32]);

impl RootKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        RootKey(bytes)
    }

    /// Generate a random key. Tokens signed with it do not survive a restart.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        RootKey(bytes)
    }

    /// Read the key from [`ROOT_KEY_ENV`].
    pub fn from_env() -> Result<Self> {
        let value = std::env::var(ROOT_KEY_ENV)
            .map_err(|err| Error::ConfigurationError(format!("{ROOT_KEY_ENV}: {err}")))?;
        value.trim().parse()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for RootKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        // The decode error names the offending character, so it is dropped here.
        hex::decode_to_slice(s, &mut bytes).map_err(|_| {
            Error::ConfigurationError(format!(
                "{ROOT_KEY_ENV} must be 64 hex characters (32 bytes)"
            ))
        })?;
        Ok(RootKey(bytes))
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RootKey(..)")
    }
}

static GLOBAL_ROOT_KEY: OnceLock<Result<Arc<RootKey>>> = OnceLock::new();

/// Process-wide root key, loaded from the environment on first access.
pub struct RootKeyStore;

impl RootKeyStore {
    /// Returns the process root key.
    ///
    /// The environment is read exactly once, even under concurrent first
    /// access. A failed load is cached as well: fix the configuration and
    /// restart.
    pub fn global() -> Result<Arc<RootKey>> {
        GLOBAL_ROOT_KEY
            .get_or_init(|| RootKey::from_env().map(Arc::new))
            .clone()
    }
}
