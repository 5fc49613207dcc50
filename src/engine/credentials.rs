//! Device credential verification with a decaying cache in front.
//!
//! A verified secret is remembered for a bounded number of checks and a
//! bounded time, after which the authority is consulted again.

use log::debug;

use crate::cache::DecayingCache;
use crate::config::CacheConfig;
use crate::error::{HotspotError, Result};

/// Authoritative (slow) credential check, e.g. a hashed-secret lookup.
pub trait CredentialAuthority: Send + Sync {
    fn verify(&self, device_id: &str, secret: &str) -> Result<bool>;
}

/// Verifier memoizing successful checks.
pub struct CredentialVerifier<A> {
    authority: A,
    cache: DecayingCache<String, String>,
}

impl<A: CredentialAuthority> CredentialVerifier<A> {
    pub fn new(authority: A, config: &CacheConfig) -> Self {
        Self::with_cache(authority, DecayingCache::from_config(config))
    }

    pub fn with_cache(authority: A, cache: DecayingCache<String, String>) -> Self {
        Self { authority, cache }
    }

    /// Accept or reject `secret` for `device_id`.
    ///
    /// A cached secret that differs is rejected outright; a cache miss falls
    /// back to the authority and caches the secret on success.
    pub fn verify(&self, device_id: &str, secret: &str) -> Result<()> {
        match self.cache.get(&device_id.to_string()) {
            Some(cached) if cached == secret => return Ok(()),
            Some(_) => return Err(invalid_credentials()),
            None => {}
        }

        debug!("[Credentials] Cache miss for device {}", device_id);
        if self.authority.verify(device_id, secret)? {
            self.cache.set(device_id.to_string(), secret.to_string());
            Ok(())
        } else {
            Err(invalid_credentials())
        }
    }

    /// Drop any cached secret for a device (e.g. after it changed).
    pub fn forget(&self, device_id: &str) {
        self.cache.expire(&device_id.to_string());
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }
}

fn invalid_credentials() -> HotspotError {
    HotspotError::NotAuthorized("the credentials given are invalid".to_string())
}
