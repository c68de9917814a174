//! Signing-key retrieval and caching.
//!
//! The identity provider publishes its keys as a JWK set. Keys rotate rarely,
//! so the set is cached for a long time; an unseen key id triggers a refresh,
//! but remote fetches are capped per rolling minute so a flood of tokens with
//! bogus key ids cannot turn into a flood of outbound requests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::AuthError;

/// Where signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// Key set served over HTTPS by the trust domain.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// `https://<domain>/cdn-cgi/access/certs`
    pub fn for_team_domain(team_domain: &str) -> Self {
        Self::new(format!("https://{}/cdn-cgi/access/certs", team_domain.trim_end_matches('/')))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let res = self
            .client
            .get(&self.url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !res.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "{} returned {}",
                self.url,
                res.status()
            )));
        }

        res.json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))
    }
}

/// Cache lifetime and refresh budget.
#[derive(Debug, Clone, Copy)]
pub struct KeyCachePolicy {
    pub max_age: Duration,
    pub max_fetches_per_minute: usize,
}

impl Default for KeyCachePolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 60 * 60),
            max_fetches_per_minute: 10,
        }
    }
}

#[derive(Default)]
struct CacheState {
    keys: Option<JwkSet>,
    fetched_at: Option<Instant>,
    recent_fetches: VecDeque<Instant>,
}

impl CacheState {
    fn find(&self, kid: &str) -> Option<Jwk> {
        self.keys.as_ref().and_then(|set| set.find(kid)).cloned()
    }

    fn is_fresh(&self, max_age: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < max_age)
    }

    fn take_fetch_budget(&mut self, now: Instant, per_minute: usize) -> bool {
        while let Some(&oldest) = self.recent_fetches.front() {
            if now.duration_since(oldest) >= Duration::from_secs(60) {
                self.recent_fetches.pop_front();
            } else {
                break;
            }
        }
        if self.recent_fetches.len() >= per_minute {
            return false;
        }
        self.recent_fetches.push_back(now);
        true
    }
}

/// Rate-limited, long-lived cache in front of a [`KeySource`].
///
/// The lock is held across the fetch, so concurrent misses wait for one
/// refresh instead of each issuing their own.
pub struct KeyCache {
    source: Arc<dyn KeySource>,
    policy: KeyCachePolicy,
    state: Mutex<CacheState>,
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySource>, policy: KeyCachePolicy) -> Self {
        Self {
            source,
            policy,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Look up the key with id `kid`, refreshing the set when it is stale or
    /// does not contain that id and the fetch budget allows it.
    pub async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        let mut state = self.state.lock().await;

        if state.is_fresh(self.policy.max_age) {
            if let Some(jwk) = state.find(kid) {
                return Ok(jwk);
            }
        }

        let now = Instant::now();
        if !state.take_fetch_budget(now, self.policy.max_fetches_per_minute) {
            debug!(kid, "signing key refresh budget exhausted; using cached keys");
            return state.find(kid).ok_or_else(|| AuthError::UnknownKey(kid.to_string()));
        }

        match self.source.fetch().await {
            Ok(set) => {
                debug!(keys = set.keys.len(), "refreshed signing keys");
                state.keys = Some(set);
                state.fetched_at = Some(now);
            }
            Err(e) => {
                warn!(error = %e, "signing key refresh failed");
                return Err(e);
            }
        }

        state.find(kid).ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}
