//! # Remediation Service
//!
//! Cache, circuit breaker, retry and bounded concurrency around a
//! `CompletionBackend`.
//!
//! The breaker is shared by every caller of one service. Once open it rejects
//! requests until `breaker_cooldown` has passed, then lets a single trial
//! request through: success closes it, failure opens it for another cooldown.

use super::{CompletionBackend, RemediationError};
use crate::config::GenerativeConfig;
use posture_core::{Priority, Recommendation, RemediationKey, parse_reply};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Largest backoff exponent; delays stop doubling after this many retries.
const MAX_BACKOFF_SHIFT: u32 = 16;

// =============================================================================
// POLICY
// =============================================================================

/// Resilience settings for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
    pub concurrency: usize,
    pub breaker_threshold: u32,
    /// How long an open breaker rejects requests before a trial request.
    pub breaker_cooldown: Duration,
    /// Maximum cached recommendations; the oldest are evicted first. 0 disables the cache.
    pub cache_capacity: usize,
}

impl ServicePolicy {
    /// Delay before retry number `attempt` (0-based): `backoff * 2^attempt`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_SHIFT))
    }
}

impl From<&GenerativeConfig> for ServicePolicy {
    fn from(config: &GenerativeConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            backoff: config.backoff(),
            concurrency: config.concurrency.max(1),
            breaker_threshold: config.breaker_threshold,
            breaker_cooldown: config.breaker_cooldown(),
            cache_capacity: config.cache_capacity,
        }
    }
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self::from(&GenerativeConfig::default())
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Recommendations by key, bounded, evicting in insertion order.
#[derive(Debug)]
struct RecommendationCache {
    entries: BTreeMap<RemediationKey, Recommendation>,
    order: VecDeque<RemediationKey>,
    capacity: usize,
}

impl RecommendationCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, key: &RemediationKey) -> Option<&Recommendation> {
        self.entries.get(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Store `recommendation` unless `key` is already cached; returns the cached value.
    fn insert(&mut self, key: &RemediationKey, recommendation: Recommendation) -> Recommendation {
        if let Some(existing) = self.entries.get(key) {
            return existing.clone();
        }
        if self.capacity == 0 {
            return recommendation;
        }

        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key.clone(), recommendation.clone());
        recommendation
    }
}

// =============================================================================
// CIRCUIT BREAKER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// How a request got past the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Closed,
    Trial,
}

// =============================================================================
// SERVICE
// =============================================================================

/// Generated remediation with safe fallbacks.
pub struct RemediationService<B> {
    backend: B,
    policy: ServicePolicy,
    cache: Mutex<RecommendationCache>,
    consecutive_failures: AtomicU32,
    /// Milliseconds after `epoch` at which the breaker last opened.
    opened_at_ms: AtomicU64,
    trial_in_flight: AtomicBool,
    epoch: Instant,
    permits: Arc<Semaphore>,
}

impl<B: CompletionBackend> RemediationService<B> {
    #[must_use]
    pub fn new(backend: B, policy: ServicePolicy) -> Self {
        Self {
            backend,
            permits: Arc::new(Semaphore::new(policy.concurrency.max(1))),
            cache: Mutex::new(RecommendationCache::new(policy.cache_capacity)),
            policy,
            consecutive_failures: AtomicU32::new(0),
            opened_at_ms: AtomicU64::new(0),
            trial_in_flight: AtomicBool::new(false),
            epoch: Instant::now(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ServicePolicy {
        &self.policy
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the breaker currently rejects every request.
    #[must_use]
    pub fn circuit_open(&self) -> bool {
        self.breaker_state() == BreakerState::Open
    }

    /// Number of cached recommendations.
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Recommendation for one key. Never fails.
    pub async fn recommend(&self, key: &RemediationKey) -> Recommendation {
        if let Some(hit) = self.cache.lock().await.get(key) {
            tracing::debug!(control = %key.control, "Remediation cache hit");
            return hit.clone();
        }

        let outcome = match self.admit() {
            Ok(admission) => {
                let outcome = self.request(key).await;
                if admission == Admission::Trial {
                    self.trial_in_flight.store(false, Ordering::SeqCst);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(recommendation) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                self.cache.lock().await.insert(key, recommendation)
            }
            Err(e) => {
                if !matches!(e, RemediationError::CircuitOpen(_)) {
                    self.record_failure();
                }
                tracing::warn!(
                    event = "remediation_fallback",
                    control = %key.control,
                    domain = %key.domain,
                    error = %e,
                    "Generated remediation failed, using fallback"
                );
                Recommendation::fallback(e)
            }
        }
    }

    /// Recommendations for many keys, in input order.
    ///
    /// Identical keys are requested once. At most `policy.concurrency`
    /// requests are in flight.
    pub async fn recommend_all(self: &Arc<Self>, keys: &[RemediationKey]) -> Vec<Recommendation> {
        let mut positions: BTreeMap<&RemediationKey, Vec<usize>> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            positions.entry(key).or_default().push(i);
        }

        let mut tasks = JoinSet::new();
        for (slot, key) in positions.keys().enumerate() {
            let service = Arc::clone(self);
            let permits = Arc::clone(&self.permits);
            let key = (*key).clone();
            tasks.spawn(async move {
                let recommendation = match permits.acquire_owned().await {
                    Ok(_permit) => service.recommend(&key).await,
                    Err(e) => Recommendation::fallback(e),
                };
                (slot, recommendation)
            });
        }

        let mut unique: Vec<Option<Recommendation>> = vec![None; positions.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, recommendation)) => {
                    if let Some(entry) = unique.get_mut(slot) {
                        *entry = Some(recommendation);
                    }
                }
                Err(e) => tracing::error!("Remediation task failed: {}", e),
            }
        }

        let mut results = vec![None; keys.len()];
        for (recommendation, indices) in unique.into_iter().zip(positions.into_values()) {
            let recommendation =
                recommendation.unwrap_or_else(|| Recommendation::fallback("task aborted"));
            for i in indices {
                results[i] = Some(recommendation.clone());
            }
        }
        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Recommendation::fallback("task aborted")))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Breaker
    // -------------------------------------------------------------------------

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn breaker_state(&self) -> BreakerState {
        let threshold = self.policy.breaker_threshold;
        if threshold == 0 || self.consecutive_failures.load(Ordering::SeqCst) < threshold {
            return BreakerState::Closed;
        }
        let cooldown_ms =
            u64::try_from(self.policy.breaker_cooldown.as_millis()).unwrap_or(u64::MAX);
        let open_for = self
            .now_ms()
            .saturating_sub(self.opened_at_ms.load(Ordering::SeqCst));
        if open_for >= cooldown_ms {
            BreakerState::HalfOpen
        } else {
            BreakerState::Open
        }
    }

    /// Let a request through the breaker, or reject it.
    fn admit(&self) -> Result<Admission, RemediationError> {
        let rejected =
            || RemediationError::CircuitOpen(self.consecutive_failures.load(Ordering::SeqCst));
        match self.breaker_state() {
            BreakerState::Closed => Ok(Admission::Closed),
            BreakerState::Open => Err(rejected()),
            BreakerState::HalfOpen => {
                if self.trial_in_flight.swap(true, Ordering::SeqCst) {
                    Err(rejected())
                } else {
                    tracing::info!("Circuit breaker half-open, sending trial request");
                    Ok(Admission::Trial)
                }
            }
        }
    }

    /// Count a failure; reaching the threshold (re)opens the breaker.
    fn record_failure(&self) {
        let failures = self
            .consecutive_failures
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        let threshold = self.policy.breaker_threshold;
        if threshold > 0 && failures >= threshold {
            self.opened_at_ms.store(self.now_ms(), Ordering::SeqCst);
            if failures == threshold {
                tracing::warn!(failures, "Circuit breaker opened");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// One key through the retry loop.
    async fn request(&self, key: &RemediationKey) -> Result<Recommendation, RemediationError> {
        let mut attempt = 0;
        loop {
            match self.attempt(key).await {
                Ok(recommendation) => return Ok(recommendation),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::debug!(
                        control = %key.control,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying completion request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, key: &RemediationKey) -> Result<Recommendation, RemediationError> {
        let reply = tokio::time::timeout(self.policy.timeout, self.backend.complete(key.prompt()))
            .await
            .map_err(|_| RemediationError::Timeout(self.policy.timeout))??;

        let parsed = parse_reply(&reply);
        let recommendation = Recommendation::from_reply(&parsed).ok_or_else(|| {
            RemediationError::Malformed("reply has no Recommendation line".to_string())
        })?;

        if Priority::parse_loose(&parsed.priority).is_none() {
            tracing::info!(
                control = %key.control,
                priority = %parsed.priority,
                "Unrecognized generated priority, using {}",
                recommendation.priority
            );
        }
        Ok(recommendation)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::{Domain, RecommendationSource, Score};

    #[test]
    fn backoff_doubles() {
        let policy = ServicePolicy {
            backoff: Duration::from_millis(250),
            ..ServicePolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1_000));
    }

    #[test]
    fn backoff_saturates() {
        let policy = ServicePolicy {
            backoff: Duration::MAX,
            ..ServicePolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::MAX);
    }

    #[test]
    fn policy_from_config() {
        let config = GenerativeConfig {
            concurrency: 0,
            ..GenerativeConfig::default()
        };
        let policy = ServicePolicy::from(&config);
        assert_eq!(policy.concurrency, 1);
        assert_eq!(policy.timeout, Duration::from_secs(30));
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.breaker_threshold, 5);
        assert_eq!(policy.breaker_cooldown, Duration::from_secs(30));
        assert_eq!(policy.cache_capacity, 1_024);
    }

    fn rec(text: &str) -> Recommendation {
        Recommendation {
            text: text.to_string(),
            priority: Priority::Delegate,
            source: RecommendationSource::Generated,
        }
    }

    fn key(control: &str) -> RemediationKey {
        RemediationKey::new(control, Domain::AccessControl, Score(48))
    }

    #[test]
    fn cache_evicts_oldest_first() {
        let mut cache = RecommendationCache::new(2);
        cache.insert(&key("A"), rec("a"));
        cache.insert(&key("B"), rec("b"));
        cache.insert(&key("C"), rec("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("A")).is_none());
        assert_eq!(cache.get(&key("C")), Some(&rec("c")));
    }

    #[test]
    fn cache_keeps_first_value_for_a_key() {
        let mut cache = RecommendationCache::new(2);
        cache.insert(&key("A"), rec("first"));
        let kept = cache.insert(&key("A"), rec("second"));

        assert_eq!(kept, rec("first"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.order.len(), 1);
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let mut cache = RecommendationCache::new(0);
        assert_eq!(cache.insert(&key("A"), rec("a")), rec("a"));
        assert_eq!(cache.len(), 0);
    }
}
