//! Retry, memoization, and fallback handling around the completion client.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::client::CompletionClient;
use crate::registry::Timeframe;

/// Maximum completion attempts per narrative.
const MAX_ATTEMPTS: u32 = 3;
/// Initial backoff; doubles after every failed attempt.
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(60);
/// Ceiling on accumulated backoff across one narrative request.
const MAX_TOTAL_WAIT: Duration = Duration::from_secs(600);
/// Courtesy pause after a successful completion.
const PACING_DELAY: Duration = Duration::from_secs(5);
/// Fixed memoization capacity.
const CACHE_CAPACITY: usize = 128;

/// Terminal result of the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeOutcome {
    /// Provider returned a narrative.
    Generated(String),
    /// Provider answered successfully but with no choices.
    Empty,
    /// Rate limiting exhausted the attempt or wait budget.
    RateLimitExhausted,
    /// Non-rate-limit failures exhausted the budget; carries the last error.
    ErrorExhausted(String),
}

impl NarrativeOutcome {
    /// Render the outcome as the narrative text stored with the town result.
    fn into_text(self) -> String {
        match self {
            NarrativeOutcome::Generated(text) => text,
            NarrativeOutcome::Empty => "Unable to generate analysis.".to_string(),
            NarrativeOutcome::RateLimitExhausted => {
                "Analysis unavailable: provider rate limit reached, please retry later."
                    .to_string()
            }
            NarrativeOutcome::ErrorExhausted(err) => format!("Error analyzing data: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    town: String,
    timeframe: Timeframe,
    fingerprint: String,
}

/// Bounded memoization map with least-recently-used eviction.
struct NarrativeCache {
    capacity: usize,
    entries: HashMap<CacheKey, String>,
    recency: VecDeque<CacheKey>,
}

impl NarrativeCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.recency.push_back(key.clone());
    }

    fn get(&mut self, key: &CacheKey) -> Option<String> {
        let value = self.entries.get(key).cloned()?;
        self.touch(key);
        Some(value)
    }

    fn insert(&mut self, key: CacheKey, value: String) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(evicted) = self.recency.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        self.touch(&key);
        self.entries.insert(key, value);
    }
}

/// Generates per-town narratives with retry/backoff and memoization.
///
/// A `None` client means narrative generation is administratively disabled:
/// every call returns a placeholder without touching the network.
pub struct NarrativeAnalyzer {
    client: Option<Arc<dyn CompletionClient>>,
    cache: Mutex<NarrativeCache>,
}

impl NarrativeAnalyzer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
            cache: Mutex::new(NarrativeCache::new(CACHE_CAPACITY)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            client: None,
            cache: Mutex::new(NarrativeCache::new(CACHE_CAPACITY)),
        }
    }

    /// Produce a narrative for a town's rendered intersection data.
    ///
    /// `fingerprint` identifies the rendered data; identical
    /// (town, timeframe, fingerprint) triples are served from the cache for
    /// the process lifetime.
    pub async fn analyze(
        &self,
        town: &str,
        timeframe: Timeframe,
        fingerprint: &str,
        rendered: &str,
    ) -> String {
        let Some(client) = &self.client else {
            return format!("AI narrative generation is disabled for {town}.");
        };

        let key = CacheKey {
            town: town.to_string(),
            timeframe,
            fingerprint: fingerprint.to_string(),
        };

        if let Some(cached) = self.cache.lock().await.get(&key) {
            debug!(town, %timeframe, "narrative cache hit");
            return cached;
        }

        let prompt = format!(
            "Analyze the following traffic data for congestion trends and provide \
             recommendations for traffic optimization:\n{rendered}"
        );

        let outcome = request_with_retry(client.as_ref(), town, &prompt).await;
        let narrative = outcome.into_text();
        self.cache.lock().await.insert(key, narrative.clone());
        narrative
    }
}

/// Explicit retry loop over the completion client.
///
/// Attempts are bounded by [`MAX_ATTEMPTS`]; accumulated backoff is bounded
/// by [`MAX_TOTAL_WAIT`]. Either budget terminates the loop.
async fn request_with_retry(
    client: &dyn CompletionClient,
    town: &str,
    prompt: &str,
) -> NarrativeOutcome {
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut total_wait = Duration::ZERO;

    for attempt in 1..=MAX_ATTEMPTS {
        match client.complete(prompt).await {
            Ok(completion) => {
                // Pacing pause so back-to-back towns don't hammer the provider.
                tokio::time::sleep(PACING_DELAY).await;
                return match completion.content {
                    Some(text) => {
                        info!(town, attempt, "narrative generated");
                        NarrativeOutcome::Generated(text)
                    }
                    None => {
                        warn!(town, "provider returned no choices");
                        NarrativeOutcome::Empty
                    }
                };
            }
            Err(err) if err.is_rate_limited() => {
                warn!(town, attempt, "completion rate limited");
                if attempt == MAX_ATTEMPTS || total_wait >= MAX_TOTAL_WAIT {
                    return NarrativeOutcome::RateLimitExhausted;
                }
                tokio::time::sleep(retry_delay).await;
                total_wait += retry_delay;
                retry_delay *= 2;
            }
            Err(err) => {
                error!(town, attempt, error = %err, "completion request failed");
                if attempt == MAX_ATTEMPTS || total_wait >= MAX_TOTAL_WAIT {
                    return NarrativeOutcome::ErrorExhausted(err.message);
                }
                tokio::time::sleep(retry_delay).await;
                total_wait += retry_delay;
                retry_delay *= 2;
            }
        }
    }

    NarrativeOutcome::ErrorExhausted("retry budget exhausted".to_string())
}
