//! Partitioned TTL cache.
//!
//! [`CacheStore`] is the raw key-value capability (in memory here, anything
//! networked can implement it too). [`CacheLayer`] sits on top of it and owns
//! the partition registry, the per-partition TTL policy, and JSON encoding of
//! cached values.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::CacheError;

/// Lifetime for partitions without an explicit policy entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

/// The partitions used by the weather and location services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    CurrentWeather,
    DailyForecast,
    HourlyForecast,
    LocationGeocode,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Self::CurrentWeather,
        Self::DailyForecast,
        Self::HourlyForecast,
        Self::LocationGeocode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CurrentWeather => "currentWeather",
            Self::DailyForecast => "dailyForecast",
            Self::HourlyForecast => "hourlyForecast",
            Self::LocationGeocode => "locationGeocode",
        }
    }

    pub fn default_ttl(self) -> Duration {
        match self {
            Self::CurrentWeather => Duration::from_secs(900),
            Self::DailyForecast => Duration::from_secs(3600),
            Self::HourlyForecast => Duration::from_secs(1800),
            Self::LocationGeocode => Duration::from_secs(86400),
        }
    }
}

/// Key for a coordinate pair: `"{lat}_{lon}"`.
///
/// Coordinates keep their shortest round-trip decimal form, never exponent
/// notation, with a trailing `.0` on whole numbers: `1.0` renders as `1.0`
/// and `0.00001` as `0.00001`. Coordinates that render the same share an entry.
pub fn coordinate_key(lat: f64, lon: f64) -> String {
    format!("{}_{}", decimal(lat), decimal(lon))
}

fn decimal(value: f64) -> String {
    let rendered = value.to_string();
    if value.is_finite() && !rendered.contains('.') {
        format!("{}.0", rendered)
    } else {
        rendered
    }
}

/// Key for a forecast: `"{lat}_{lon}_{horizon}"`.
pub fn forecast_key(lat: f64, lon: f64, horizon: u32) -> String {
    format!("{}_{}", coordinate_key(lat, lon), horizon)
}

/// Per-partition time-to-live table.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    default_ttl: Duration,
    ttls: BTreeMap<String, Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Partition::ALL
            .iter()
            .fold(Self::new(DEFAULT_TTL), |policy, p| {
                policy.with_ttl(p.name(), p.default_ttl())
            })
    }
}

impl CachePolicy {
    /// Policy with no configured partitions.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            ttls: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, partition: &str, ttl: Duration) -> Self {
        self.ttls.insert(partition.to_string(), ttl);
        self
    }

    pub fn ttl_for(&self, partition: &str) -> Duration {
        self.ttls.get(partition).copied().unwrap_or(self.default_ttl)
    }

    fn configured(&self) -> impl Iterator<Item = &str> {
        self.ttls.keys().map(String::as_str)
    }
}

/// Key-value store capability behind the cache layer.
///
/// Implementations must never return an entry once its TTL has elapsed, and
/// must make single-key reads and writes atomic.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// A name for logging.
    fn name(&self) -> &'static str;

    /// Returns the live value, or `None` for a miss or an expired entry.
    async fn get(&self, partition: &str, key: &str) -> Result<Option<String>, CacheError>;

    /// Inserts or overwrites a value, restarting its lifetime.
    async fn put(
        &self,
        partition: &str,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn delete_partition(&self, partition: &str) -> Result<(), CacheError>;

    async fn delete_all(&self) -> Result<(), CacheError>;

    /// Partitions currently holding at least one live entry.
    async fn list_partitions(&self) -> Result<Vec<String>, CacheError>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    inserted_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}

/// In-process store. Expiry runs on the tokio clock, so paused-time tests
/// can move it forward with `tokio::time::advance`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<String, HashMap<String, StoredEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn evict_expired(&self, partition: &str, key: &str) {
        let mut partitions = self.partitions.write();
        let now = Instant::now();
        if let Some(entries) = partitions.get_mut(partition) {
            // Another writer may have refreshed the entry in between
            if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                entries.remove(key);
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, partition: &str, key: &str) -> Result<Option<String>, CacheError> {
        let expired = {
            let partitions = self.partitions.read();
            match partitions.get(partition).and_then(|entries| entries.get(key)) {
                Some(entry) if entry.is_live(Instant::now()) => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.evict_expired(partition, key);
        }
        Ok(None)
    }

    async fn put(
        &self,
        partition: &str,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = StoredEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };
        self.partitions
            .write()
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<(), CacheError> {
        self.partitions.write().remove(partition);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), CacheError> {
        self.partitions.write().clear();
        Ok(())
    }

    async fn list_partitions(&self) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let partitions = self.partitions.read();
        let mut names: Vec<String> = partitions
            .iter()
            .filter(|(_, entries)| entries.values().any(|e| e.is_live(now)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Registry entry reported by [`CacheLayer::list_partitions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStatus {
    pub name: String,
    pub ttl_secs: u64,
    /// Whether the store currently holds live entries for this partition
    pub exists: bool,
}

/// Typed, policy-aware access to a [`CacheStore`].
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    policy: CachePolicy,
    registered: RwLock<BTreeSet<String>>,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, policy: CachePolicy) -> Self {
        let registered = policy.configured().map(str::to_string).collect();
        tracing::info!("Cache layer using {} store", store.name());
        Self {
            store,
            policy,
            registered: RwLock::new(registered),
        }
    }

    /// In-memory cache with the stock partition lifetimes.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), CachePolicy::default())
    }

    /// Look up a live value.
    ///
    /// An entry that no longer decodes as `T` is reported as a miss so the
    /// caller refetches and overwrites it.
    pub async fn get<T: DeserializeOwned>(
        &self,
        partition: &str,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.store.get(partition, key).await? else {
            tracing::debug!("Cache miss {}/{}", partition, key);
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!("Cache hit {}/{}", partition, key);
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!("Discarding undecodable entry {}/{}: {}", partition, key, e);
                Ok(None)
            }
        }
    }

    /// Insert or overwrite, resetting the entry's TTL to the partition's policy.
    pub async fn put<T: Serialize>(
        &self,
        partition: &str,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        let ttl = self.policy.ttl_for(partition);
        self.store.put(partition, key, raw, ttl).await?;

        let known = self.registered.read().contains(partition);
        if !known {
            self.registered.write().insert(partition.to_string());
        }
        Ok(())
    }

    /// Remove every entry of one partition.
    pub async fn clear(&self, partition: &str) -> Result<(), CacheError> {
        let known = self.registered.read().contains(partition);
        if !known {
            return Err(CacheError::PartitionNotFound(partition.to_string()));
        }
        self.store.delete_partition(partition).await?;
        tracing::info!("Cache '{}' cleared", partition);
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), CacheError> {
        self.store.delete_all().await?;
        tracing::info!("All caches cleared");
        Ok(())
    }

    /// Every registered partition with its TTL and whether the store holds it.
    pub async fn list_partitions(&self) -> Result<Vec<PartitionStatus>, CacheError> {
        let live: BTreeSet<String> = self.store.list_partitions().await?.into_iter().collect();
        let registered = self.registered.read().clone();

        Ok(registered
            .into_iter()
            .map(|name| PartitionStatus {
                ttl_secs: self.policy.ttl_for(&name).as_secs(),
                exists: live.contains(&name),
                name,
            })
            .collect())
    }
}
