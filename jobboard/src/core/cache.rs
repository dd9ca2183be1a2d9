//! Cache-invalidation coordinator
//!
//! Two strategies share one store:
//!
//! - **Version tags** for search results. Each [`ResourceClass`] owns an
//!   integer counter; the current value is embedded in every search cache
//!   key. Bumping the counter orphans every cached result of that class at
//!   once, and orphans age out through their TTL.
//! - **Direct keys** for point entities such as a user profile. The key is
//!   derived from the entity id and deleted after every mutation.
//!
//! Invalidations must be issued only after the primary store committed.

use super::StoreError;
use super::store::KvStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::future::Future;
use std::time::Duration;

/// Default lifetime of a cached search result
pub const DEFAULT_SEARCH_TTL: Duration = Duration::from_secs(300);
/// Default lifetime of a cached point entity
pub const DEFAULT_POINT_TTL: Duration = Duration::from_secs(3600);

/// Where a value was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Cache,
    Db,
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheSource::Cache => f.write_str("cache"),
            CacheSource::Db => f.write_str("db"),
        }
    }
}

/// A value together with its [`CacheSource`]
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub source: CacheSource,
}

impl<T> Cached<T> {
    pub fn is_hit(&self) -> bool {
        self.source == CacheSource::Cache
    }
}

/// A family of searchable resources sharing one version counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceClass {
    /// Name used inside search cache keys
    pub name: &'static str,
    /// Store key of the version counter
    pub version_key: &'static str,
}

impl ResourceClass {
    pub const VACANCIES: ResourceClass = ResourceClass::new("vacancies", "vacancy_version");
    pub const RESUMES: ResourceClass = ResourceClass::new("resumes", "resume_version");

    pub const fn new(name: &'static str, version_key: &'static str) -> Self {
        Self { name, version_key }
    }
}

/// Canonical description of one search query
///
/// Parameters render in the order they were added. Absent values render as
/// the empty string so that "no filter" and "empty filter" share an entry.
///
/// # Example
///
/// ```
/// use jobboard::{ResourceClass, SearchKey};
///
/// let key = SearchKey::new(10, 0)
///     .param("q", Some("rust"))
///     .param("city", None::<&str>)
///     .render(ResourceClass::RESUMES, 3);
///
/// assert_eq!(key, "search:resumes:version:3_q:rust_city:_limit:10_offset:0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    params: Vec<(&'static str, String)>,
    limit: u64,
    offset: u64,
}

impl SearchKey {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            params: Vec::new(),
            limit,
            offset,
        }
    }

    pub fn param<V: ToString>(mut self, name: &'static str, value: Option<V>) -> Self {
        let value = value.map(|v| v.to_string()).unwrap_or_default();
        self.params.push((name, value));
        self
    }

    /// Full store key for this query at `version`
    pub fn render(&self, class: ResourceClass, version: i64) -> String {
        let mut key = format!("search:{}:version:{version}", class.name);
        for (name, value) in &self.params {
            let _ = write!(key, "_{name}:{}", escape(value));
        }
        let _ = write!(key, "_limit:{}_offset:{}", self.limit, self.offset);
        key
    }
}

// Separator characters inside values would let two different queries
// render to the same key
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

/// Read-through cache over a [`KvStore`] with both invalidation strategies
///
/// # Example
///
/// ```
/// use jobboard::{CacheCoordinator, CacheSource, LocalStore, StoreError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), StoreError> {
/// let cache = CacheCoordinator::new(LocalStore::default());
/// let key = CacheCoordinator::<LocalStore>::point_key("user", 1, "profile");
///
/// let first = cache.point(&key, || async { Ok::<_, StoreError>("Alice".to_string()) }).await?;
/// assert_eq!(first.source, CacheSource::Db);
///
/// let second = cache.point(&key, || async { Ok::<_, StoreError>("ignored".to_string()) }).await?;
/// assert_eq!(second.source, CacheSource::Cache);
/// assert_eq!(second.value, "Alice");
///
/// assert!(cache.invalidate_key(&key).await);
/// # Ok(())
/// # }
/// ```
pub struct CacheCoordinator<S> {
    store: S,
    search_ttl: Duration,
    point_ttl: Duration,
}

impl<S: KvStore> CacheCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttls(store, DEFAULT_SEARCH_TTL, DEFAULT_POINT_TTL)
    }

    pub fn with_ttls(store: S, search_ttl: Duration, point_ttl: Duration) -> Self {
        Self {
            store,
            search_ttl,
            point_ttl,
        }
    }

    /// Direct key of a point entity, e.g. `cache:user:42:profile`
    pub fn point_key(kind: &str, id: impl fmt::Display, facet: &str) -> String {
        format!("cache:{kind}:{id}:{facet}")
    }

    /// Current version of a class; a missing counter reads as 0
    pub async fn version(&self, class: ResourceClass) -> Result<i64, StoreError> {
        match self.store.get(class.version_key).await? {
            Some(raw) => raw.parse().map_err(|_| {
                StoreError::InvalidValue(format!(
                    "version counter {} holds {raw:?}",
                    class.version_key
                ))
            }),
            None => Ok(0),
        }
    }

    /// Bump the version counter of `class` by one
    ///
    /// Returns `false` if the store rejected the increment. The failure is
    /// logged; the caller's mutation has already committed and stands.
    pub async fn invalidate_class(&self, class: ResourceClass) -> bool {
        match self.store.incr(class.version_key).await {
            Ok(version) => {
                tracing::debug!(class = class.name, version, "search cache invalidated");
                true
            }
            Err(e) => {
                tracing::warn!(class = class.name, error = %e, "failed to bump version counter");
                false
            }
        }
    }

    /// Delete a point entity key
    ///
    /// Returns `false` only if the store failed; deleting a key that was
    /// never cached is a success.
    pub async fn invalidate_key(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(existed) => {
                tracing::debug!(key, existed, "cache key invalidated");
                true
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to delete cache key");
                false
            }
        }
    }

    /// Serve a search from the version-tagged cache, loading on a miss
    pub async fn search<T, E, F, Fut>(
        &self,
        class: ResourceClass,
        query: &SearchKey,
        loader: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let version = self.version(class).await?;
        let key = query.render(class, version);
        self.read_through(&key, self.search_ttl, loader).await
    }

    /// Serve a point entity from its direct key, loading on a miss
    pub async fn point<T, E, F, Fut>(&self, key: &str, loader: F) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.read_through(key, self.point_ttl, loader).await
    }

    async fn read_through<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(raw) = self.store.get(key).await? {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    return Ok(Cached {
                        value,
                        source: CacheSource::Cache,
                    });
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                }
            }
        }

        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => self.store.set(key, &raw, ttl).await?,
            Err(e) => tracing::warn!(key, error = %e, "value not cached, serialization failed"),
        }

        Ok(Cached {
            value,
            source: CacheSource::Db,
        })
    }

    pub fn search_ttl(&self) -> Duration {
        self.search_ttl
    }

    pub fn point_ttl(&self) -> Duration {
        self.point_ttl
    }
}
