//! Shared application state
//!
//! Everything a handler needs, constructed once in `main` and shared behind an
//! [`Arc`]. The store handle inside the limiter and the cache coordinator is
//! the same connection.

use crate::admission::FailurePolicy;
use crate::auth::{JwtKeys, PasswordHasher};
use crate::config::{AdminConfig, Config, EndpointLimits};
use crate::error::ApiError;
use crate::metrics::{CacheStrategy, Metrics};
use crate::repository::{RepoError, Repository};
use crate::store::SharedStore;
use crate::types::{CascadeSummary, NewUser, Profile, Role, UserPatch};
use jobboard::{CacheCoordinator, Cached, ResourceClass, SearchKey, SharedClock, SlidingWindowLimiter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub limiter: SlidingWindowLimiter<SharedStore>,
    pub cache: CacheCoordinator<SharedStore>,
    pub keys: JwtKeys,
    pub passwords: PasswordHasher,
    pub limits: EndpointLimits,
    pub failure_policy: FailurePolicy,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: &Config,
        repo: Arc<dyn Repository>,
        store: SharedStore,
        clock: SharedClock,
    ) -> Self {
        Self {
            repo,
            limiter: SlidingWindowLimiter::new(store.clone(), clock),
            cache: CacheCoordinator::with_ttls(
                store,
                config.cache.search_ttl,
                config.cache.profile_ttl,
            ),
            keys: JwtKeys::new(config.auth.jwt_secret.as_bytes(), config.auth.token_ttl),
            passwords: PasswordHasher::new(config.auth.password_cost),
            limits: config.limits,
            failure_policy: config.failure_policy,
            metrics: Metrics::new(),
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Direct cache key of a user's profile
    pub fn profile_key(user_id: i64) -> String {
        CacheCoordinator::<SharedStore>::point_key("user", user_id, "profile")
    }

    /// Read-through profile lookup
    pub async fn profile(&self, user_id: i64) -> Result<Cached<Profile>, ApiError> {
        let key = Self::profile_key(user_id);
        let repo = &self.repo;
        let cached = self
            .cache
            .point(&key, move || async move {
                match repo.user(user_id).await {
                    Ok(user) => Ok(user.profile()),
                    Err(RepoError::NotFound(_)) => Err(ApiError::not_found("User not found")),
                    Err(e) => Err(ApiError::from(e)),
                }
            })
            .await?;

        self.metrics
            .record_cache(CacheStrategy::Profile, cached.is_hit());
        Ok(cached)
    }

    /// Read-through search under the version tag of `class`
    pub async fn search<T, F, Fut>(
        &self,
        class: ResourceClass,
        key: &SearchKey,
        loader: F,
    ) -> Result<Cached<T>, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let cached = self.cache.search(class, key, loader).await?;
        self.metrics
            .record_cache(CacheStrategy::Search, cached.is_hit());
        Ok(cached)
    }

    /// Drop a user's cached profile after a committed change
    pub async fn invalidate_profile(&self, user_id: i64) {
        let ok = self.cache.invalidate_key(&Self::profile_key(user_id)).await;
        self.metrics.record_invalidation(ok);
    }

    /// Orphan every cached search of `class` after a committed change
    pub async fn bump(&self, class: ResourceClass) {
        let ok = self.cache.invalidate_class(class).await;
        self.metrics.record_invalidation(ok);
    }

    /// Bump the classes a cascade actually removed rows from
    pub async fn bump_cascade(&self, summary: CascadeSummary) {
        if summary.vacancies > 0 {
            self.bump(ResourceClass::VACANCIES).await;
        }
        if summary.resumes > 0 {
            self.bump(ResourceClass::RESUMES).await;
        }
    }

    /// Make sure the configured bootstrap admin exists
    ///
    /// An existing account with the same email is promoted and its password
    /// reset.
    pub async fn seed_admin(&self, admin: &AdminConfig) -> Result<(), ApiError> {
        let password_hash = self.passwords.hash(&admin.password).await?;

        match self.repo.user_by_email(&admin.email).await? {
            Some(user) => {
                self.repo
                    .update_user(
                        user.id,
                        UserPatch {
                            role: Some(Role::Admin),
                            password_hash: Some(password_hash),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.invalidate_profile(user.id).await;
                tracing::info!("Promoted existing account {} to admin", admin.email);
            }
            None => {
                self.repo
                    .create_user(NewUser {
                        email: admin.email.clone(),
                        password_hash,
                        role: Role::Admin,
                        name: admin.name.clone(),
                    })
                    .await?;
                tracing::info!("Created admin account {}", admin.email);
            }
        }

        Ok(())
    }
}
