//! Cache-backed aggregation over every registered provider
//!
//! Version and build lists are computed once per TTL and shared through the
//! cache; single builds and downloads always go to the provider, because the
//! upstream URL is never cached. The Java requirement is stamped onto every
//! record on the way out, hit or miss, so it always reflects the loaded rules.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::{Cache, keys};
use crate::error::{ProviderError, ServiceError};
use crate::java::JavaResolver;
use crate::models::{Build, CategoryInfo, ResolvedDownload, SearchResult, Version};
use crate::providers::{Provider, ProviderRegistry, primary_download};

pub mod filters;

pub use filters::{BuildFilter, BuildSelector, DateRange, LATEST, SearchOptions, VersionFilter};

pub struct JarsService {
    registry: ProviderRegistry,
    cache: Cache,
    java: Arc<JavaResolver>,
}

impl JarsService {
    pub fn new(registry: ProviderRegistry, cache: Cache, java: Arc<JavaResolver>) -> Self {
        Self {
            registry,
            cache,
            java,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Every registered category, sorted by display name
    pub fn categories(&self) -> Vec<CategoryInfo> {
        let mut categories: Vec<CategoryInfo> = self
            .registry
            .list()
            .map(|provider| CategoryInfo::new(provider.category(), provider.filters()))
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn category(&self, id: &str) -> Result<CategoryInfo, ServiceError> {
        let provider = self.registry.get(id)?;
        Ok(CategoryInfo::new(provider.category(), provider.filters()))
    }

    /// All versions of a category, newest first
    pub async fn versions(&self, category: &str) -> Result<Vec<Version>, ServiceError> {
        let provider = self.registry.get(category)?;
        self.versions_of(provider.as_ref()).await
    }

    pub async fn versions_filtered(
        &self,
        category: &str,
        filter: &VersionFilter,
    ) -> Result<Vec<Version>, ServiceError> {
        Ok(filter.apply(self.versions(category).await?))
    }

    /// Newest stable version, or the newest version if none is stable
    pub async fn latest_version(&self, category: &str) -> Result<Version, ServiceError> {
        let versions = self.versions(category).await?;
        let index = versions.iter().position(|v| v.stable).unwrap_or(0);
        versions
            .into_iter()
            .nth(index)
            .ok_or_else(|| ServiceError::NotFound(format!("{} has no versions", category)))
    }

    /// Resolve the `latest` sentinel; any other id is passed through unchanged
    pub async fn resolve_version(
        &self,
        category: &str,
        version: &str,
    ) -> Result<String, ServiceError> {
        if version.eq_ignore_ascii_case(LATEST) {
            let latest = self.latest_version(category).await?;
            debug!("Resolved {} latest to {}", category, latest.id);
            Ok(latest.id)
        } else {
            Ok(version.to_string())
        }
    }

    /// All builds of a version, highest number first; `version` may be `latest`
    pub async fn builds(&self, category: &str, version: &str) -> Result<Vec<Build>, ServiceError> {
        let provider = self.registry.get(category)?;
        let version = self.resolve_version(category, version).await?;
        let category = provider.category();

        let mut builds = self
            .cached(&keys::builds(category, &version), || {
                provider.list_builds(&version)
            })
            .await?;

        let java = self.java.resolve(&version, category);
        for build in &mut builds {
            build.java = java;
        }
        Ok(builds)
    }

    pub async fn builds_filtered(
        &self,
        category: &str,
        version: &str,
        filter: &BuildFilter,
    ) -> Result<Vec<Build>, ServiceError> {
        Ok(filter.apply(self.builds(category, version).await?))
    }

    /// One build; both `version` and the selector may name `latest`
    pub async fn build(
        &self,
        category: &str,
        version: &str,
        selector: BuildSelector,
    ) -> Result<Build, ServiceError> {
        let provider = self.registry.get(category)?;
        let version = self.resolve_version(category, version).await?;

        let mut build = match selector {
            BuildSelector::Latest => provider.get_latest_build(&version).await?,
            BuildSelector::Number(number) => provider.get_build(&version, number).await?,
        };
        build.java = self.java.resolve(&version, provider.category());
        Ok(build)
    }

    /// Upstream location of a build's primary file, for a streaming proxy
    pub async fn download(
        &self,
        category: &str,
        version: &str,
        selector: BuildSelector,
    ) -> Result<ResolvedDownload, ServiceError> {
        let provider = self.registry.get(category)?;
        let version = self.resolve_version(category, version).await?;

        let resolved = match selector {
            BuildSelector::Number(number) => provider.resolve_download_url(&version, number).await?,
            BuildSelector::Latest => primary_download(&provider.get_latest_build(&version).await?)?,
        };
        Ok(resolved)
    }

    /// Search versions across categories.
    ///
    /// Categories are fetched concurrently and concatenated in registration
    /// order. A category that fails to load contributes no results.
    pub async fn search(&self, options: &SearchOptions) -> Vec<SearchResult> {
        let providers: Vec<&Arc<dyn Provider>> = self
            .registry
            .list()
            .filter(|p| options.category.is_none_or(|c| p.category() == c))
            .collect();

        let per_category = join_all(providers.into_iter().map(|provider| async move {
            let category = provider.category();
            match self.versions_of(provider.as_ref()).await {
                Ok(versions) => versions
                    .into_iter()
                    .filter(|v| options.versions.matches(v) && options.matches_query(category, v))
                    .map(|v| SearchResult {
                        category,
                        version: v.id,
                        version_type: v.version_type,
                        stable: v.stable,
                        java: v.java,
                    })
                    .collect::<Vec<_>>(),
                Err(e) => {
                    warn!("Search skipped {}: {}", category, e);
                    Vec::new()
                }
            }
        }))
        .await;

        per_category.into_iter().flatten().collect()
    }

    /// Drop cached lists for a category, or for one of its versions
    pub async fn invalidate(
        &self,
        category: &str,
        version: Option<&str>,
    ) -> Result<(), ServiceError> {
        let category = self.registry.get(category)?.category();

        let key = match version {
            Some(version) => keys::builds(category, version),
            None => keys::versions(category),
        };

        if let Err(e) = self.cache.delete(&key).await {
            warn!("Failed to invalidate {}: {}", key, e);
        } else {
            info!("Invalidated {}", key);
        }
        Ok(())
    }

    async fn versions_of(&self, provider: &dyn Provider) -> Result<Vec<Version>, ServiceError> {
        let category = provider.category();

        let mut versions = self
            .cached(&keys::versions(category), || provider.list_versions())
            .await?;

        for version in &mut versions {
            version.java = self.java.resolve(&version.id, category);
        }
        Ok(versions)
    }

    /// Serve `key` from the cache or compute and store it.
    ///
    /// Cache failures never fail the request: a broken read is a miss and a
    /// broken write is dropped.
    async fn cached<T, F, Fut>(&self, key: &str, fetch: F) -> Result<Vec<T>, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ProviderError>>,
    {
        match self.cache.get::<Vec<T>>(key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for {}: {}", key, e),
        }

        let fresh = fetch().await?;

        if let Err(e) = self.cache.set(key, &fresh).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(fresh)
    }
}
