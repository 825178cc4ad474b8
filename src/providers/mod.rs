//! Upstream sources and the capability contract they share
//!
//! Every provider turns one upstream API shape into the normalized
//! [`Version`] / [`Build`] model:
//!
//! | Provider             | Upstream                    | Categories                          |
//! |----------------------|-----------------------------|-------------------------------------|
//! | [`VanillaProvider`]  | Mojang version manifest     | vanilla                             |
//! | [`FillProvider`]     | PaperMC Fill v3             | paper, folia, velocity, waterfall   |
//! | [`PurpurProvider`]   | Purpur v2                   | purpur                              |
//! | [`BungeeCordProvider`] | md-5 Jenkins              | bungeecord                          |

#[cfg(test)]
use mockall::automock;

use crate::error::ProviderError;
use crate::models::{Build, Category, CategoryFilters, ResolvedDownload, Version};

pub mod bungeecord;
pub mod enrich;
pub mod fill;
pub mod http;
pub mod purpur;
pub mod registry;
pub mod vanilla;

pub use bungeecord::BungeeCordProvider;
pub use fill::{FillProject, FillProvider};
pub use http::UpstreamClient;
pub use purpur::PurpurProvider;
pub use registry::ProviderRegistry;
pub use vanilla::VanillaProvider;

/// Capability contract implemented once per upstream family
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Category this provider serves
    fn category(&self) -> Category;

    /// Stable identifier, equal to the category id
    fn id(&self) -> &'static str {
        self.category().as_str()
    }

    fn name(&self) -> &'static str {
        self.category().display_name()
    }

    /// Filters this category supports; release versions only, no channels
    fn filters(&self) -> CategoryFilters {
        CategoryFilters::default()
    }

    /// All versions, newest first
    async fn list_versions(&self) -> Result<Vec<Version>, ProviderError>;

    /// All builds of `version`, highest number first
    ///
    /// # Returns
    /// * `Err(ProviderError::NotFound)` - the version is unknown upstream
    async fn list_builds(&self, version: &str) -> Result<Vec<Build>, ProviderError>;

    async fn get_build(&self, version: &str, number: u32) -> Result<Build, ProviderError> {
        self.list_builds(version)
            .await?
            .into_iter()
            .find(|b| b.number == number)
            .ok_or_else(|| build_not_found(self.category(), version, number))
    }

    /// First stable build in listing order, else the first build overall
    async fn get_latest_build(&self, version: &str) -> Result<Build, ProviderError> {
        let builds = self.list_builds(version).await?;
        select_latest(builds).ok_or_else(|| no_builds(self.category(), version))
    }

    /// Upstream location of the build's primary file
    async fn resolve_download_url(
        &self,
        version: &str,
        number: u32,
    ) -> Result<ResolvedDownload, ProviderError> {
        let build = self.get_build(version, number).await?;
        primary_download(&build)
    }
}

/// Pick the build `get_latest_build` answers with from a newest-first list
pub fn select_latest(builds: Vec<Build>) -> Option<Build> {
    let stable = builds.iter().position(|b| b.stable).unwrap_or(0);
    builds.into_iter().nth(stable)
}

pub(crate) fn primary_download(build: &Build) -> Result<ResolvedDownload, ProviderError> {
    build
        .downloads
        .first()
        .map(ResolvedDownload::from)
        .ok_or_else(|| ProviderError::NoDownloadAvailable {
            version: build.version.clone(),
            build: build.number,
        })
}

pub(crate) fn version_not_found(category: Category, version: &str) -> ProviderError {
    ProviderError::NotFound(format!("{} version {}", category, version))
}

pub(crate) fn build_not_found(category: Category, version: &str, number: u32) -> ProviderError {
    ProviderError::NotFound(format!("{} {} build {}", category, version, number))
}

pub(crate) fn no_builds(category: Category, version: &str) -> ProviderError {
    ProviderError::NotFound(format!("{} {} has no builds", category, version))
}
