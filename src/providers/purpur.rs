//! Purpur v2 API

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::models::{Build, Category, CategoryFilters, Change, Download, Version, VersionType};
use crate::providers::enrich::{VersionMeta, apply_version_meta, fan_out, sort_by_release_time};
use crate::providers::http::{UpstreamClient, encode_path_segment, path_segment};
use crate::providers::{Provider, build_not_found, no_builds, select_latest, version_not_found};

/// Default base URL for the Purpur API
pub const DEFAULT_BASE_URL: &str = "https://api.purpurmc.org/v2/purpur";

/// Result Purpur reports for a build that produced a jar
const SUCCESS: &str = "SUCCESS";

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    builds: BuildsInfo,
}

#[derive(Debug, Deserialize)]
struct BuildsInfo {
    #[serde(default)]
    latest: Option<String>,
    #[serde(default)]
    all: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BuildResponse {
    #[serde(default)]
    result: String,
    /// Milliseconds since the epoch
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    commits: Vec<Commit>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hash: Option<String>,
}

pub struct PurpurProvider {
    client: UpstreamClient,
    base_url: String,
}

impl PurpurProvider {
    /// Creates a new PurpurProvider with a custom base URL
    pub fn new(base_url: &str, client: UpstreamClient) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_default_url(client: UpstreamClient) -> Self {
        Self::new(DEFAULT_BASE_URL, client)
    }

    fn version_url(&self, version: &str) -> Result<String, ProviderError> {
        let segment =
            path_segment(version).ok_or_else(|| version_not_found(Category::Purpur, version))?;
        Ok(format!("{}/{}", self.base_url, segment))
    }

    async fn fetch_version(&self, version: &str) -> Result<VersionResponse, ProviderError> {
        self.client
            .get_json(&self.version_url(version)?)
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => version_not_found(Category::Purpur, version),
                other => other,
            })
    }

    async fn fetch_build(&self, version: &str, number: u32) -> Result<BuildResponse, ProviderError> {
        self.client
            .get_json(&format!("{}/{}", self.version_url(version)?, number))
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => build_not_found(Category::Purpur, version, number),
                other => other,
            })
    }

    /// Release time of a version is the time of its latest build
    async fn version_meta(&self, version: String) -> Option<VersionMeta> {
        let latest = match self.fetch_version(&version).await {
            Ok(response) => response.builds.latest.and_then(|b| b.parse::<u32>().ok())?,
            Err(e) => {
                debug!("Failed to enrich purpur {}: {}", version, e);
                return None;
            }
        };

        match self.fetch_build(&version, latest).await {
            Ok(build) => Some(VersionMeta {
                release_time: from_millis(build.timestamp),
                stable: None,
            }),
            Err(e) => {
                debug!("Failed to enrich purpur {} build {}: {}", version, latest, e);
                None
            }
        }
    }

    fn download(&self, version: &str, number: u32) -> Download {
        Download::new(
            format!("purpur-{}-{}.jar", version, number),
            format!(
                "{}/{}/{}/download",
                self.base_url,
                encode_path_segment(version),
                number
            ),
        )
    }

    fn to_build(&self, version: &str, number: u32, response: Option<BuildResponse>) -> Build {
        let mut build = Build::new(number, version);
        build.downloads.push(self.download(version, number));

        match response {
            Some(response) => {
                build.stable = response.result == SUCCESS;
                build.channel = Some(response.result).filter(|r| !r.is_empty());
                build.created_at = from_millis(response.timestamp);
                build.changes = response
                    .commits
                    .into_iter()
                    .map(|c| Change {
                        commit: c.hash,
                        summary: c.description,
                        author: c.author,
                    })
                    .collect();
            }
            // Listed builds are assumed good when their details are unavailable
            None => build.stable = true,
        }

        build
    }
}

#[async_trait::async_trait]
impl Provider for PurpurProvider {
    fn category(&self) -> Category {
        Category::Purpur
    }

    fn filters(&self) -> CategoryFilters {
        CategoryFilters {
            channels: vec![SUCCESS.to_string(), "FAILURE".to_string()],
            ..CategoryFilters::default()
        }
    }

    async fn list_versions(&self) -> Result<Vec<Version>, ProviderError> {
        let project: ProjectResponse = self.client.get_json(&self.base_url).await?;

        // Upstream lists oldest first
        let mut seen = HashSet::new();
        let mut versions: Vec<Version> = project
            .versions
            .into_iter()
            .rev()
            .filter(|id| seen.insert(id.clone()))
            .map(|id| Version::new(id, VersionType::Release))
            .collect();

        let ids: Vec<String> = versions.iter().map(|v| v.id.clone()).collect();
        let metas = fan_out(ids, self.client.max_concurrent_fetches(), |id| {
            self.version_meta(id)
        })
        .await;

        apply_version_meta(&mut versions, metas);
        sort_by_release_time(&mut versions);

        Ok(versions)
    }

    async fn list_builds(&self, version: &str) -> Result<Vec<Build>, ProviderError> {
        let response = self.fetch_version(version).await?;

        let numbers: Vec<u32> = response
            .builds
            .all
            .iter()
            .filter_map(|b| match b.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("Skipping purpur {} build with invalid number {:?}", version, b);
                    None
                }
            })
            .collect();

        let mut builds = fan_out(numbers, self.client.max_concurrent_fetches(), |number| async move {
            let details = self
                .fetch_build(version, number)
                .await
                .inspect_err(|e| debug!("Failed to fetch purpur {} build {}: {}", version, number, e))
                .ok();
            self.to_build(version, number, details)
        })
        .await;

        builds.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(builds)
    }

    async fn get_build(&self, version: &str, number: u32) -> Result<Build, ProviderError> {
        let response = self.fetch_build(version, number).await?;
        Ok(self.to_build(version, number, Some(response)))
    }

    async fn get_latest_build(&self, version: &str) -> Result<Build, ProviderError> {
        let response = self.fetch_version(version).await?;

        if let Some(latest) = response.builds.latest.and_then(|b| b.parse::<u32>().ok()) {
            let build = self.get_build(version, latest).await?;
            if build.stable {
                return Ok(build);
            }
            debug!("purpur {} build {} failed, scanning all builds", version, latest);
        }

        select_latest(self.list_builds(version).await?)
            .ok_or_else(|| no_builds(Category::Purpur, version))
    }
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}
