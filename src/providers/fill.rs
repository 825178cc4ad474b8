//! PaperMC Fill v3 API (paper, folia, velocity, waterfall)

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::compare::sort_newest_first;
use crate::error::ProviderError;
use crate::models::{Build, Category, CategoryFilters, Change, Download, Version, VersionType};
use crate::providers::enrich::{VersionMeta, apply_version_meta, fan_out, sort_by_release_time};
use crate::providers::http::{UpstreamClient, path_segment};
use crate::providers::{Provider, version_not_found};

/// Default base URL for the Fill API
pub const DEFAULT_BASE_URL: &str = "https://fill.papermc.io/v3";

/// Download keys tried after the project's own key
const FALLBACK_DOWNLOAD_KEYS: &[&str] = &["server:default", "proxy:default"];

/// Static description of one Fill project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillProject {
    /// Project id in Fill URLs
    pub id: &'static str,
    pub category: Category,
    /// Build channels counted as stable
    pub stable_channels: &'static [&'static str],
    /// Key of the primary file in a build's `downloads` map
    pub download_key: &'static str,
    /// Version types the project publishes
    pub version_types: &'static [VersionType],
}

/// Channel vocabulary of Fill builds, least stable first
const CHANNELS: &[&str] = &["ALPHA", "BETA", "STABLE", "RECOMMENDED"];

const STABLE_CHANNELS: &[&str] = &["STABLE", "RECOMMENDED"];

const RELEASES_AND_SNAPSHOTS: &[VersionType] = &[VersionType::Release, VersionType::Snapshot];

impl FillProject {
    pub const PAPER: FillProject = FillProject {
        id: "paper",
        category: Category::Paper,
        stable_channels: STABLE_CHANNELS,
        download_key: "server:default",
        version_types: RELEASES_AND_SNAPSHOTS,
    };

    pub const FOLIA: FillProject = FillProject {
        id: "folia",
        category: Category::Folia,
        stable_channels: STABLE_CHANNELS,
        download_key: "server:default",
        version_types: RELEASES_AND_SNAPSHOTS,
    };

    pub const VELOCITY: FillProject = FillProject {
        id: "velocity",
        category: Category::Velocity,
        stable_channels: STABLE_CHANNELS,
        download_key: "proxy:default",
        version_types: &[VersionType::Snapshot],
    };

    pub const WATERFALL: FillProject = FillProject {
        id: "waterfall",
        category: Category::Waterfall,
        stable_channels: STABLE_CHANNELS,
        download_key: "proxy:default",
        version_types: RELEASES_AND_SNAPSHOTS,
    };

    fn is_stable_channel(&self, channel: &str) -> bool {
        self.stable_channels
            .iter()
            .any(|c| c.eq_ignore_ascii_case(channel))
    }
}

/// Response from `/projects/{project}/versions`
#[derive(Debug, Deserialize)]
struct FillVersionsResponse {
    versions: Vec<FillVersionEntry>,
}

#[derive(Debug, Deserialize)]
struct FillVersionEntry {
    version: FillVersionInfo,
}

#[derive(Debug, Deserialize)]
struct FillVersionInfo {
    id: String,
    #[serde(default)]
    support: Option<FillSupport>,
}

#[derive(Debug, Deserialize)]
struct FillSupport {
    status: String,
}

/// One element of `/projects/{project}/versions/{version}/builds`
#[derive(Debug, Deserialize)]
struct FillBuild {
    id: u32,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    downloads: HashMap<String, FillDownload>,
    #[serde(default)]
    changes: Vec<FillChange>,
}

#[derive(Debug, Deserialize)]
struct FillDownload {
    url: String,
    #[serde(default)]
    checksums: Option<FillChecksums>,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FillChecksums {
    #[serde(default)]
    sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FillChange {
    #[serde(default)]
    commit: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Provider for every project served by the Fill API
pub struct FillProvider {
    project: FillProject,
    client: UpstreamClient,
    base_url: String,
}

impl FillProvider {
    /// Creates a new FillProvider with a custom base URL
    pub fn new(project: FillProject, base_url: &str, client: UpstreamClient) -> Self {
        Self {
            project,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_default_url(project: FillProject, client: UpstreamClient) -> Self {
        Self::new(project, DEFAULT_BASE_URL, client)
    }

    fn versions_url(&self) -> String {
        format!("{}/projects/{}/versions", self.base_url, self.project.id)
    }

    fn builds_url(&self, version: &str) -> Result<String, ProviderError> {
        let segment = path_segment(version)
            .ok_or_else(|| version_not_found(self.project.category, version))?;
        Ok(format!(
            "{}/projects/{}/versions/{}/builds",
            self.base_url, self.project.id, segment
        ))
    }

    async fn fetch_builds(&self, version: &str) -> Result<Vec<FillBuild>, ProviderError> {
        self.client
            .get_json(&self.builds_url(version)?)
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => version_not_found(self.project.category, version),
                other => other,
            })
    }

    /// Release time and stability of one version from its build list
    async fn version_meta(&self, version: String) -> Option<VersionMeta> {
        match self.fetch_builds(&version).await {
            Ok(builds) => Some(VersionMeta {
                release_time: builds.iter().filter_map(|b| parse_time(b.time.as_deref())).max(),
                stable: Some(
                    builds
                        .iter()
                        .any(|b| self.project.is_stable_channel(&b.channel)),
                ),
            }),
            Err(e) => {
                debug!(
                    "Failed to enrich {} {}: {}",
                    self.project.id, version, e
                );
                None
            }
        }
    }

    fn to_build(&self, version: &str, build: FillBuild) -> Build {
        let download = std::iter::once(self.project.download_key)
            .chain(FALLBACK_DOWNLOAD_KEYS.iter().copied())
            .find_map(|key| build.downloads.get(key))
            .map(|dl| {
                let sha256 = dl
                    .checksums
                    .as_ref()
                    .and_then(|c| c.sha256.clone())
                    .or_else(|| dl.sha256.clone());
                Download::new(
                    format!("{}-{}-{}.jar", self.project.id, version, build.id),
                    dl.url.clone(),
                )
                .with_sha256(sha256)
                .with_size(dl.size)
            });

        let changes = build
            .changes
            .into_iter()
            .map(|c| Change {
                commit: c.commit,
                summary: c
                    .summary
                    .or_else(|| c.message.and_then(|m| m.lines().next().map(str::to_string))),
                author: None,
            })
            .collect();

        Build {
            number: build.id,
            version: version.to_string(),
            stable: self.project.is_stable_channel(&build.channel),
            channel: Some(build.channel).filter(|c| !c.is_empty()),
            created_at: parse_time(build.time.as_deref()),
            downloads: download.into_iter().collect(),
            changes,
            java: 0,
        }
    }
}

#[async_trait::async_trait]
impl Provider for FillProvider {
    fn category(&self) -> Category {
        self.project.category
    }

    fn filters(&self) -> CategoryFilters {
        CategoryFilters {
            types: self.project.version_types.to_vec(),
            channels: CHANNELS.iter().map(|c| c.to_string()).collect(),
            supported: true,
            ..CategoryFilters::default()
        }
    }

    async fn list_versions(&self) -> Result<Vec<Version>, ProviderError> {
        let response: FillVersionsResponse = self.client.get_json(&self.versions_url()).await?;

        let mut seen = HashSet::new();
        let mut versions: Vec<Version> = response
            .versions
            .into_iter()
            .filter(|entry| seen.insert(entry.version.id.clone()))
            .map(|entry| {
                let mut version = Version::new(
                    entry.version.id.as_str(),
                    version_type(&entry.version.id),
                );
                version.supported = Some(
                    entry
                        .version
                        .support
                        .is_some_and(|s| s.status.eq_ignore_ascii_case("SUPPORTED")),
                );
                version
            })
            .collect();

        sort_newest_first(&mut versions, |v| v.id.as_str());

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
        let mut builds: Vec<Build> = self
            .fetch_builds(version)
            .await?
            .into_iter()
            .map(|b| self.to_build(version, b))
            .collect();

        builds.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(builds)
    }
}

/// Version type from the markers Fill uses in identifiers
pub fn version_type(id: &str) -> VersionType {
    let upper = id.to_ascii_uppercase();
    if ["SNAPSHOT", "-DEV", "-PRE", "-RC"]
        .iter()
        .any(|m| upper.contains(m))
    {
        VersionType::Snapshot
    } else if upper.contains("-BETA") {
        VersionType::Beta
    } else if upper.contains("-ALPHA") {
        VersionType::Alpha
    } else {
        VersionType::Release
    }
}

fn parse_time(time: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(time?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
