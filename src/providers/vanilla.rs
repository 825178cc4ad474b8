//! Mojang version manifest

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::cache::Memo;
use crate::config::MANIFEST_TTL_SECS;
use crate::error::ProviderError;
use crate::models::{Build, Category, CategoryFilters, Download, Version, VersionType};
use crate::providers::enrich::sort_by_release_time;
use crate::providers::http::UpstreamClient;
use crate::providers::{Provider, build_not_found, version_not_found};

/// Default URL of the Mojang version manifest
pub const DEFAULT_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Vanilla publishes exactly one server jar per version
const ONLY_BUILD: u32 = 1;

#[derive(Debug, Deserialize)]
struct Manifest {
    versions: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    url: String,
    #[serde(default)]
    release_time: Option<DateTime<Utc>>,
}

impl ManifestEntry {
    fn version_type(&self) -> VersionType {
        match self.kind.as_str() {
            "snapshot" => VersionType::Snapshot,
            "old_beta" => VersionType::Beta,
            "old_alpha" => VersionType::Alpha,
            _ => VersionType::Release,
        }
    }
}

/// Per-version document linked from the manifest
#[derive(Debug, Deserialize)]
struct VersionDetail {
    #[serde(default)]
    downloads: VersionDownloads,
}

#[derive(Debug, Default, Deserialize)]
struct VersionDownloads {
    #[serde(default)]
    server: Option<ServerDownload>,
}

#[derive(Debug, Deserialize)]
struct ServerDownload {
    url: String,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

pub struct VanillaProvider {
    client: UpstreamClient,
    manifest_url: String,
    manifest: Memo<Manifest>,
}

impl VanillaProvider {
    /// Creates a new VanillaProvider reading a custom manifest URL
    pub fn new(manifest_url: &str, client: UpstreamClient) -> Self {
        Self {
            client,
            manifest_url: manifest_url.to_string(),
            manifest: Memo::new(Duration::from_secs(MANIFEST_TTL_SECS)),
        }
    }

    pub fn with_default_url(client: UpstreamClient) -> Self {
        Self::new(DEFAULT_MANIFEST_URL, client)
    }

    async fn manifest(&self) -> Result<Arc<Manifest>, ProviderError> {
        self.manifest
            .get_or_refresh(|| self.client.get_json::<Manifest>(&self.manifest_url))
            .await
    }
}

#[async_trait::async_trait]
impl Provider for VanillaProvider {
    fn category(&self) -> Category {
        Category::Vanilla
    }

    fn filters(&self) -> CategoryFilters {
        CategoryFilters {
            types: vec![
                VersionType::Release,
                VersionType::Snapshot,
                VersionType::Beta,
                VersionType::Alpha,
            ],
            ..CategoryFilters::default()
        }
    }

    async fn list_versions(&self) -> Result<Vec<Version>, ProviderError> {
        let manifest = self.manifest().await?;

        let mut versions: Vec<Version> = manifest
            .versions
            .iter()
            .map(|entry| {
                let mut version = Version::new(entry.id.as_str(), entry.version_type());
                version.release_time = entry.release_time;
                version
            })
            .collect();

        sort_by_release_time(&mut versions);
        Ok(versions)
    }

    async fn list_builds(&self, version: &str) -> Result<Vec<Build>, ProviderError> {
        let manifest = self.manifest().await?;
        let entry = manifest
            .versions
            .iter()
            .find(|v| v.id == version)
            .ok_or_else(|| version_not_found(Category::Vanilla, version))?;

        let detail: VersionDetail = self.client.get_json(&entry.url).await?;

        let mut build = Build::new(ONLY_BUILD, version);
        build.stable = true;
        build.created_at = entry.release_time;
        // Very old versions ship no server jar; the build stays without files
        if let Some(server) = detail.downloads.server.filter(|s| !s.url.is_empty()) {
            build.downloads.push(
                Download::new(format!("server-{}.jar", version), server.url)
                    .with_sha1(server.sha1)
                    .with_size(server.size),
            );
        }

        Ok(vec![build])
    }

    async fn get_build(&self, version: &str, number: u32) -> Result<Build, ProviderError> {
        if number != ONLY_BUILD {
            return Err(build_not_found(Category::Vanilla, version, number));
        }
        self.list_builds(version)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| build_not_found(Category::Vanilla, version, number))
    }

    async fn get_latest_build(&self, version: &str) -> Result<Build, ProviderError> {
        self.get_build(version, ONLY_BUILD).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use mockito::{Server, ServerGuard};

    fn manifest_body(server_url: &str) -> String {
        format!(
            r#"{{
                "latest": {{"release": "1.21.4", "snapshot": "25w02a"}},
                "versions": [
                    {{"id": "25w02a", "type": "snapshot", "url": "{server_url}/v1/25w02a.json", "time": "2025-01-08T13:00:00+00:00", "releaseTime": "2025-01-08T12:00:00+00:00"}},
                    {{"id": "1.21.4", "type": "release", "url": "{server_url}/v1/1.21.4.json", "time": "2024-12-03T10:00:00+00:00", "releaseTime": "2024-12-03T10:12:57+00:00"}},
                    {{"id": "b1.7.3", "type": "old_beta", "url": "{server_url}/v1/b1.7.3.json", "time": "2011-07-08T00:00:00+00:00", "releaseTime": "2011-07-07T22:00:00+00:00"}},
                    {{"id": "rd-132211", "type": "old_alpha", "url": "{server_url}/v1/rd-132211.json", "time": "2009-05-13T20:11:00+00:00", "releaseTime": "2009-05-13T20:11:00+00:00"}}
                ]
            }}"#
        )
    }

    async fn mock_manifest(server: &mut ServerGuard) -> mockito::Mock {
        let body = manifest_body(&server.url());
        server
            .mock("GET", "/manifest.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    fn provider(server: &ServerGuard) -> VanillaProvider {
        let client = UpstreamClient::new(&ProviderConfig::default()).unwrap();
        VanillaProvider::new(&format!("{}/manifest.json", server.url()), client)
    }

    #[tokio::test]
    async fn list_versions_maps_manifest_types() {
        let mut server = Server::new_async().await;
        let _manifest = mock_manifest(&mut server).await;

        let versions = provider(&server).list_versions().await.unwrap();

        let summary: Vec<(&str, VersionType, bool)> = versions
            .iter()
            .map(|v| (v.id.as_str(), v.version_type, v.stable))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("25w02a", VersionType::Snapshot, false),
                ("1.21.4", VersionType::Release, true),
                ("b1.7.3", VersionType::Beta, false),
                ("rd-132211", VersionType::Alpha, false),
            ]
        );
        assert!(versions.iter().all(|v| v.supported.is_none()));
        assert_eq!(
            versions[1].release_time,
            Some("2024-12-03T10:12:57Z".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn manifest_is_fetched_once_within_ttl() {
        let mut server = Server::new_async().await;
        let body = manifest_body(&server.url());
        let manifest = server
            .mock("GET", "/manifest.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server);
        provider.list_versions().await.unwrap();
        provider.list_versions().await.unwrap();

        manifest.assert_async().await;
    }

    #[tokio::test]
    async fn list_builds_returns_single_server_build() {
        let mut server = Server::new_async().await;
        let _manifest = mock_manifest(&mut server).await;
        let _detail = server
            .mock("GET", "/v1/1.21.4.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "1.21.4",
                    "downloads": {
                        "client": {"sha1": "aaa", "size": 1, "url": "https://piston-data.mojang.com/client.jar"},
                        "server": {"sha1": "4707d00eb834b446575d89a61a11b5d548d8c001", "size": 57555044, "url": "https://piston-data.mojang.com/v1/objects/4707/server.jar"}
                    }
                }"#,
            )
            .create_async()
            .await;

        let builds = provider(&server).list_builds("1.21.4").await.unwrap();

        assert_eq!(builds.len(), 1);
        let build = &builds[0];
        assert_eq!(build.number, 1);
        assert!(build.stable);
        assert_eq!(build.downloads[0].name, "server-1.21.4.jar");
        assert_eq!(
            build.downloads[0].sha1.as_deref(),
            Some("4707d00eb834b446575d89a61a11b5d548d8c001")
        );
        assert_eq!(build.downloads[0].size, Some(57555044));
        assert_eq!(
            build.downloads[0].upstream_url(),
            "https://piston-data.mojang.com/v1/objects/4707/server.jar"
        );
    }

    #[tokio::test]
    async fn list_builds_returns_not_found_for_unknown_version() {
        let mut server = Server::new_async().await;
        let _manifest = mock_manifest(&mut server).await;

        let result = provider(&server).list_builds("9.9.9").await;

        assert!(matches!(result, Err(ProviderError::NotFound(_))));
    }

    #[tokio::test]
    async fn resolve_download_url_fails_for_version_without_server_jar() {
        let mut server = Server::new_async().await;
        let _manifest = mock_manifest(&mut server).await;
        let _detail = server
            .mock("GET", "/v1/rd-132211.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "rd-132211", "downloads": {"client": {"url": "https://example/client.jar"}}}"#)
            .create_async()
            .await;

        let result = provider(&server)
            .resolve_download_url("rd-132211", 1)
            .await;

        assert!(matches!(
            result,
            Err(ProviderError::NoDownloadAvailable { build: 1, .. })
        ));
    }

    #[tokio::test]
    async fn get_build_rejects_numbers_other_than_one() {
        let server = Server::new_async().await;

        let result = provider(&server).get_build("1.21.4", 2).await;

        assert!(matches!(result, Err(ProviderError::NotFound(_))));
    }
}
