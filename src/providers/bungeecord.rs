//! BungeeCord builds from the md-5 Jenkins job
//!
//! Jenkins has no notion of Minecraft versions, so the category exposes a
//! single version, `latest`, whose builds are the job's most recent runs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::MAX_JENKINS_BUILDS;
use crate::error::ProviderError;
use crate::models::{Build, Category, CategoryFilters, Download, Version, VersionType};
use crate::providers::enrich::fan_out;
use crate::providers::http::UpstreamClient;
use crate::providers::{Provider, build_not_found, no_builds, select_latest, version_not_found};

/// Default URL of the BungeeCord Jenkins job
pub const DEFAULT_JOB_URL: &str = "https://ci.md-5.net/job/BungeeCord";

/// The only version this category has
pub const LATEST_VERSION: &str = "latest";

const JAR_ARTIFACT: &str = "BungeeCord.jar";

#[derive(Debug, Deserialize)]
struct JobInfo {
    #[serde(default)]
    builds: Vec<BuildRef>,
}

#[derive(Debug, Deserialize)]
struct BuildRef {
    number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastSuccessful {
    #[serde(default)]
    last_successful_build: Option<BuildRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    #[serde(default)]
    result: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    file_name: String,
    relative_path: String,
}

pub struct BungeeCordProvider {
    client: UpstreamClient,
    job_url: String,
}

impl BungeeCordProvider {
    /// Creates a new BungeeCordProvider for a custom Jenkins job URL
    pub fn new(job_url: &str, client: UpstreamClient) -> Self {
        Self {
            client,
            job_url: job_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_default_url(client: UpstreamClient) -> Self {
        Self::new(DEFAULT_JOB_URL, client)
    }

    fn ensure_version(version: &str) -> Result<(), ProviderError> {
        if version == LATEST_VERSION {
            Ok(())
        } else {
            Err(version_not_found(Category::BungeeCord, version))
        }
    }

    async fn fetch_build(&self, number: u32) -> Result<BuildInfo, ProviderError> {
        self.client
            .get_json(&format!("{}/{}/api/json", self.job_url, number))
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => {
                    build_not_found(Category::BungeeCord, LATEST_VERSION, number)
                }
                other => other,
            })
    }

    fn to_build(&self, number: u32, info: BuildInfo) -> Build {
        let mut build = Build::new(number, LATEST_VERSION);
        build.stable = info.result.as_deref() == Some("SUCCESS");
        build.channel = info.result;
        build.created_at = (info.timestamp > 0)
            .then(|| DateTime::<Utc>::from_timestamp_millis(info.timestamp))
            .flatten();

        if let Some(artifact) = info.artifacts.iter().find(|a| a.file_name == JAR_ARTIFACT) {
            build.downloads.push(Download::new(
                format!("BungeeCord-{}.jar", number),
                format!(
                    "{}/{}/artifact/{}",
                    self.job_url, number, artifact.relative_path
                ),
            ));
        }

        build
    }
}

#[async_trait::async_trait]
impl Provider for BungeeCordProvider {
    fn category(&self) -> Category {
        Category::BungeeCord
    }

    /// Jenkins results as channels; the single version has no release year
    fn filters(&self) -> CategoryFilters {
        CategoryFilters {
            channels: vec!["SUCCESS".to_string(), "UNSTABLE".to_string()],
            year: false,
            ..CategoryFilters::default()
        }
    }

    async fn list_versions(&self) -> Result<Vec<Version>, ProviderError> {
        Ok(vec![Version::new(LATEST_VERSION, VersionType::Release)])
    }

    /// The newest runs of the job, skipping runs without a jar
    async fn list_builds(&self, version: &str) -> Result<Vec<Build>, ProviderError> {
        Self::ensure_version(version)?;

        let job: JobInfo = self
            .client
            .get_json(&format!("{}/api/json?tree=builds[number]", self.job_url))
            .await?;

        let numbers: Vec<u32> = job
            .builds
            .into_iter()
            .take(MAX_JENKINS_BUILDS)
            .map(|b| b.number)
            .collect();

        let fetched = fan_out(numbers, self.client.max_concurrent_fetches(), |number| async move {
            match self.fetch_build(number).await {
                Ok(info) => Some(self.to_build(number, info)),
                Err(e) => {
                    debug!("Skipping BungeeCord build {}: {}", number, e);
                    None
                }
            }
        })
        .await;

        let mut builds: Vec<Build> = fetched
            .into_iter()
            .flatten()
            .filter(|b| !b.downloads.is_empty())
            .collect();
        builds.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(builds)
    }

    async fn get_build(&self, version: &str, number: u32) -> Result<Build, ProviderError> {
        Self::ensure_version(version)?;
        let info = self.fetch_build(number).await?;
        Ok(self.to_build(number, info))
    }

    async fn get_latest_build(&self, version: &str) -> Result<Build, ProviderError> {
        Self::ensure_version(version)?;

        let last: LastSuccessful = self
            .client
            .get_json(&format!(
                "{}/api/json?tree=lastSuccessfulBuild[number]",
                self.job_url
            ))
            .await?;

        match last.last_successful_build {
            Some(build) => self.get_build(version, build.number).await,
            None => select_latest(self.list_builds(version).await?)
                .ok_or_else(|| no_builds(Category::BungeeCord, version)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use mockito::{Matcher, Server, ServerGuard};

    fn provider(server: &ServerGuard) -> BungeeCordProvider {
        let client = UpstreamClient::new(&ProviderConfig::default()).unwrap();
        BungeeCordProvider::new(&server.url(), client)
    }

    fn build_body(result: &str, with_jar: bool) -> String {
        let artifacts = if with_jar {
            r#"[{"displayPath": "BungeeCord.jar", "fileName": "BungeeCord.jar", "relativePath": "bootstrap/target/BungeeCord.jar"}]"#
        } else {
            "[]"
        };
        format!(r#"{{"result": "{result}", "timestamp": 1735000000000, "artifacts": {artifacts}}}"#)
    }

    async fn mock_build(server: &mut ServerGuard, number: u32, body: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/{}/api/json", number).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn list_versions_has_only_latest() {
        let server = Server::new_async().await;

        let versions = provider(&server).list_versions().await.unwrap();

        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, "latest");
        assert!(versions[0].stable);
    }

    #[tokio::test]
    async fn list_builds_skips_runs_without_jar_or_details() {
        let mut server = Server::new_async().await;

        let _job = server
            .mock("GET", "/api/json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"builds": [{"number": 1903}, {"number": 1902}, {"number": 1901}, {"number": 1900}]}"#)
            .create_async()
            .await;
        let _b1 = mock_build(&mut server, 1903, &build_body("FAILURE", false)).await;
        let _b2 = mock_build(&mut server, 1902, &build_body("SUCCESS", true)).await;
        let _b3 = server
            .mock("GET", "/1901/api/json")
            .with_status(500)
            .create_async()
            .await;
        let _b4 = mock_build(&mut server, 1900, &build_body("UNSTABLE", true)).await;

        let builds = provider(&server).list_builds("latest").await.unwrap();

        let numbers: Vec<u32> = builds.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1902, 1900]);
        assert!(builds[0].stable);
        assert!(!builds[1].stable);
        assert_eq!(builds[0].downloads[0].name, "BungeeCord-1902.jar");
        assert_eq!(
            builds[0].downloads[0].upstream_url(),
            format!(
                "{}/1902/artifact/bootstrap/target/BungeeCord.jar",
                server.url()
            )
        );
    }

    #[tokio::test]
    async fn list_builds_inspects_at_most_fifty_runs() {
        let mut server = Server::new_async().await;

        let refs: Vec<String> = (1..=60)
            .rev()
            .map(|n| format!(r#"{{"number": {n}}}"#))
            .collect();
        let _job = server
            .mock("GET", "/api/json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"builds": [{}]}}"#, refs.join(",")))
            .create_async()
            .await;
        let details = server
            .mock("GET", Matcher::Regex(r"^/\d+/api/json$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(build_body("SUCCESS", true))
            .expect(MAX_JENKINS_BUILDS)
            .create_async()
            .await;

        let builds = provider(&server).list_builds("latest").await.unwrap();

        details.assert_async().await;
        assert_eq!(builds.len(), MAX_JENKINS_BUILDS);
        assert_eq!(builds[0].number, 60);
        assert_eq!(builds.last().map(|b| b.number), Some(11));
    }

    #[tokio::test]
    async fn other_versions_are_not_found() {
        let server = Server::new_async().await;
        let provider = provider(&server);

        assert!(matches!(
            provider.list_builds("1.21").await,
            Err(ProviderError::NotFound(_))
        ));
        assert!(matches!(
            provider.get_build("1.21", 1).await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_latest_build_uses_last_successful_build() {
        let mut server = Server::new_async().await;

        let _last = server
            .mock("GET", "/api/json")
            .match_query(Matcher::UrlEncoded(
                "tree".to_string(),
                "lastSuccessfulBuild[number]".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"lastSuccessfulBuild": {"number": 1902}}"#)
            .create_async()
            .await;
        let build = mock_build(&mut server, 1902, &build_body("SUCCESS", true)).await;

        let latest = provider(&server).get_latest_build("latest").await.unwrap();

        build.assert_async().await;
        assert_eq!(latest.number, 1902);
        assert!(latest.stable);
    }

    #[tokio::test]
    async fn resolve_download_url_fails_without_jar_artifact() {
        let mut server = Server::new_async().await;

        let _build = mock_build(&mut server, 1903, &build_body("FAILURE", false)).await;

        let result = provider(&server).resolve_download_url("latest", 1903).await;

        assert!(matches!(
            result,
            Err(ProviderError::NoDownloadAvailable { build: 1903, .. })
        ));
    }
}
