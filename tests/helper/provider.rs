//! In-memory provider for service-level tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use jarvault::error::ProviderError;
use jarvault::models::{Build, Category, Download, Version};
use jarvault::providers::Provider;

/// Serves canned versions and builds, counting upstream calls
pub struct StubProvider {
    category: Category,
    versions: Vec<Version>,
    builds: HashMap<String, Vec<Build>>,
    failing: bool,
    version_calls: AtomicUsize,
    build_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            versions: Vec::new(),
            builds: HashMap::new(),
            failing: false,
            version_calls: AtomicUsize::new(0),
            build_calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails as if the upstream were down
    pub fn failing(category: Category) -> Self {
        Self {
            failing: true,
            ..Self::new(category)
        }
    }

    pub fn with_versions(mut self, versions: Vec<Version>) -> Self {
        self.versions = versions;
        self
    }

    /// Builds listed highest number first; `(number, stable, has_jar)`
    pub fn with_builds(mut self, version: &str, builds: &[(u32, bool, bool)]) -> Self {
        let builds = builds
            .iter()
            .map(|&(number, stable, has_jar)| {
                let mut build = Build::new(number, version);
                build.stable = stable;
                build.channel = Some(if stable { "STABLE" } else { "ALPHA" }.to_string());
                if has_jar {
                    build.downloads.push(
                        Download::new(
                            format!("{}-{}-{}.jar", self.category, version, number),
                            format!("https://upstream.test/{}/{}/{}.jar", self.category, version, number),
                        )
                        .with_sha256(Some(format!("sha-{}", number))),
                    );
                }
                build
            })
            .collect();
        self.builds.insert(version.to_string(), builds);
        self
    }

    pub fn version_calls(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }

    fn unavailable(&self) -> ProviderError {
        ProviderError::InvalidResponse(format!("{} upstream unavailable", self.category))
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn category(&self) -> Category {
        self.category
    }

    async fn list_versions(&self) -> Result<Vec<Version>, ProviderError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(self.unavailable());
        }
        Ok(self.versions.clone())
    }

    async fn list_builds(&self, version: &str) -> Result<Vec<Build>, ProviderError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(self.unavailable());
        }
        self.builds
            .get(version)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("{} version {}", self.category, version)))
    }
}
