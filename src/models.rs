//! Normalized data model shared by every provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product family a provider distributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Official Mojang server
    Vanilla,
    /// PaperMC server
    Paper,
    /// PaperMC regionized server
    Folia,
    /// Paper fork from PurpurMC
    Purpur,
    /// PaperMC proxy
    Velocity,
    /// PaperMC BungeeCord fork (end of life)
    Waterfall,
    /// SpigotMC proxy
    BungeeCord,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Vanilla,
        Category::Paper,
        Category::Folia,
        Category::Purpur,
        Category::Velocity,
        Category::Waterfall,
        Category::BungeeCord,
    ];

    /// Returns the string representation of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vanilla => "vanilla",
            Category::Paper => "paper",
            Category::Folia => "folia",
            Category::Purpur => "purpur",
            Category::Velocity => "velocity",
            Category::Waterfall => "waterfall",
            Category::BungeeCord => "bungeecord",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Vanilla => "Vanilla",
            Category::Paper => "Paper",
            Category::Folia => "Folia",
            Category::Purpur => "Purpur",
            Category::Velocity => "Velocity",
            Category::Waterfall => "Waterfall",
            Category::BungeeCord => "BungeeCord",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Vanilla => "Official Minecraft server from Mojang",
            Category::Paper => "High performance Minecraft server fork",
            Category::Folia => "Paper fork with regionized multithreading",
            Category::Purpur => "Paper fork with extra configurability",
            Category::Velocity => "Modern, high-performance Minecraft server proxy",
            Category::Waterfall => "BungeeCord fork maintained by PaperMC",
            Category::BungeeCord => "Minecraft server proxy by SpigotMC",
        }
    }

    /// Proxies follow a separate Java rule table
    pub fn is_proxy(&self) -> bool {
        matches!(
            self,
            Category::Velocity | Category::Waterfall | Category::BungeeCord
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Kind of version as reported (or inferred) from upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    Release,
    Snapshot,
    Beta,
    Alpha,
}

impl VersionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Release => "release",
            VersionType::Snapshot => "snapshot",
            VersionType::Beta => "beta",
            VersionType::Alpha => "alpha",
        }
    }

    /// Stability assumed for a version before any build data is known
    pub fn default_stability(&self) -> bool {
        matches!(self, VersionType::Release)
    }
}

impl std::str::FromStr for VersionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(VersionType::Release),
            "snapshot" => Ok(VersionType::Snapshot),
            "beta" => Ok(VersionType::Beta),
            "alpha" => Ok(VersionType::Alpha),
            _ => Err(()),
        }
    }
}

/// A version of a category, e.g. Paper 1.21.4
///
/// Everything except `id` and `version_type` is derived on each live fetch
/// and should be treated as best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<DateTime<Utc>>,
    pub stable: bool,
    /// Only sources with a support lifecycle populate this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<bool>,
    #[serde(default)]
    pub java: u32,
}

impl Version {
    pub fn new(id: impl Into<String>, version_type: VersionType) -> Self {
        Self {
            id: id.into(),
            version_type,
            release_time: None,
            stable: version_type.default_stability(),
            supported: None,
            java: 0,
        }
    }
}

/// A single published build of a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub number: u32,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub stable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub downloads: Vec<Download>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub java: u32,
}

impl Build {
    pub fn new(number: u32, version: impl Into<String>) -> Self {
        Self {
            number,
            version: version.into(),
            channel: None,
            stable: false,
            created_at: None,
            downloads: Vec::new(),
            changes: Vec::new(),
            java: 0,
        }
    }
}

/// A downloadable file attached to a build
///
/// The upstream URL never leaves the process: it is skipped by serde, so it
/// is absent from JSON responses and from cached entries alike. Callers that
/// need it must resolve the build through a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip)]
    upstream_url: String,
}

impl Download {
    pub fn new(name: impl Into<String>, upstream_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sha256: None,
            sha1: None,
            size: None,
            upstream_url: upstream_url.into(),
        }
    }

    pub fn with_sha256(mut self, sha256: Option<String>) -> Self {
        self.sha256 = sha256.filter(|s| !s.is_empty());
        self
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.sha1 = sha1.filter(|s| !s.is_empty());
        self
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }
}

/// Provenance entry for a build (commit, changelog line)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Filters a category can meaningfully answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFilters {
    /// Version types the category publishes
    pub types: Vec<VersionType>,
    /// Build channel vocabulary, empty when builds carry no channel
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    pub stable: bool,
    pub supported: bool,
    pub java: bool,
    pub year: bool,
}

impl Default for CategoryFilters {
    fn default() -> Self {
        Self {
            types: vec![VersionType::Release],
            channels: Vec::new(),
            stable: true,
            supported: false,
            java: true,
            year: true,
        }
    }
}

/// Public description of a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub name: String,
    pub description: String,
    pub proxy: bool,
    pub filters: CategoryFilters,
}

impl CategoryInfo {
    pub fn new(category: Category, filters: CategoryFilters) -> Self {
        Self {
            id: category,
            name: category.display_name().to_string(),
            description: category.description().to_string(),
            proxy: category.is_proxy(),
            filters,
        }
    }
}

/// One hit of a cross-category search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub category: Category,
    pub version: String,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    pub stable: bool,
    pub java: u32,
}

/// Everything a download proxy needs to stream a build.
///
/// Deliberately not `Serialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    pub file_name: String,
    pub upstream_url: String,
    pub sha256: Option<String>,
    pub size: Option<u64>,
}

impl From<&Download> for ResolvedDownload {
    fn from(download: &Download) -> Self {
        Self {
            file_name: download.name.clone(),
            upstream_url: download.upstream_url.clone(),
            sha256: download.sha256.clone(),
            size: download.size,
        }
    }
}
