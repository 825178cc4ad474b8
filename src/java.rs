//! Minimum Java version lookup
//!
//! Resolution order for a version identifier:
//!
//! 1. legacy identifiers (`a1.2.6`, `b1.8.1`, `c0.30`, `rd-132211`,
//!    `inf-20100618`, anything with `indev`) need Java 8
//! 2. weekly snapshots (`24w33a`) map through a year/week table
//! 3. the rule table for the category's role, first match wins
//! 4. the table's default
//!
//! When no table could be loaded every lookup returns
//! [`FALLBACK_JAVA_VERSION`].

use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::compare::compare_versions;
use crate::config::FALLBACK_JAVA_VERSION;
use crate::error::JavaConfigError;
use crate::models::Category;

static WEEKLY_SNAPSHOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})w(\d{2})[a-z]$").expect("weekly snapshot pattern is valid")
});

const LEGACY_PREFIXES: &[&str] = &["a", "b", "c", "rd-", "inf-"];

/// Rule file content
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JavaConfig {
    #[serde(default)]
    pub servers: Vec<JavaRule>,
    #[serde(default)]
    pub proxies: Vec<JavaRule>,
    #[serde(default = "default_java")]
    pub default: u32,
}

fn default_java() -> u32 {
    FALLBACK_JAVA_VERSION
}

/// A version at or above `min_version` needs at least `java`.
///
/// `min_version = "0"` matches every identifier, including ones the
/// comparator cannot parse.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JavaRule {
    pub min_version: String,
    pub java: u32,
}

impl JavaRule {
    fn matches(&self, version: &str) -> bool {
        if self.min_version == "0" {
            return true;
        }
        compare_versions(version, &self.min_version) != Ordering::Less
    }
}

impl JavaConfig {
    pub fn from_file(path: &Path) -> Result<Self, JavaConfigError> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Rule table lookups, immutable after construction
#[derive(Debug, Clone)]
pub struct JavaResolver {
    config: Option<JavaConfig>,
}

impl JavaResolver {
    pub fn from_config(config: JavaConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// Resolver without a table; answers [`FALLBACK_JAVA_VERSION`] for everything
    pub fn fallback() -> Self {
        Self { config: None }
    }

    /// Load the rule file, degrading to [`JavaResolver::fallback`] if it is
    /// missing or malformed.
    pub fn load(path: &Path) -> Self {
        match JavaConfig::from_file(path) {
            Ok(config) => {
                info!(
                    "Loaded Java rules from {} ({} server, {} proxy)",
                    path.display(),
                    config.servers.len(),
                    config.proxies.len()
                );
                Self::from_config(config)
            }
            Err(e) => {
                warn!(
                    "{} ({}); every version will require Java {}",
                    e,
                    path.display(),
                    FALLBACK_JAVA_VERSION
                );
                Self::fallback()
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.config.is_none()
    }

    /// Minimum Java major version for `version` of `category`
    pub fn resolve(&self, version: &str, category: Category) -> u32 {
        let Some(config) = &self.config else {
            return FALLBACK_JAVA_VERSION;
        };

        let lower = version.trim().to_ascii_lowercase();

        if is_legacy(&lower) {
            return 8;
        }

        if let Some(java) = weekly_snapshot_java(&lower) {
            return java;
        }

        let rules = if category.is_proxy() {
            &config.proxies
        } else {
            &config.servers
        };

        // "latest" is newer than any rule
        if lower == "latest" {
            return rules.first().map_or(config.default, |rule| rule.java);
        }

        rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map_or(config.default, |rule| rule.java)
    }
}

fn is_legacy(version: &str) -> bool {
    LEGACY_PREFIXES.iter().any(|p| version.starts_with(p)) || version.contains("indev")
}

fn weekly_snapshot_java(version: &str) -> Option<u32> {
    let captures = WEEKLY_SNAPSHOT.captures(version)?;
    let year: u32 = captures[1].parse().ok()?;
    let week: u32 = captures[2].parse().ok()?;

    let java = match (year, week) {
        (24.., _) => 21,
        (23, 40..) => 21,
        (21.., _) => 17,
        _ => 8,
    };
    Some(java)
}
