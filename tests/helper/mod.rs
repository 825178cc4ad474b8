//! Shared fixtures for integration tests

#![allow(dead_code)]

mod provider;

pub use provider::StubProvider;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use jarvault::cache::Cache;
use jarvault::java::{JavaConfig, JavaResolver, JavaRule};
use jarvault::models::{Version, VersionType};
use jarvault::providers::{Provider, ProviderRegistry};
use jarvault::service::JarsService;

pub fn rule(min_version: &str, java: u32) -> JavaRule {
    JavaRule {
        min_version: min_version.to_string(),
        java,
    }
}

/// Rule table shaped like the shipped `java.json`
pub fn java_rules() -> Arc<JavaResolver> {
    Arc::new(JavaResolver::from_config(JavaConfig {
        servers: vec![rule("1.20.5", 21), rule("1.18", 17), rule("0", 8)],
        proxies: vec![rule("3.3.0", 21), rule("0", 17)],
        default: 17,
    }))
}

pub fn create_service(providers: Vec<Arc<dyn Provider>>) -> JarsService {
    JarsService::new(
        ProviderRegistry::with_providers(providers),
        Cache::in_memory(Duration::from_secs(60)),
        java_rules(),
    )
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn version(id: &str, version_type: VersionType, released: Option<DateTime<Utc>>) -> Version {
    let mut version = Version::new(id, version_type);
    version.release_time = released;
    version
}
