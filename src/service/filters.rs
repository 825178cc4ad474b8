//! Caller-side predicates over already fetched lists
//!
//! Every field is an independent predicate and `None` means "don't care", so
//! filters compose in any order. Date and year bounds only reject items whose
//! time is known; undated items always pass them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::ServiceError;
use crate::models::{Build, Category, Version, VersionType};

/// Sentinel accepted wherever a version or build can be named
pub const LATEST: &str = "latest";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-day bounds plus release-year bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl DateRange {
    pub fn contains(&self, time: Option<DateTime<Utc>>) -> bool {
        let Some(time) = time else {
            return true;
        };
        let day = time.date_naive();

        self.after.is_none_or(|after| day >= after)
            && self.before.is_none_or(|before| day <= before)
            && self.min_year.is_none_or(|min| time.year() >= min)
            && self.max_year.is_none_or(|max| time.year() <= max)
    }

    /// Consume one query pair; returns false for keys it does not know
    fn parse_pair(&mut self, key: &str, value: &str) -> Result<bool, ServiceError> {
        match key {
            "after" => self.after = Some(parse_date(key, value)?),
            "before" => self.before = Some(parse_date(key, value)?),
            "min_year" => self.min_year = Some(parse_value(key, value)?),
            "max_year" => self.max_year = Some(parse_value(key, value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFilter {
    pub version_type: Option<VersionType>,
    pub stable: Option<bool>,
    pub supported: Option<bool>,
    /// Exact Java requirement
    pub java: Option<u32>,
    pub dates: DateRange,
}

impl VersionFilter {
    pub fn matches(&self, version: &Version) -> bool {
        self.version_type.is_none_or(|t| version.version_type == t)
            && self.stable.is_none_or(|s| version.stable == s)
            && self
                .supported
                .is_none_or(|s| version.supported.unwrap_or(false) == s)
            && self.java.is_none_or(|j| version.java == j)
            && self.dates.contains(version.release_time)
    }

    pub fn apply(&self, versions: Vec<Version>) -> Vec<Version> {
        versions.into_iter().filter(|v| self.matches(v)).collect()
    }

    /// Build from `key=value` pairs: `type`, `stable`, `supported`, `java`,
    /// `after`, `before`, `min_year`, `max_year`
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ServiceError> {
        let mut filter = Self::default();
        for (key, value) in pairs {
            if !filter.parse_pair(key, value)? {
                return Err(ServiceError::validation("filter", key));
            }
        }
        Ok(filter)
    }

    fn parse_pair(&mut self, key: &str, value: &str) -> Result<bool, ServiceError> {
        match key {
            "type" => self.version_type = Some(parse_version_type(value)?),
            "stable" => self.stable = Some(parse_value(key, value)?),
            "supported" => self.supported = Some(parse_value(key, value)?),
            "java" => self.java = Some(parse_value(key, value)?),
            _ => return self.dates.parse_pair(key, value),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFilter {
    pub stable: Option<bool>,
    /// Case-insensitive channel name, e.g. `STABLE` or `BETA`
    pub channel: Option<String>,
    /// Bounds on the build's creation time
    pub dates: DateRange,
}

impl BuildFilter {
    pub fn matches(&self, build: &Build) -> bool {
        self.stable.is_none_or(|s| build.stable == s)
            && self.channel.as_deref().is_none_or(|wanted| {
                build
                    .channel
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
            })
            && self.dates.contains(build.created_at)
    }

    pub fn apply(&self, builds: Vec<Build>) -> Vec<Build> {
        builds.into_iter().filter(|b| self.matches(b)).collect()
    }

    /// Build from `key=value` pairs: `stable`, `channel`, `after`, `before`,
    /// `min_year`, `max_year`
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ServiceError> {
        let mut filter = Self::default();
        for (key, value) in pairs {
            match key {
                "stable" => filter.stable = Some(parse_value(key, value)?),
                "channel" => filter.channel = Some(value.to_string()),
                _ => {
                    if !filter.dates.parse_pair(key, value)? {
                        return Err(ServiceError::validation("filter", key));
                    }
                }
            }
        }
        Ok(filter)
    }
}

/// Cross-category search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Case-insensitive substring of the version id or category name
    pub query: Option<String>,
    /// Restrict to one category
    pub category: Option<Category>,
    pub versions: VersionFilter,
}

impl SearchOptions {
    pub fn matches_query(&self, category: Category, version: &Version) -> bool {
        let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        let query = query.to_lowercase();
        version.id.to_lowercase().contains(&query)
            || category.display_name().to_lowercase().contains(&query)
    }

    /// Build from `key=value` pairs: `q`, `category` and every
    /// [`VersionFilter`] key
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ServiceError> {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key {
                "q" => options.query = Some(value.to_string()),
                "category" => {
                    options.category = Some(
                        value
                            .parse()
                            .map_err(|_| ServiceError::validation(key, value))?,
                    )
                }
                _ => {
                    if !options.versions.parse_pair(key, value)? {
                        return Err(ServiceError::validation("filter", key));
                    }
                }
            }
        }
        Ok(options)
    }
}

/// Which build of a version a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSelector {
    Latest,
    Number(u32),
}

impl BuildSelector {
    /// `latest` (any case) or a build number
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(LATEST) {
            return Ok(BuildSelector::Latest);
        }
        value
            .parse()
            .map(BuildSelector::Number)
            .map_err(|_| ServiceError::validation("build", value))
    }
}

impl std::str::FromStr for BuildSelector {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ServiceError> {
    value
        .trim()
        .parse()
        .map_err(|_| ServiceError::validation(key, value))
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ServiceError::validation(key, value))
}

fn parse_version_type(value: &str) -> Result<VersionType, ServiceError> {
    value
        .trim()
        .parse()
        .map_err(|_| ServiceError::validation("type", value))
}
