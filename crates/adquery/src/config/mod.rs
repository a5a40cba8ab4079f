use std::time::Duration;

use crate::error::{QueryError, Result};
use crate::logging::Profile;

mod env;

use env::{parse_list, parse_non_empty, parse_u64, parse_usize, read_raw_env};

const ENV_INDEX_MAX_AGE_HOURS: &str = "ADQUERY_INDEX_MAX_AGE_HOURS";
const ENV_INDEX_KEY: &str = "ADQUERY_INDEX_KEY";
const ENV_PARTIAL_INDEX_NAME: &str = "ADQUERY_PARTIAL_INDEX_NAME";
const ENV_EXCLUDED_CATEGORY: &str = "ADQUERY_EXCLUDED_CATEGORY";
const ENV_ACCEPTED_CATEGORIES: &str = "ADQUERY_ACCEPTED_CATEGORIES";
const ENV_DEFAULT_PAGE_SIZE: &str = "ADQUERY_DEFAULT_PAGE_SIZE";
const ENV_MAX_PAGE_SIZE: &str = "ADQUERY_MAX_PAGE_SIZE";
const ENV_FULL_QUERY_BATCH_SIZE: &str = "ADQUERY_FULL_QUERY_BATCH_SIZE";
const ENV_SEARCH_TIMEOUT_SECS: &str = "ADQUERY_SEARCH_TIMEOUT_SECS";
const ENV_SESSION_PREFIX: &str = "ADQUERY_SESSION_PREFIX";
const ENV_LOG_PROFILE: &str = "ADQUERY_LOG_PROFILE";

pub const DEFAULT_INDEX_MAX_AGE_HOURS: u64 = 24;
const MAX_INDEX_MAX_AGE_HOURS: u64 = 24 * 365 * 100;
pub const DEFAULT_INDEX_KEY: &str = "ads_stream.json";
pub const DEFAULT_PARTIAL_INDEX_NAME: &str = "quick_access_cache.json";
pub const DEFAULT_EXCLUDED_CATEGORY: &str = "observations";
pub const DEFAULT_ACCEPTED_CATEGORIES: [&str; 2] =
    ["ads_passed_mass_download", "ads_passed_rdo_construction"];
pub const DEFAULT_PAGE_SIZE: usize = 10_000;
pub const DEFAULT_FULL_QUERY_BATCH_SIZE: usize = 1_000;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SESSION_PREFIX: &str = "query-sessions/";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub session: SessionConfig,
    pub log_profile: Profile,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(read_raw_env)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            index: IndexConfig::parse(&lookup),
            search: SearchConfig::parse(&lookup)?,
            session: SessionConfig::parse(&lookup),
            log_profile: Profile::parse(lookup(ENV_LOG_PROFILE).as_deref())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub artifact_key: String,
    pub partial_index_name: String,
    pub excluded_category: String,
    pub accepted_categories: Vec<String>,
    pub max_age: chrono::Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            artifact_key: DEFAULT_INDEX_KEY.to_string(),
            partial_index_name: DEFAULT_PARTIAL_INDEX_NAME.to_string(),
            excluded_category: DEFAULT_EXCLUDED_CATEGORY.to_string(),
            accepted_categories: DEFAULT_ACCEPTED_CATEGORIES
                .iter()
                .map(ToString::to_string)
                .collect(),
            max_age: chrono::Duration::hours(DEFAULT_INDEX_MAX_AGE_HOURS as i64),
        }
    }
}

impl IndexConfig {
    fn parse(raw: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let hours = parse_u64(
            raw(ENV_INDEX_MAX_AGE_HOURS).as_deref(),
            DEFAULT_INDEX_MAX_AGE_HOURS,
            0,
        )
        .min(MAX_INDEX_MAX_AGE_HOURS);
        Self {
            artifact_key: parse_non_empty(raw(ENV_INDEX_KEY).as_deref())
                .unwrap_or(defaults.artifact_key),
            partial_index_name: parse_non_empty(raw(ENV_PARTIAL_INDEX_NAME).as_deref())
                .unwrap_or(defaults.partial_index_name),
            excluded_category: parse_non_empty(raw(ENV_EXCLUDED_CATEGORY).as_deref())
                .unwrap_or(defaults.excluded_category),
            accepted_categories: parse_list(raw(ENV_ACCEPTED_CATEGORIES).as_deref())
                .unwrap_or(defaults.accepted_categories),
            max_age: chrono::Duration::hours(hours as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub full_query_batch_size: usize,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_PAGE_SIZE,
            full_query_batch_size: DEFAULT_FULL_QUERY_BATCH_SIZE,
            timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
        }
    }
}

impl SearchConfig {
    fn parse(raw: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_page_size = parse_usize(raw(ENV_MAX_PAGE_SIZE).as_deref(), DEFAULT_PAGE_SIZE, 1);
        let default_page_size = parse_usize(
            raw(ENV_DEFAULT_PAGE_SIZE).as_deref(),
            DEFAULT_PAGE_SIZE.min(max_page_size),
            1,
        );
        if default_page_size > max_page_size {
            return Err(QueryError::Config(format!(
                "{ENV_DEFAULT_PAGE_SIZE} ({default_page_size}) exceeds {ENV_MAX_PAGE_SIZE} ({max_page_size})"
            )));
        }
        let full_query_batch_size = parse_usize(
            raw(ENV_FULL_QUERY_BATCH_SIZE).as_deref(),
            DEFAULT_FULL_QUERY_BATCH_SIZE,
            1,
        )
        .min(max_page_size);
        let timeout_secs = parse_u64(
            raw(ENV_SEARCH_TIMEOUT_SECS).as_deref(),
            DEFAULT_SEARCH_TIMEOUT_SECS,
            1,
        );
        Ok(Self {
            default_page_size,
            max_page_size,
            full_query_batch_size,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_SESSION_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    fn parse(raw: &impl Fn(&str) -> Option<String>) -> Self {
        let mut key_prefix = parse_non_empty(raw(ENV_SESSION_PREFIX).as_deref())
            .unwrap_or_else(|| DEFAULT_SESSION_PREFIX.to_string());
        if !key_prefix.ends_with('/') {
            key_prefix.push('/');
        }
        Self { key_prefix }
    }
}

#[cfg(test)]
mod tests;
