use std::collections::HashMap;
use std::time::Duration;

use crate::logging::Profile;

use super::{AppConfig, DEFAULT_PAGE_SIZE};

fn config_from(pairs: &[(&str, &str)]) -> crate::Result<AppConfig> {
    let vars = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect::<HashMap<_, _>>();
    AppConfig::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn empty_environment_yields_defaults() {
    let config = config_from(&[]).expect("defaults");
    assert_eq!(config.index.artifact_key, "ads_stream.json");
    assert_eq!(config.index.partial_index_name, "quick_access_cache.json");
    assert_eq!(config.index.excluded_category, "observations");
    assert_eq!(config.index.max_age, chrono::Duration::hours(24));
    assert_eq!(
        config.index.accepted_categories,
        vec![
            "ads_passed_mass_download".to_string(),
            "ads_passed_rdo_construction".to_string()
        ]
    );
    assert_eq!(config.search.default_page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(config.search.max_page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(config.search.full_query_batch_size, 1_000);
    assert_eq!(config.search.timeout, Duration::from_secs(300));
    assert_eq!(config.session.key_prefix, "query-sessions/");
    assert_eq!(config.log_profile, Profile::Development);
}

#[test]
fn overrides_are_applied() {
    let config = config_from(&[
        ("ADQUERY_INDEX_MAX_AGE_HOURS", "1"),
        ("ADQUERY_ACCEPTED_CATEGORIES", "ads_passed_rdo_construction"),
        ("ADQUERY_MAX_PAGE_SIZE", "500"),
        ("ADQUERY_DEFAULT_PAGE_SIZE", "50"),
        ("ADQUERY_FULL_QUERY_BATCH_SIZE", "2000"),
        ("ADQUERY_SEARCH_TIMEOUT_SECS", "600"),
        ("ADQUERY_SESSION_PREFIX", "sessions"),
        ("ADQUERY_LOG_PROFILE", "production"),
    ])
    .expect("overrides");
    assert_eq!(config.index.max_age, chrono::Duration::hours(1));
    assert_eq!(
        config.index.accepted_categories,
        vec!["ads_passed_rdo_construction".to_string()]
    );
    assert_eq!(config.search.default_page_size, 50);
    assert_eq!(config.search.max_page_size, 500);
    assert_eq!(config.search.full_query_batch_size, 500);
    assert_eq!(config.search.timeout, Duration::from_secs(600));
    assert_eq!(config.session.key_prefix, "sessions/");
    assert_eq!(config.log_profile, Profile::Production);
}

#[test]
fn default_page_size_above_maximum_is_rejected() {
    let err = config_from(&[
        ("ADQUERY_MAX_PAGE_SIZE", "100"),
        ("ADQUERY_DEFAULT_PAGE_SIZE", "200"),
    ])
    .expect_err("must reject");
    assert_eq!(err.code(), "CONFIG_ERROR");
}

#[test]
fn unknown_log_profile_is_rejected() {
    let err = config_from(&[("ADQUERY_LOG_PROFILE", "verbose")]).expect_err("must reject");
    assert_eq!(err.code(), "CONFIG_ERROR");
}
