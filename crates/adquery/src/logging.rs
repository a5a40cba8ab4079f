//! Logging initialization.
//!
//! A single entry point installs the `tracing` subscriber for the process.
//! Library code only emits events; binaries and tests decide whether and how
//! they are rendered.

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{QueryError, Result};

const DEFAULT_DEVELOPMENT_FILTER: &str = "adquery=debug";
const DEFAULT_PRODUCTION_FILTER: &str = "adquery=info";

/// Output profile for the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, debug level.
    #[default]
    Development,
    /// JSON lines, info level.
    Production,
    /// Registry without a formatter; events are dropped.
    Test,
}

impl Profile {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub(crate) fn parse(raw: Option<&str>) -> Result<Self> {
        let normalized = raw.map(|value| value.trim().to_ascii_lowercase());
        match normalized.as_deref() {
            None | Some("") => Ok(Self::Development),
            Some("development" | "dev") => Ok(Self::Development),
            Some("production" | "prod" | "json") => Ok(Self::Production),
            Some("test") => Ok(Self::Test),
            Some(other) => Err(QueryError::Config(format!(
                "invalid ADQUERY_LOG_PROFILE: {other} (expected development|production|test)"
            ))),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Installs the global subscriber. Later calls are no-ops.
///
/// `RUST_LOG` overrides the profile's default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DEVELOPMENT_FILTER)),
                )
                .with_writer(std::io::stderr)
                .try_init();
        }
        Profile::Production => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_PRODUCTION_FILTER)),
                )
                .with_writer(std::io::stderr)
                .try_init();
        }
        Profile::Test => {
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::{Profile, init};

    #[test]
    fn init_is_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Development);
    }

    #[test]
    fn profile_parser_accepts_aliases() {
        assert_eq!(Profile::parse(None).expect("default"), Profile::Development);
        assert_eq!(Profile::parse(Some("JSON")).expect("json"), Profile::Production);
        assert_eq!(Profile::parse(Some(" test ")).expect("test"), Profile::Test);
        assert!(Profile::parse(Some("loud")).is_err());
    }
}
