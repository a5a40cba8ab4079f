use std::fmt;

/// A parsed `{observer_id}/{category}/{timestamp}.{observation_id}` path.
///
/// A single trailing `/` is accepted, matching how observer partial indexes
/// record prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    raw: String,
    observer_id: String,
    category: String,
    timestamp: i64,
    observation_id: String,
}

impl CandidatePath {
    /// Returns `None` for anything that is not exactly three segments with a
    /// single `timestamp.id` pair in the last one.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);
        let mut segments = trimmed.split('/');
        let observer_id = segments.next()?;
        let category = segments.next()?;
        let leaf = segments.next()?;
        if segments.next().is_some() || observer_id.is_empty() || category.is_empty() {
            return None;
        }

        let (timestamp, observation_id) = leaf.split_once('.')?;
        if observation_id.is_empty() || observation_id.contains('.') {
            return None;
        }
        let timestamp = timestamp.parse::<i64>().ok()?;

        Some(Self {
            raw: raw.to_string(),
            observer_id: observer_id.to_string(),
            category: category.to_string(),
            timestamp,
            observation_id: observation_id.to_string(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn observer_id(&self) -> &str {
        &self.observer_id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn observation_id(&self) -> &str {
        &self.observation_id
    }
}

impl fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Sort key for index ordering. Unparseable paths sort first.
#[must_use]
pub fn timestamp_sort_key(raw: &str) -> i64 {
    CandidatePath::parse(raw).map_or(0, |path| path.timestamp)
}
