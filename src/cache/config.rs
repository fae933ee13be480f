use std::{num::NonZeroUsize, time::Duration};

const DEFAULT_HOME_TTL: Duration = Duration::from_secs(20);
const DEFAULT_MAX_ENTRIES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    /// How long a rendered home page is served before being recomputed.
    pub home_ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            home_ttl: DEFAULT_HOME_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            home_ttl: Duration::from_secs(u64::from(settings.home_ttl_seconds.get())),
            max_entries: settings.max_entries.get() as usize,
        }
    }
}

impl CacheConfig {
    /// Entry bound for the LRU store, clamping zero to one.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
