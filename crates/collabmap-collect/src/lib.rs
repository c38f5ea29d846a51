//! Collection stage: roster pages → faculty names → scholar profiles →
//! raw co-author affiliation strings.
//!
//! Everything here talks to the network and is allowed to fail; the
//! affiliation pipeline in `collabmap-core` only ever sees the strings
//! this crate produces.

use std::time::Duration;

use thiserror::Error;

pub mod collector;
pub mod fetch;
pub mod romanize;
pub mod roster;
pub mod scholar;

pub use collector::{CollectEvent, Collector};
pub use fetch::{FetchPolicy, Fetcher};
pub use romanize::{NameRomanizer, ReverseOrder, Verbatim, romanizer_for};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid CSS selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
    #[error("invalid proxy {proxy:?}: {message}")]
    Proxy { proxy: String, message: String },
}

/// Browser identities rotated across requests.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Co-author affiliation lines in the sidebar of a scholar profile.
pub const DEFAULT_COAUTHOR_SELECTOR: &str =
    "#gsc_rsb_co > ul > li > div > span:nth-of-type(2) > span:nth-of-type(1)";

/// Resolved collection settings.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub top_k: usize,
    pub policy: FetchPolicy,
    /// Pause between profile lookups, picked uniformly in this range.
    pub delay_min: Duration,
    pub delay_max: Duration,
    pub proxy: Option<String>,
    pub user_agents: Vec<String>,
    pub search_urls: Vec<String>,
    pub coauthor_selector: String,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            policy: FetchPolicy::default(),
            delay_min: Duration::from_secs(2),
            delay_max: Duration::from_secs(5),
            proxy: None,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            search_urls: vec![DEFAULT_SEARCH_URL.to_string()],
            coauthor_selector: DEFAULT_COAUTHOR_SELECTOR.to_string(),
        }
    }
}

impl CollectOptions {
    /// Overlay the `[collect]` section of a config file on the defaults.
    pub fn from_config(config: Option<&collabmap_core::config_file::CollectConfig>) -> Self {
        let mut opts = Self::default();
        let Some(c) = config else {
            return opts;
        };
        if let Some(k) = c.top_k {
            opts.top_k = k;
        }
        if let Some(n) = c.max_attempts {
            opts.policy.max_attempts = n.max(1);
        }
        if let Some(secs) = c.timeout_secs {
            opts.policy.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = c.delay_min_ms {
            opts.delay_min = Duration::from_millis(ms);
        }
        if let Some(ms) = c.delay_max_ms {
            opts.delay_max = Duration::from_millis(ms);
        }
        if opts.delay_max < opts.delay_min {
            opts.delay_max = opts.delay_min;
        }
        opts.proxy = c.proxy.clone();
        if let Some(uas) = c.user_agents.as_ref().filter(|v| !v.is_empty()) {
            opts.user_agents = uas.clone();
        }
        if let Some(urls) = c.search_urls.as_ref().filter(|v| !v.is_empty()) {
            opts.search_urls = urls.clone();
        }
        if let Some(sel) = &c.coauthor_selector {
            opts.coauthor_selector = sel.clone();
        }
        opts
    }
}

/// Uniformly random duration in `[min, max]`.
pub(crate) fn random_between(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
    if hi <= lo {
        return min;
    }
    Duration::from_millis(fastrand::u64(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabmap_core::config_file::CollectConfig;

    #[test]
    fn defaults_without_config() {
        let opts = CollectOptions::from_config(None);
        assert_eq!(opts.top_k, 10);
        assert_eq!(opts.search_urls, vec![DEFAULT_SEARCH_URL]);
        assert_eq!(opts.user_agents.len(), DEFAULT_USER_AGENTS.len());
    }

    #[test]
    fn config_overrides() {
        let cfg = CollectConfig {
            top_k: Some(3),
            max_attempts: Some(0),
            delay_min_ms: Some(500),
            delay_max_ms: Some(100),
            user_agents: Some(vec![]),
            search_urls: Some(vec!["https://example.org/?q=".into()]),
            ..Default::default()
        };
        let opts = CollectOptions::from_config(Some(&cfg));
        assert_eq!(opts.top_k, 3);
        assert_eq!(opts.policy.max_attempts, 1);
        assert_eq!(opts.delay_min, Duration::from_millis(500));
        assert_eq!(opts.delay_max, Duration::from_millis(500));
        assert_eq!(opts.user_agents.len(), DEFAULT_USER_AGENTS.len());
        assert_eq!(opts.search_urls, vec!["https://example.org/?q="]);
    }

    #[test]
    fn random_between_stays_in_range() {
        let (lo, hi) = (Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..100 {
            let d = random_between(lo, hi);
            assert!(d >= lo && d <= hi);
        }
        assert_eq!(random_between(hi, lo), hi);
    }
}
