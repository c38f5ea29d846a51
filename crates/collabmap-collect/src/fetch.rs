//! HTTP fetching with user-agent rotation and bounded, randomized retry.
//!
//! Roster and search pages fail intermittently (throttling, empty renders).
//! Every attempt picks a fresh user agent; between attempts the fetcher
//! sleeps a random backoff so retries don't land in lockstep.

use std::time::Duration;

use crate::{CollectError, CollectOptions, random_between};

const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

/// Retry policy for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts, first one included. Always ≥ 1.
    pub max_attempts: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            timeout: Duration::from_secs(20),
            backoff_min: Duration::from_millis(500),
            backoff_max: Duration::from_secs(3),
        }
    }
}

pub struct Fetcher {
    client: reqwest::Client,
    user_agents: Vec<String>,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Build a fetcher from collection options, routing through the
    /// configured proxy (http, https or socks5 URL) if any.
    ///
    /// Only the configured proxy is used; `HTTP_PROXY` and friends are ignored.
    pub fn new(options: &CollectOptions) -> Result<Self, CollectError> {
        let mut builder = reqwest::Client::builder()
            .timeout(options.policy.timeout)
            .no_proxy();
        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(parse_proxy(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            user_agents: options.user_agents.clone(),
            policy: options.policy.clone(),
        })
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    fn user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        Some(&self.user_agents[fastrand::usize(..self.user_agents.len())])
    }

    /// Single GET. Non-success statuses are errors.
    pub async fn fetch_once(&self, url: &str) -> Result<String, CollectError> {
        let mut req = self.client.get(url);
        if let Some(ua) = self.user_agent() {
            req = req.header(reqwest::header::USER_AGENT, ua);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CollectError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    /// GET with retries until the request succeeds.
    pub async fn fetch(&self, url: &str) -> Result<String, CollectError> {
        self.fetch_until(url, |body| Some(body.to_string())).await
    }

    /// GET with retries until `extract` finds something in the body.
    ///
    /// A page that loads but yields nothing counts as a failed attempt; some
    /// roster sites serve an empty shell under load.
    pub async fn fetch_until<T, F>(&self, url: &str, extract: F) -> Result<T, CollectError>
    where
        F: Fn(&str) -> Option<T>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(body) => match extract(&body) {
                    Some(found) => return Ok(found),
                    None => last_error = "page had no matching content".to_string(),
                },
                Err(e) => last_error = e.to_string(),
            }
            tracing::warn!(url, attempt, attempts, error = %last_error, "fetch attempt failed");

            if attempt < attempts {
                let wait = random_between(self.policy.backoff_min, self.policy.backoff_max);
                tokio::time::sleep(wait).await;
            }
        }

        Err(CollectError::Exhausted {
            url: url.to_string(),
            attempts,
            last_error,
        })
    }
}

/// A proxy URL with an explicit http, https, socks5 or socks5h scheme.
fn parse_proxy(proxy: &str) -> Result<reqwest::Proxy, CollectError> {
    let invalid = |message: String| CollectError::Proxy {
        proxy: proxy.to_string(),
        message,
    };
    let Some((scheme, _)) = proxy.split_once("://") else {
        return Err(invalid("missing scheme".to_string()));
    };
    if !PROXY_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return Err(invalid(format!("unsupported scheme {scheme:?}")));
    }
    reqwest::Proxy::all(proxy).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_proxy_rejected() {
        for proxy in ["ftp://proxy.example:21", "proxy.example:8080", "gopher://x:70"] {
            let opts = CollectOptions {
                proxy: Some(proxy.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(Fetcher::new(&opts), Err(CollectError::Proxy { .. })),
                "{proxy} accepted"
            );
        }
    }

    #[test]
    fn http_proxy_accepted() {
        for proxy in ["http://127.0.0.1:8080", "HTTPS://proxy.example:443"] {
            let opts = CollectOptions {
                proxy: Some(proxy.to_string()),
                ..Default::default()
            };
            assert!(Fetcher::new(&opts).is_ok(), "{proxy} rejected");
        }
    }

    #[test]
    fn socks_proxy_accepted() {
        let opts = CollectOptions {
            proxy: Some("socks5h://127.0.0.1:1080".to_string()),
            ..Default::default()
        };
        assert!(Fetcher::new(&opts).is_ok());
    }

    #[test]
    fn user_agent_from_pool() {
        let opts = CollectOptions {
            user_agents: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let f = Fetcher::new(&opts).unwrap();
        for _ in 0..20 {
            assert!(matches!(f.user_agent(), Some("a") | Some("b")));
        }

        let opts = CollectOptions {
            user_agents: vec![],
            ..Default::default()
        };
        assert!(Fetcher::new(&opts).unwrap().user_agent().is_none());
    }
}
