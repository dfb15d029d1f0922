//! HTTP transport seam
//!
//! The caller owns the HTTP session and lends it to each operation. Anything
//! that can GET a URL and hand back the body implements [`Transport`];
//! `reqwest::Client` is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::InatConfig;
use crate::error::{InatError, Result};

/// Minimal async GET used by the resolver and the fetcher
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the response body. Non-2xx statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "GET");

        let response = self
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InatError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Build a `reqwest::Client` with the configured timeout and user agent
pub fn build_http_client(config: &InatConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub(crate) enum Reply {
        Body(String),
        Status(u16),
    }

    /// Serves canned replies in order and records every requested URL
    pub(crate) struct MockTransport {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub(crate) fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_bodies(bodies: &[&str]) -> Self {
            Self::new(bodies.iter().map(|b| Reply::Body(b.to_string())).collect())
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            // Suspend like a real request so concurrent callers interleave
            tokio::task::yield_now().await;
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request: {}", url));
            match reply {
                Reply::Body(body) => Ok(body),
                Reply::Status(status) => Err(InatError::Status {
                    status,
                    url: url.to_string(),
                }),
            }
        }
    }
}
