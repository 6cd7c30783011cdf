//! HTTP client for the random-profile endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{parse_profiles, RawProfile};
use url::Url;

use crate::{error::RemoteError, ProfileSource};

pub const DEFAULT_ENDPOINT: &str = "https://randomuser.me/api/";
pub const DEFAULT_RESULTS: usize = 50;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RandomUserClient {
    http: Client,
    endpoint: Url,
}

impl RandomUserClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint with `results=<count>`, replacing any `results` pair already configured.
    pub fn profiles_url(&self, count: usize) -> Url {
        let mut url = self.endpoint.clone();
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| *key != "results")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("results", &count.to_string());
        url
    }

    pub async fn fetch_profiles(&self, count: usize) -> Result<Vec<RawProfile>, RemoteError> {
        let url = self.profiles_url(count);
        tracing::info!(%url, count, "requesting profiles");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let profiles = parse_profiles(&body)?;
        tracing::debug!(received = profiles.len(), "profile response parsed");
        Ok(profiles)
    }

    pub async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ProfileSource for RandomUserClient {
    async fn fetch_users(&self, count: usize) -> Result<Vec<RawProfile>, RemoteError> {
        self.fetch_profiles(count).await
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
