use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use crate::modules::ModuleError;

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = "synapsesync";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// The slice of the GitHub REST API the module needs.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Most recent public events for `username`, newest first.
    async fn user_events(
        &self,
        username: &str,
        token: Option<&str>,
        per_page: u32,
    ) -> Result<Vec<Value>, ModuleError>;

    /// Succeeds if the credentials are accepted (`/user`) or the user exists (`/users/{name}`).
    async fn check_credentials(&self, username: &str, token: Option<&str>)
        -> Result<(), ModuleError>;
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str, token: Option<&str>, timeout: Duration) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, ACCEPT)
            .timeout(timeout);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, ModuleError> {
        let response = request
            .send()
            .await
            .map_err(|e| ModuleError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModuleError::Upstream(format!("{} - {}", status, body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn user_events(
        &self,
        username: &str,
        token: Option<&str>,
        per_page: u32,
    ) -> Result<Vec<Value>, ModuleError> {
        let request = self
            .get(&format!("/users/{}/events", username), token, FETCH_TIMEOUT)
            .query(&[("per_page", per_page)]);

        Self::send(request)
            .await?
            .json::<Vec<Value>>()
            .await
            .map_err(|e| ModuleError::Upstream(format!("Invalid events payload: {}", e)))
    }

    async fn check_credentials(
        &self,
        username: &str,
        token: Option<&str>,
    ) -> Result<(), ModuleError> {
        let path = match token {
            Some(_) => "/user".to_string(),
            None => format!("/users/{}", username),
        };
        Self::send(self.get(&path, token, PROBE_TIMEOUT)).await?;
        Ok(())
    }
}
