//! HTTP-backed subtitle service.
//! Speaks a small JSON API: `POST /login`, `GET /search`, `POST /logout`.

use super::{SubtitleRecord, SubtitleService};
use crate::config::SubtitleServiceConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Subtitle service reached over HTTP with a bearer session token.
pub struct HttpSubtitleService {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    user_agent: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    useragent: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl HttpSubtitleService {
    pub fn new(config: &SubtitleServiceConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl SubtitleService for HttpSubtitleService {
    async fn login(&self) -> Result<String> {
        trace!("login base_url={}", self.base_url);
        let body = LoginRequest {
            username: &self.username,
            password: &self.password,
            useragent: &self.user_agent,
        };
        let resp = self
            .client
            .post(self.endpoint("login"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let login: LoginResponse = resp.json().await?;
        if login.token.is_empty() {
            return Err(anyhow!("subtitle service returned an empty token"));
        }
        Ok(login.token)
    }

    async fn search_for_title(
        &self,
        token: &str,
        language: Option<&str>,
        query: &str,
    ) -> Result<Vec<SubtitleRecord>> {
        trace!("search_for_title query={query:?} language={language:?}");
        let mut req = self
            .client
            .get(self.endpoint("search"))
            .bearer_auth(token)
            .query(&[("query", query)]);
        if let Some(lang) = language {
            req = req.query(&[("language", lang)]);
        }
        let resp = req.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn logout(&self, token: &str) -> Result<()> {
        self.client
            .post(self.endpoint("logout"))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
