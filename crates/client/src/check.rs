//! Backend session re-validation (`GET /api/check-session`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Path of the session-check endpoint, relative to the API base URL.
pub const CHECK_SESSION_PATH: &str = "/api/check-session";

/// Authoritative answer from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// 2xx response with `active: false`.
    Inactive,
    /// Non-success HTTP status.
    Rejected(u16),
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

/// Non-authoritative failure: the check could not be completed.
#[derive(Debug, Error)]
pub enum SessionCheckError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SessionCheck: Send + Sync {
    /// Ask the backend whether the session identified by `session_id` is live.
    async fn check(&self, session_id: Option<&str>) -> Result<SessionStatus, SessionCheckError>;
}

#[derive(Debug, Deserialize)]
struct CheckSessionResponse {
    active: bool,
}

/// HTTP session check with cookie credentials.
#[derive(Debug, Clone)]
pub struct HttpSessionCheck {
    client: reqwest::Client,
    url: String,
    cookie_name: String,
}

impl HttpSessionCheck {
    /// Build a checker against `api_url`; the stored session id is sent as the
    /// `cookie_name` cookie.
    pub fn new(
        api_url: &str,
        cookie_name: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SessionCheckError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SessionCheckError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}{}", api_url.trim_end_matches('/'), CHECK_SESSION_PATH),
            cookie_name: cookie_name.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SessionCheck for HttpSessionCheck {
    async fn check(&self, session_id: Option<&str>) -> Result<SessionStatus, SessionCheckError> {
        let mut req = self.client.get(&self.url);
        if let Some(id) = session_id {
            req = req.header(reqwest::header::COOKIE, format!("{}={}", self.cookie_name, id));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| SessionCheckError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Ok(SessionStatus::Rejected(status.as_u16()));
        }

        let body: CheckSessionResponse = resp
            .json()
            .await
            .map_err(|e| SessionCheckError::Parse(e.to_string()))?;

        Ok(if body.active {
            SessionStatus::Active
        } else {
            SessionStatus::Inactive
        })
    }
}
