use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Quiz, QuizId, QuizResult, Submission};
use reqwest::{Client, RequestBuilder, StatusCode};
use thiserror::Error;
use url::Url;

use crate::repository::{Backend, GatewayError, GradingService, QuizSource};

mod mapping;

use mapping::{QuizDto, error_detail};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpConfigError {
    #[error("invalid API base url: {raw}")]
    InvalidUrl { raw: String },
    #[error("invalid request timeout: {raw}")]
    InvalidTimeout { raw: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct HttpBackendConfig {
    pub base_url: Url,
    /// Opaque bearer token from the identity provider.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    /// Build a config for `base_url` with no token and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpConfigError::InvalidUrl` if `base_url` cannot be used as a base.
    pub fn new(base_url: &str) -> Result<Self, HttpConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Read `QUIZ_API_URL`, `QUIZ_API_TOKEN` and `QUIZ_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `HttpConfigError` if the url or timeout cannot be parsed.
    pub fn from_env() -> Result<Self, HttpConfigError> {
        let base_url = env::var("QUIZ_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(&base_url)?.with_env_overrides()
    }

    /// Apply `QUIZ_API_TOKEN` (only when no token is set) and `QUIZ_API_TIMEOUT_SECS`
    /// to a config whose base url came from elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `HttpConfigError::InvalidTimeout` if the timeout cannot be parsed.
    pub fn with_env_overrides(self) -> Result<Self, HttpConfigError> {
        let token = self
            .token
            .clone()
            .or_else(|| env::var("QUIZ_API_TOKEN").ok());
        self.with_token(token)
            .with_timeout_secs(env::var("QUIZ_API_TIMEOUT_SECS").ok())
    }

    /// Set the request timeout from a raw seconds value; `None` keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `HttpConfigError::InvalidTimeout` unless `raw` is a positive integer.
    pub fn with_timeout_secs(mut self, raw: Option<String>) -> Result<Self, HttpConfigError> {
        if let Some(raw) = raw {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(HttpConfigError::InvalidTimeout { raw })?;
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, HttpConfigError> {
    Url::parse(raw.trim())
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .ok_or_else(|| HttpConfigError::InvalidUrl { raw: raw.to_owned() })
}

/// REST client for the quiz backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `HttpConfigError::Client` if the HTTP client cannot be built.
    pub fn new(config: HttpBackendConfig) -> Result<Self, HttpConfigError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Transport("base url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String, GatewayError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }
        if !status.is_success() {
            let detail = error_detail(&body);
            tracing::warn!(%status, ?detail, "quiz backend rejected request");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body)
    }
}

impl Backend {
    #[must_use]
    pub fn http(backend: HttpBackend) -> Self {
        Self {
            quizzes: Arc::new(backend.clone()),
            grading: Arc::new(backend),
        }
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

fn decode(e: serde_json::Error) -> GatewayError {
    GatewayError::Decode(e.to_string())
}

#[async_trait]
impl QuizSource for HttpBackend {
    async fn fetch_quiz(&self, id: &QuizId) -> Result<Quiz, GatewayError> {
        let url = self.endpoint(&["quizzes", id.as_str()])?;
        tracing::debug!(%url, "fetching quiz");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        let body = Self::read_body(response).await?;

        let dto: QuizDto = serde_json::from_str(&body).map_err(decode)?;
        Ok(dto.into_draft()?.validate()?)
    }
}

#[async_trait]
impl GradingService for HttpBackend {
    async fn submit(
        &self,
        quiz_id: &QuizId,
        submission: &Submission,
    ) -> Result<QuizResult, GatewayError> {
        let url = self.endpoint(&["quizzes", quiz_id.as_str(), "submit"])?;
        tracing::debug!(%url, answers = submission.answers.len(), "submitting quiz");

        let response = self
            .authorize(self.client.post(url))
            .json(submission)
            .send()
            .await
            .map_err(transport)?;
        let body = Self::read_body(response).await?;

        serde_json::from_str(&body).map_err(decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_and_escapes_ids() {
        let config = HttpBackendConfig::new("https://lms.example.com/api/").unwrap();
        let backend = HttpBackend::new(config).unwrap();
        let url = backend
            .endpoint(&["quizzes", "a b", "submit"])
            .unwrap();
        assert_eq!(url.as_str(), "https://lms.example.com/api/quizzes/a%20b/submit");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(
            HttpBackendConfig::new("mailto:someone@example.com"),
            Err(HttpConfigError::InvalidUrl { .. })
        ));
        assert!(HttpBackendConfig::new("not a url").is_err());
    }

    #[test]
    fn timeout_accepts_positive_seconds_only() {
        let config = HttpBackendConfig::new("http://10.0.0.5:9000").unwrap();
        assert_eq!(
            config.clone().with_timeout_secs(None).unwrap().timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert_eq!(
            config
                .clone()
                .with_timeout_secs(Some(" 30 ".into()))
                .unwrap()
                .timeout,
            Duration::from_secs(30)
        );
        assert!(matches!(
            config.clone().with_timeout_secs(Some("0".into())),
            Err(HttpConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            config.with_timeout_secs(Some("soon".into())),
            Err(HttpConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn blank_token_is_dropped() {
        let config = HttpBackendConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_token(Some("  ".into()));
        assert!(config.token.is_none());
    }
}
