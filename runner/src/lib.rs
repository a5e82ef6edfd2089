use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Production endpoint of the text-continuation service.
pub const DEFAULT_ENDPOINT: &str = "https://pelevin.gpt.dobro.ai/generate/";

// The upstream service only answers requests that look like they come
// from its own web application.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4000.1";
const ORIGIN: &str = "https://porfirevich.ru";

#[derive(Serialize, Debug, Clone)]
pub struct Query {
    pub prompt: String,
    pub length: u32,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Generation {
    pub replies: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bad http code {status}: {body}")]
    Service { status: u16, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A neural network runner: turns a prompt into generated continuations.
#[async_trait]
pub trait NetRunner: Send + Sync {
    async fn query(&self, q: Query) -> Result<Generation, RunnerError>;
}

#[async_trait]
impl<T: NetRunner + ?Sized> NetRunner for std::sync::Arc<T> {
    async fn query(&self, q: Query) -> Result<Generation, RunnerError> {
        (**self).query(q).await
    }
}

pub struct HttpRunner {
    client: reqwest::Client,
    endpoint: String,
}

impl Debug for HttpRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRunner")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpRunner {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for HttpRunner {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl NetRunner for HttpRunner {
    async fn query(&self, q: Query) -> Result<Generation, RunnerError> {
        tracing::debug!("Querying [{}] with {:?}", self.endpoint, q);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ORIGIN, ORIGIN)
            .json(&q)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            // The body read can fail after a bad status; the status is
            // the error either way.
            let body = response.text().await.unwrap_or_default();
            return Err(RunnerError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
