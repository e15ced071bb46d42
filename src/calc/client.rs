use crate::calc::wire::{CalculateRequest, CalculateResponse, RecognitionResult};
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/calculate";

/// Anything that can turn a canvas snapshot into recognized results.
///
/// Implementations block; callers run them off the UI thread.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, request: &CalculateRequest) -> Result<Vec<RecognitionResult>>;
}

/// Posts requests to the remote calculation service.
pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ink-calc/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Recognizer for HttpRecognizer {
    fn recognize(&self, request: &CalculateRequest) -> Result<Vec<RecognitionResult>> {
        let body = serde_json::to_vec(request).context("serialize calculate request")?;
        tracing::debug!(
            endpoint = %self.endpoint,
            bytes = body.len(),
            vars = request.dict_of_vars.len(),
            "posting canvas"
        );
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .with_context(|| format!("send request to {}", self.endpoint))?;

        let status = resp.status();
        let bytes = resp.bytes().context("read response body")?;
        if !status.is_success() {
            bail!(
                "http status {} from {}: {}",
                status,
                self.endpoint,
                String::from_utf8_lossy(&bytes).trim()
            );
        }
        parse_response(&bytes)
    }
}

pub fn parse_response(bytes: &[u8]) -> Result<Vec<RecognitionResult>> {
    let response: CalculateResponse =
        serde_json::from_slice(bytes).context("decode calculate response")?;
    Ok(response.data)
}
