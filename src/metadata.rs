//! Client for the per-container ECS task metadata endpoint.
//!
//! The metadata endpoint is a link-local HTTP server ECS exposes to every
//! container; `GET <base>/task` describes the task the container belongs to.
//! This client only extracts the task's own ARN from that document.

use std::time::Duration;

use serde::Deserialize;

use crate::config::MetadataConfig;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata endpoint unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Metadata response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Metadata response is missing field {0}")]
    MissingField(&'static str),
}

/// The subset of the task metadata document this service reads.
#[derive(Debug, Deserialize)]
struct TaskMetadata {
    #[serde(rename = "TaskARN")]
    task_arn: Option<String>,
}

/// HTTP client bound to one container's metadata endpoint.
#[derive(Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    /// Build a client for the given base URL.
    ///
    /// The request timeout keeps a hung metadata endpoint from hanging the
    /// placement report indefinitely.
    pub fn new(base_url: String, config: &MetadataConfig) -> Result<Self, MetadataError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Fetch the ARN of the task this container belongs to.
    pub async fn fetch_task_arn(&self) -> Result<String, MetadataError> {
        let url = format!("{}/task", self.base_url);
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_task_arn(&body)
    }
}

/// Extract `TaskARN` from a task metadata document.
fn parse_task_arn(body: &str) -> Result<String, MetadataError> {
    let metadata: TaskMetadata = serde_json::from_str(body)?;
    metadata
        .task_arn
        .ok_or(MetadataError::MissingField("TaskARN"))
}
