//! ECS control-plane access: listing and describing tasks.
//!
//! The `ControlPlane` trait is the seam between the request handler and AWS:
//! production uses `EcsControlPlane` over an `aws_sdk_ecs::Client` built once
//! at startup, tests substitute a stub. Credentials and region resolve when
//! the client is constructed, never inside a request.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::{DESCRIBE_TASKS_MAX_BATCH, NO_CAPACITY_PROVIDER_SENTINEL};

/// A control-plane operation failure (authentication, authorization, or
/// network). Never retried.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed for cluster {cluster}: {source}")]
pub struct UpstreamError {
    operation: &'static str,
    cluster: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl UpstreamError {
    pub fn new(
        operation: &'static str,
        cluster: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            operation,
            cluster: cluster.to_string(),
            source: Box::new(source),
        }
    }
}

/// One task's placement facts, as returned by DescribeTasks.
#[derive(Debug, Clone)]
pub struct TaskDescription {
    pub task_arn: String,
    /// Absent when the task was not placed by a capacity provider strategy.
    pub capacity_provider_name: Option<String>,
}

/// The two control-plane operations the placement report needs.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// List the ARNs of all tasks in `cluster`.
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>, UpstreamError>;

    /// Describe `tasks` against `cluster`, one record per ARN the control
    /// plane knows about.
    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &[String],
    ) -> Result<Vec<TaskDescription>, UpstreamError>;
}

/// Production control plane backed by the AWS SDK.
#[derive(Clone)]
pub struct EcsControlPlane {
    client: aws_sdk_ecs::Client,
}

impl EcsControlPlane {
    pub fn new(client: aws_sdk_ecs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ControlPlane for EcsControlPlane {
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>, UpstreamError> {
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tasks()
                .cluster(cluster)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| UpstreamError::new("ListTasks", cluster, e))?;

            arns.extend(output.task_arns().iter().cloned());

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        tracing::debug!(cluster, count = arns.len(), "Listed tasks");
        Ok(arns)
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &[String],
    ) -> Result<Vec<TaskDescription>, UpstreamError> {
        let mut descriptions = Vec::with_capacity(tasks.len());

        // DescribeTasks rejects batches larger than 100 ARNs.
        for chunk in tasks.chunks(DESCRIBE_TASKS_MAX_BATCH) {
            let output = self
                .client
                .describe_tasks()
                .cluster(cluster)
                .set_tasks(Some(chunk.to_vec()))
                .send()
                .await
                .map_err(|e| UpstreamError::new("DescribeTasks", cluster, e))?;

            for task in output.tasks() {
                let Some(arn) = task.task_arn() else {
                    continue;
                };
                descriptions.push(TaskDescription {
                    task_arn: arn.to_string(),
                    capacity_provider_name: task.capacity_provider_name().map(str::to_string),
                });
            }
        }

        tracing::debug!(cluster, count = descriptions.len(), "Described tasks");
        Ok(descriptions)
    }
}

/// Build the task report: one entry per described task, mapping its ARN to
/// its capacity provider name, or the sentinel when none was recorded.
pub fn build_task_report(descriptions: &[TaskDescription]) -> HashMap<String, String> {
    descriptions
        .iter()
        .map(|d| {
            (
                d.task_arn.clone(),
                d.capacity_provider_name
                    .clone()
                    .unwrap_or_else(|| NO_CAPACITY_PROVIDER_SENTINEL.to_string()),
            )
        })
        .collect()
}
