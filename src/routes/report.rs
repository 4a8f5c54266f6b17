//! Handler for the capacity-provider placement report.
//!
//! Performs the three upstream calls in sequence: list the tasks in the
//! list cluster, describe them against the describe cluster, then ask the
//! local metadata endpoint which task this container is. Any failure aborts
//! the request; no partial report is ever returned.

use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use tracing::instrument;

use crate::ecs::build_task_report;
use crate::error::{AppErrorResponse, ResultExt};
use crate::middleware::RequestId;
use crate::state::AppState;

/// The response envelope for `GET /`.
#[derive(Debug, Serialize)]
pub struct PlacementReport {
    /// ARN of the task serving this request
    #[serde(rename = "MY_ARN")]
    pub my_arn: String,
    /// Every task in the cluster mapped to its capacity provider
    #[serde(rename = "ALL_TASKS")]
    pub all_tasks: HashMap<String, String>,
}

/// Placement report handler.
///
/// The list and describe calls deliberately target different clusters; see
/// `EcsConfig` for the contract.
#[instrument(name = "report::index", skip(state, request_id))]
pub async fn index(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<PlacementReport>, AppErrorResponse> {
    let ecs = &state.config.ecs;

    let arns = state
        .control_plane
        .list_tasks(&ecs.list_cluster)
        .await
        .with_request_id(&request_id)?;

    // DescribeTasks rejects an empty task list; an empty cluster is simply
    // an empty report.
    let descriptions = if arns.is_empty() {
        Vec::new()
    } else {
        state
            .control_plane
            .describe_tasks(&ecs.describe_cluster, &arns)
            .await
            .with_request_id(&request_id)?
    };

    let all_tasks = build_task_report(&descriptions);

    let my_arn = state
        .metadata
        .fetch_task_arn()
        .await
        .with_request_id(&request_id)?;

    Ok(Json(PlacementReport { my_arn, all_tasks }))
}
