//! タスク投入API
//!
//! `POST /a2a/agent/:agent_id` でJSON-RPCエンベロープを受け取り、202で即時応答する。

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::error::AppError;
use crate::common::protocol::{AcceptedResponse, JsonRpcRequest};
use crate::AppState;

/// POST /a2a/agent/:agent_id - タスク投入
pub async fn submit_task(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    payload: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    let Json(envelope) = payload?;
    let accepted = state.tasks.submit(&agent_id, &envelope).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}
