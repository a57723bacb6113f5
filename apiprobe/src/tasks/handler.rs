//! 非同期タスクハンドラ
//!
//! 投入を検証して即座に受付応答を返し、実際の処理はバックグラウンドで行う。
//! 受け付けたタスクは完了・失敗のいずれでも必ず1回だけコールバックされ、その後破棄される。

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::agent::{AgentOutput, AgentRequest, TaskAgent};
use super::callback::CallbackClient;
use super::store::{TaskRecord, TaskStore};
use crate::common::error::{ProbeError, ProbeResult};
use crate::common::protocol::{
    AcceptedResponse, CallbackEnvelope, JsonRpcRequest, TaskState, TaskSubmission,
};

/// 非同期タスクハンドラ
#[derive(Clone)]
pub struct TaskHandler {
    store: TaskStore,
    agent: Arc<dyn TaskAgent>,
    callbacks: CallbackClient,
    permits: Arc<Semaphore>,
}

impl TaskHandler {
    /// 新しいハンドラを作成
    ///
    /// `max_concurrent` は同時に実行中となるタスク数の上限（受付は制限しない）。
    pub fn new(agent: Arc<dyn TaskAgent>, callbacks: CallbackClient, max_concurrent: usize) -> Self {
        Self {
            store: TaskStore::new(),
            agent,
            callbacks,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// タスクストア
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// タスクを投入する
    ///
    /// 検証に失敗した場合はバックグラウンド処理を始めずにエラーを返す（コールバックなし）。
    /// 成功した場合はネットワークI/Oを待たずに受付応答を返す。
    pub async fn submit(
        &self,
        agent_id: &str,
        envelope: &JsonRpcRequest,
    ) -> ProbeResult<AcceptedResponse> {
        let submission = match TaskSubmission::from_envelope(envelope) {
            Ok(submission) => submission,
            Err(e) => {
                warn!(agent_id = %agent_id, error = %e, "Rejected task submission");
                return Err(e);
            }
        };

        self.store
            .accept(TaskRecord::new(agent_id, &submission))
            .await?;
        info!(
            task_id = %submission.task_id,
            context_id = %submission.context_id,
            agent_id = %agent_id,
            "Task accepted"
        );

        let task_id = submission.task_id.clone();
        let handler = self.clone();
        let agent_id = agent_id.to_string();
        tokio::spawn(async move { handler.drive(agent_id, submission).await });

        Ok(AcceptedResponse::new(task_id))
    }

    async fn drive(self, agent_id: String, submission: TaskSubmission) {
        let task_id = submission.task_id.clone();

        let outcome = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(_permit) => {
                self.mark(&task_id, TaskState::Running).await;
                let request = AgentRequest {
                    task_id: task_id.clone(),
                    context_id: submission.context_id.clone(),
                    agent_id,
                    instruction: submission.instruction.clone(),
                };
                self.run_agent(request).await
            }
            Err(_) => Err(ProbeError::Internal("worker pool is closed".to_string())),
        };

        let (state, envelope) = match outcome {
            Ok(AgentOutput { text, artifacts }) => (
                TaskState::Completed,
                CallbackEnvelope::new(
                    submission.rpc_id.clone(),
                    &task_id,
                    &submission.context_id,
                    TaskState::Completed,
                    text,
                    artifacts,
                ),
            ),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Task failed");
                (
                    TaskState::Failed,
                    CallbackEnvelope::new(
                        submission.rpc_id.clone(),
                        &task_id,
                        &submission.context_id,
                        TaskState::Failed,
                        e.to_string(),
                        Vec::new(),
                    ),
                )
            }
        };
        self.mark(&task_id, state).await;

        match self.callbacks.push(&submission.callback, &envelope).await {
            Ok(()) => info!(task_id = %task_id, state = state.as_str(), "Callback delivered"),
            Err(e) => warn!(
                task_id = %task_id,
                callback_url = %submission.callback.url,
                error = %e,
                "Callback delivery failed"
            ),
        }

        self.store.remove(&task_id).await;
        debug!(task_id = %task_id, "Task discarded");
    }

    /// エージェントを別タスクで実行し、パニックも失敗として扱う
    async fn run_agent(&self, request: AgentRequest) -> ProbeResult<AgentOutput> {
        let agent = Arc::clone(&self.agent);
        match tokio::spawn(async move { agent.run(&request).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Agent task aborted");
                Err(ProbeError::Internal("agent execution aborted".to_string()))
            }
        }
    }

    async fn mark(&self, task_id: &str, state: TaskState) {
        if let Err(e) = self.store.transition(task_id, state).await {
            error!(task_id = %task_id, error = %e, "Task state transition rejected");
        }
    }
}
