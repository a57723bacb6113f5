//! タスクストア
//!
//! 受付から終端状態までのタスクをメモリ上で保持する。永続化はしない。

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::error::{ProbeError, ProbeResult};
use crate::common::protocol::{CallbackTarget, TaskState, TaskSubmission};

/// タスクレコード
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// タスクID
    pub task_id: String,
    /// コンテキストID
    pub context_id: String,
    /// 宛先エージェントID
    pub agent_id: String,
    /// 元のJSON-RPC ID
    pub rpc_id: Value,
    /// 指示テキスト
    pub instruction: String,
    /// コールバック先
    pub callback: CallbackTarget,
    /// 状態
    pub state: TaskState,
    /// 作成時刻
    pub created_at: DateTime<Utc>,
    /// 更新時刻
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// 検証済みの投入からレコードを作成（状態は Received）
    pub fn new(agent_id: &str, submission: &TaskSubmission) -> Self {
        let now = Utc::now();
        Self {
            task_id: submission.task_id.clone(),
            context_id: submission.context_id.clone(),
            agent_id: agent_id.to_string(),
            rpc_id: submission.rpc_id.clone(),
            instruction: submission.instruction.clone(),
            callback: submission.callback.clone(),
            state: TaskState::Received,
            created_at: now,
            updated_at: now,
        }
    }
}

/// タスクストア
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<String, TaskRecord>>>,
}

impl TaskStore {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// タスクを受け付けて登録する（Received → Accepted）
    ///
    /// 同じIDのタスクが処理中であればエラー。
    pub async fn accept(&self, mut record: TaskRecord) -> ProbeResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&record.task_id) {
            return Err(ProbeError::InvalidRequest(format!(
                "task {} is already in progress",
                record.task_id
            )));
        }
        if !record.state.can_transition_to(TaskState::Accepted) {
            return Err(ProbeError::Internal(format!(
                "cannot accept task {} in state {}",
                record.task_id,
                record.state.as_str()
            )));
        }
        record.state = TaskState::Accepted;
        record.updated_at = Utc::now();
        tasks.insert(record.task_id.clone(), record);
        Ok(())
    }

    /// 状態を遷移させる
    pub async fn transition(&self, task_id: &str, next: TaskState) -> ProbeResult<()> {
        let mut tasks = self.tasks.write().await;
        let record = tasks
            .get_mut(task_id)
            .ok_or_else(|| ProbeError::Internal(format!("unknown task {task_id}")))?;
        if !record.state.can_transition_to(next) {
            return Err(ProbeError::Internal(format!(
                "invalid transition for task {task_id}: {} -> {}",
                record.state.as_str(),
                next.as_str()
            )));
        }
        record.state = next;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// タスクを取得
    pub async fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// タスクを破棄
    pub async fn remove(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.write().await.remove(task_id)
    }

    /// 保持しているタスク数
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// 空か
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
