//! 非同期タスクプロトコル
//!
//! 受付 → 実行 → コールバックの状態機械、タスクストア、推論エージェント境界。

pub mod agent;
pub mod callback;
pub mod handler;
pub mod store;

pub use agent::{AgentOutput, AgentRequest, RuleAgent, TaskAgent};
pub use callback::CallbackClient;
pub use handler::TaskHandler;
pub use store::{TaskRecord, TaskStore};
