//! ヘルスチェック機能
//!
//! 監視対象URLの UP/DOWN 状態機械と、それを一定間隔で駆動するティッカー。

pub mod monitor;
pub mod ticker;

pub use monitor::HealthMonitor;
pub use ticker::HealthTicker;
