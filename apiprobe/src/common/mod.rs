//! 共通型定義
//!
//! ドメイン型、通信プロトコル、エラー型

pub mod error;
pub mod protocol;
pub mod types;
