//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};

use crate::common::error::ProbeError;
use crate::common::protocol::{ErrorData, ErrorResponse};

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub ProbeError);

impl From<ProbeError> for AppError {
    fn from(err: ProbeError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(ProbeError::InvalidRequest(rejection.body_text()))
    }
}

impl AppError {
    /// レスポンスボディ
    ///
    /// 4xxでは詳細をそのまま返し、5xxでは内部情報を含めない。
    pub fn body(&self) -> ErrorResponse {
        let status = self.0.status_code();
        let details = if status.is_client_error() {
            self.0.to_string()
        } else {
            self.0.external_message().to_string()
        };
        ErrorResponse {
            status: "error".to_string(),
            status_code: status.as_u16(),
            message: self.0.external_message().to_string(),
            data: ErrorData { details },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.status_code().is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }
        (self.0.status_code(), Json(self.body())).into_response()
    }
}
