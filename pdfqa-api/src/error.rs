use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pdfqa_docs::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // アップロードの入力チェックは 200 + error ペイロードで返す
            ApiError::NoFilePart | ApiError::NoSelectedFile => StatusCode::OK,
            ApiError::Multipart(e) => e.status(),
            ApiError::Store(StoreError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Io { .. }) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// クライアントに返すメッセージ。サーバー側のパスやエラーチェーンは含めない
    pub fn client_message(&self) -> String {
        if self.status().is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %format!("{self:#}"), "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_checks_keep_ok_status_and_exact_messages() {
        assert_eq!(ApiError::NoFilePart.status(), StatusCode::OK);
        assert_eq!(ApiError::NoFilePart.to_string(), "No file part");
        assert_eq!(ApiError::NoSelectedFile.status(), StatusCode::OK);
        assert_eq!(ApiError::NoSelectedFile.to_string(), "No selected file");
    }

    #[test]
    fn store_errors_map_to_client_statuses() {
        let missing = ApiError::from(StoreError::NotFound("a.pdf".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let invalid = ApiError::from(StoreError::InvalidName("..".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_are_server_errors() {
        let err = ApiError::from(anyhow::anyhow!("model exploded"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn server_errors_hide_paths_from_clients() {
        let err = ApiError::from(
            anyhow::anyhow!("invalid header")
                .context("Failed to open PDF: /srv/uploads/secret.pdf"),
        );
        assert_eq!(err.client_message(), "Internal server error");

        let io = ApiError::from(StoreError::Io {
            action: "write",
            path: "/srv/uploads/secret.pdf".into(),
            source: std::io::Error::other("disk full"),
        });
        assert_eq!(io.client_message(), "Internal server error");

        let missing = ApiError::from(StoreError::NotFound("a.pdf".into()));
        assert!(missing.client_message().contains("a.pdf"));
    }
}
