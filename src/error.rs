use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum GradeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("dataset is missing required column: {0}")]
    DatasetColumn(String),

    #[error("chemical dataset is not loaded")]
    DatasetUnavailable,

    #[error("invalid username or password")]
    AuthFailed,

    #[error("not signed in")]
    Unauthenticated,

    #[error("admin role required")]
    Forbidden,

    #[error("username already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("the admin account cannot be deleted")]
    ProtectedUser,

    #[error("{0}")]
    Validation(String),
}

impl IntoResponse for GradeError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            GradeError::Io(_)
            | GradeError::Csv(_)
            | GradeError::Json(_)
            | GradeError::Database(_)
            | GradeError::Config(_)
            | GradeError::DatasetColumn(_) => {
                // Internals stay in the logs, never in the response body.
                error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                    },
                )
            }
            GradeError::DatasetUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody {
                    code: "DATASET_UNAVAILABLE".to_string(),
                    message: "查询功能暂不可用，请联系管理员。".to_string(),
                },
            ),
            GradeError::AuthFailed => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "AUTH_FAILED".to_string(),
                    message: "用户名或密码错误".to_string(),
                },
            ),
            GradeError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "UNAUTHENTICATED".to_string(),
                    message: "请登录后使用系统功能".to_string(),
                },
            ),
            GradeError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    code: "FORBIDDEN".to_string(),
                    message: "仅管理员可访问".to_string(),
                },
            ),
            GradeError::UserExists => (
                StatusCode::CONFLICT,
                ApiErrorBody {
                    code: "USER_EXISTS".to_string(),
                    message: "用户名已存在".to_string(),
                },
            ),
            GradeError::UserNotFound => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "USER_NOT_FOUND".to_string(),
                    message: "用户不存在".to_string(),
                },
            ),
            GradeError::ProtectedUser => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    code: "PROTECTED_USER".to_string(),
                    message: "不能删除管理员账户".to_string(),
                },
            ),
            GradeError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "VALIDATION".to_string(),
                    message,
                },
            ),
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
