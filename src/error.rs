use crate::models::IneligibleKind;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    /// 连接失败 / 获取连接超时，调用方可退避重试
    #[error("Transient store error: {0}")]
    TransientStore(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already entered this lottery")]
    AlreadyEntered,

    #[error("Already joined this event")]
    AlreadyJoined,

    #[error("Gift code already redeemed by this user")]
    AlreadyRedeemed,

    #[error("Gift code has reached its usage limit")]
    Exhausted,

    #[error("Gift code has expired")]
    GiftCodeExpired,

    #[error("Gift code already exists: {0}")]
    DuplicateCode(String),

    #[error("Not eligible: {0}")]
    Ineligible(IneligibleKind),

    #[error("Insufficient points")]
    InsufficientPoints,

    #[error("Lottery is closed")]
    LotteryClosed,

    #[error("Lottery has already been drawn")]
    AlreadyDrawn,

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

/// 并发写冲突的错误信息片段：SQLite 等锁超时，Postgres 序列化失败 / 死锁
const LOCK_CONTENTION_MARKERS: [&str; 4] = [
    "database is locked",
    "database table is locked",
    "could not serialize access",
    "deadlock detected",
];

fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string();
    LOCK_CONTENTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                AppError::TransientStore(err.to_string())
            }
            ref other if is_lock_contention(other) => AppError::TransientStore(err.to_string()),
            other => AppError::DatabaseError(other),
        }
    }
}

impl AppError {
    /// 只有存储层的瞬时错误允许调用方自动重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientStore(_))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::AuthError(_) | AppError::JwtError(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::AlreadyEntered => (StatusCode::CONFLICT, "ALREADY_ENTERED"),
            AppError::AlreadyJoined => (StatusCode::CONFLICT, "ALREADY_JOINED"),
            AppError::AlreadyRedeemed => (StatusCode::CONFLICT, "ALREADY_REDEEMED"),
            AppError::Exhausted => (StatusCode::CONFLICT, "GIFT_CODE_EXHAUSTED"),
            AppError::GiftCodeExpired => (StatusCode::GONE, "GIFT_CODE_EXPIRED"),
            AppError::DuplicateCode(_) => (StatusCode::CONFLICT, "DUPLICATE_CODE"),
            AppError::Ineligible(kind) => (StatusCode::FORBIDDEN, kind.error_code()),
            AppError::InsufficientPoints => (StatusCode::BAD_REQUEST, "INSUFFICIENT_POINTS"),
            AppError::LotteryClosed => (StatusCode::CONFLICT, "LOTTERY_CLOSED"),
            AppError::AlreadyDrawn => (StatusCode::CONFLICT, "ALREADY_DRAWN"),
            AppError::TransientStore(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_STORE_ERROR")
            }
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::ConfigError(_)
            | AppError::InternalError(_)
            | AppError::SerdeJsonError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code) = self.status_and_code();

        // 5xx 不向客户端暴露内部细节
        let message = match self {
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::TransientStore(msg) => {
                log::warn!("Transient store error: {msg}");
                "Service temporarily unavailable, please retry".to_string()
            }
            AppError::ConfigError(_) | AppError::InternalError(_) | AppError::SerdeJsonError(_) => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
            AppError::AuthError(_) | AppError::JwtError(_) | AppError::Forbidden => {
                log::warn!("Rejected request: {self}");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let mut builder = HttpResponse::build(status_code);
        if self.is_retryable() {
            builder.insert_header(("Retry-After", "1"));
        }
        builder.json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_distinguishable() {
        assert_eq!(
            AppError::AlreadyRedeemed.status_and_code(),
            (StatusCode::CONFLICT, "ALREADY_REDEEMED")
        );
        assert_eq!(
            AppError::Exhausted.status_and_code(),
            (StatusCode::CONFLICT, "GIFT_CODE_EXHAUSTED")
        );
        assert_eq!(
            AppError::Ineligible(IneligibleKind::Level).status_and_code(),
            (StatusCode::FORBIDDEN, "INELIGIBLE_LEVEL")
        );
        assert_eq!(
            AppError::Forbidden.status_and_code().0,
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        let err: AppError = DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".into())).into();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(
            err.error_response()
                .headers()
                .contains_key("Retry-After")
        );

        let err: AppError = DbErr::Custom("boom".into()).into();
        assert!(!err.is_retryable());
        assert!(!AppError::AlreadyDrawn.is_retryable());
    }

    #[test]
    fn test_lock_contention_is_retryable() {
        let busy = DbErr::Exec(sea_orm::RuntimeErr::Internal(
            "error returned from database: (code: 5) database is locked".into(),
        ));
        let err: AppError = busy.into();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let serialization = DbErr::Query(sea_orm::RuntimeErr::Internal(
            "could not serialize access due to concurrent update".into(),
        ));
        assert!(AppError::from(serialization).is_retryable());
    }
}
