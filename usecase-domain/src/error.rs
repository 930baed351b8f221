//! 领域层统一错误定义
//!
//! 这里只收录“致命/意外”错误：属性构造失败、适配器与存储故障、配置错误等。
//! 用户可见的校验错误不在此列，见 [`ValidationErrors`](crate::validation::ValidationErrors)。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化/属性 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid attributes for {target}: {reason}")]
    InvalidAttributes { target: &'static str, reason: String },

    // --- 仓储/持久化 ---
    #[error("adapter error: resource={resource}, reason={reason}")]
    Adapter {
        resource: &'static str,
        reason: String,
    },
    #[error("database error: {reason}")]
    Database { reason: String },
    #[error("unit of work error: {reason}")]
    UnitOfWork { reason: String },
    #[error("missing primary key: resource={resource}")]
    MissingPrimaryKey { resource: &'static str },

    // --- 协作方 ---
    #[error("collaborator error: {reason}")]
    Collaborator { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },
}

impl DomainError {
    pub fn adapter(resource: &'static str, reason: impl Into<String>) -> Self {
        DomainError::Adapter {
            resource,
            reason: reason.into(),
        }
    }

    pub fn collaborator(reason: impl Into<String>) -> Self {
        DomainError::Collaborator {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 sqlx 等错误转换为 DomainError

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound {
                reason: "row not found".to_string(),
            },
            other => DomainError::Database {
                reason: other.to_string(),
            },
        }
    }
}
