use usecase_domain::error::DomainError;

/// 应用层致命错误
///
/// 四种可预期的失败（无效、未授权、过期、中止）以 [`Outcome`](crate::outcome::Outcome)
/// 表达；这里只收录需要调用方自行处理的意外情况。
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("configuration: {0}")]
    Configuration(String),

    #[error("invalid outcome name: {0}")]
    InvalidOutcome(String),

    #[error("command already registered: command={command}")]
    AlreadyRegisteredCommand { command: &'static str },

    #[error("command not registered: {0}")]
    CommandNotRegistered(String),

    #[error("queue: {0}")]
    Queue(String),
}

pub type AppResult<T> = Result<T, AppError>;
