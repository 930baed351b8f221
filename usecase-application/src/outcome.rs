//! 终态结果（Outcome）
//!
//! 每次调用恰好产生一个结果，直接作为 `call` 的返回值；
//! 回调订阅见 [`listeners`](crate::listeners)。
//!
use crate::error::AppError;
use std::fmt;
use std::str::FromStr;
use usecase_domain::validation::ValidationErrors;

/// 一次命令调用的终态
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Invalid(ValidationErrors),
    Unauthorized,
    Stale,
    Abort(ValidationErrors),
}

impl<T> Outcome<T> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Ok(_) => OutcomeKind::Ok,
            Outcome::Invalid(_) => OutcomeKind::Invalid,
            Outcome::Unauthorized => OutcomeKind::Unauthorized,
            Outcome::Stale => OutcomeKind::Stale,
            Outcome::Abort(_) => OutcomeKind::Abort,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// `Invalid` 与 `Abort` 携带的错误
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Outcome::Invalid(errors) | Outcome::Abort(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Invalid(errors) => Outcome::Invalid(errors),
            Outcome::Unauthorized => Outcome::Unauthorized,
            Outcome::Stale => Outcome::Stale,
            Outcome::Abort(errors) => Outcome::Abort(errors),
        }
    }
}

/// 预检失败的三种结果
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Unauthorized,
    Invalid(ValidationErrors),
    Stale,
}

impl<T> From<Rejection> for Outcome<T> {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthorized => Outcome::Unauthorized,
            Rejection::Invalid(errors) => Outcome::Invalid(errors),
            Rejection::Stale => Outcome::Stale,
        }
    }
}

/// 结果类别，亦是可订阅的事件名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Ok,
    Invalid,
    Unauthorized,
    Stale,
    Abort,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        OutcomeKind::Ok,
        OutcomeKind::Invalid,
        OutcomeKind::Unauthorized,
        OutcomeKind::Stale,
        OutcomeKind::Abort,
    ];

    pub const FAILURES: [OutcomeKind; 4] = [
        OutcomeKind::Invalid,
        OutcomeKind::Unauthorized,
        OutcomeKind::Stale,
        OutcomeKind::Abort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Ok => "ok",
            OutcomeKind::Invalid => "invalid",
            OutcomeKind::Unauthorized => "unauthorized",
            OutcomeKind::Stale => "stale",
            OutcomeKind::Abort => "abort",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutcomeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::InvalidOutcome(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usecase_domain::validation::ErrorKind;

    #[test]
    fn kinds_parse_from_their_names() {
        for kind in OutcomeKind::ALL {
            assert_eq!(kind.as_str().parse::<OutcomeKind>().unwrap(), kind);
        }
        let err = "done".parse::<OutcomeKind>().unwrap_err();
        assert!(matches!(err, AppError::InvalidOutcome(name) if name == "done"));
    }

    #[test]
    fn map_keeps_failures_untouched() {
        let mut errors = ValidationErrors::new();
        errors.add("title", ErrorKind::Blank, "can't be blank");

        let invalid: Outcome<u32> = Outcome::Invalid(errors.clone());
        let mapped = invalid.map(|n| n.to_string());
        assert_eq!(mapped.kind(), OutcomeKind::Invalid);
        assert_eq!(mapped.errors(), Some(&errors));

        assert_eq!(Outcome::Ok(2).map(|n| n * 2).ok(), Some(4));
    }

    #[test]
    fn rejections_convert_into_outcomes() {
        let outcome: Outcome<()> = Rejection::Stale.into();
        assert_eq!(outcome, Outcome::Stale);
        assert!(outcome.errors().is_none());
        assert!(!outcome.is_ok());
    }
}
