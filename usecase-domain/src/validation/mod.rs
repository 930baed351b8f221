//! 校验引擎（validation）
//!
//! - [`ValidationErrors`]：按属性归集、保持插入顺序的错误集合，空集合即“有效”；
//! - [`Validator`]：以构建器方式声明的有序规则列表，逐条执行、不短路；
//! - 内置规则：存在性、格式、长度、自定义（跨字段）与唯一性（对照适配器）。
//!
mod rules;
mod uniqueness;
mod validator;

pub use rules::{Custom, Format, Length, Presence};
pub use uniqueness::Uniqueness;
pub use validator::{Rule, Validator};

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// 非字段级错误使用的哨兵属性名
pub const BASE: &str = "base";

/// 错误类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Blank,
    Required,
    Invalid,
    TooShort,
    TooLong,
    Taken,
    Other(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Blank => "blank",
            ErrorKind::Required => "required",
            ErrorKind::Invalid => "invalid",
            ErrorKind::TooShort => "too_short",
            ErrorKind::TooLong => "too_long",
            ErrorKind::Taken => "taken",
            ErrorKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 单条错误：类别 + 面向用户的消息
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

/// 有序、多值的“属性 → 错误列表”映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, Vec<ErrorDetail>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: &str, kind: ErrorKind, message: impl Into<String>) {
        let detail = ErrorDetail {
            kind,
            message: message.into(),
        };
        match self.entries.iter_mut().find(|(attr, _)| attr == attribute) {
            Some((_, details)) => details.push(detail),
            None => self.entries.push((attribute.to_string(), vec![detail])),
        }
    }

    pub fn add_base(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.add(BASE, kind, message);
    }

    /// 追加另一组错误（常见于复制适配器的行级错误）
    pub fn merge(&mut self, other: ValidationErrors) {
        for (attribute, details) in other.entries {
            for detail in details {
                self.add(&attribute, detail.kind, detail.message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 等价于 `is_empty()`
    pub fn is_valid(&self) -> bool {
        self.is_empty()
    }

    /// 错误条数（非属性数）
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, d)| d.len()).sum()
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.iter().any(|(attr, _)| attr == attribute)
    }

    pub fn has(&self, attribute: &str, kind: &ErrorKind) -> bool {
        self.get(attribute).iter().any(|d| &d.kind == kind)
    }

    pub fn get(&self, attribute: &str) -> &[ErrorDetail] {
        self.entries
            .iter()
            .find(|(attr, _)| attr == attribute)
            .map(|(_, details)| details.as_slice())
            .unwrap_or(&[])
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(attr, _)| attr.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorDetail)> {
        self.entries
            .iter()
            .flat_map(|(attr, details)| details.iter().map(move |d| (attr.as_str(), d)))
    }

    /// 形如 `title can't be blank` 的完整消息，`base` 错误不带前缀
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .map(|(attr, d)| {
                if attr == BASE {
                    d.message.clone()
                } else {
                    format!("{attr} {}", d.message)
                }
            })
            .collect()
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (attribute, details) in &self.entries {
            map.serialize_entry(attribute, details)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order_per_attribute() {
        let mut errors = ValidationErrors::new();
        errors.add("title", ErrorKind::Blank, "can't be blank");
        errors.add_base(ErrorKind::Invalid, "something went wrong");
        errors.add("title", ErrorKind::TooShort, "is too short");

        assert_eq!(errors.attributes().collect::<Vec<_>>(), vec!["title", BASE]);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("title").len(), 2);
        assert!(errors.has("title", &ErrorKind::TooShort));
        assert_eq!(
            errors.full_messages(),
            vec![
                "title can't be blank".to_string(),
                "title is too short".to_string(),
                "something went wrong".to_string(),
            ]
        );
    }

    #[test]
    fn merge_appends_to_existing_attributes() {
        let mut left = ValidationErrors::new();
        left.add("email", ErrorKind::Invalid, "is invalid");
        let mut right = ValidationErrors::new();
        right.add("email", ErrorKind::Taken, "has already been taken");
        right.add("name", ErrorKind::Blank, "can't be blank");

        left.merge(right);
        assert_eq!(left.get("email").len(), 2);
        assert!(left.contains("name"));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let mut errors = ValidationErrors::new();
        errors.add("title", ErrorKind::Blank, "can't be blank");
        errors.add("body", ErrorKind::Other("spam".into()), "looks like spam");

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(
            json,
            r#"{"title":[{"kind":"blank","message":"can't be blank"}],"body":[{"kind":"spam","message":"looks like spam"}]}"#
        );
    }

    #[test]
    fn empty_means_valid() {
        let errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(errors.get("anything").is_empty());
    }
}
