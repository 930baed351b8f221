use super::{ErrorKind, Rule, ValidationErrors};
use crate::attributes::Attributes;
use crate::error::DomainResult;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

/// 存在性：缺失、null、空白字符串、空数组/对象均视为空
pub struct Presence {
    attribute: &'static str,
}

impl Presence {
    pub fn new(attribute: &'static str) -> Self {
        Self { attribute }
    }
}

pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

#[async_trait]
impl<T> Rule<T> for Presence
where
    T: Send + Sync + 'static,
{
    async fn check(
        &self,
        _target: &T,
        attributes: &Attributes,
        errors: &mut ValidationErrors,
    ) -> DomainResult<()> {
        if is_blank(attributes.get(self.attribute)) {
            errors.add(self.attribute, ErrorKind::Blank, "can't be blank");
        }
        Ok(())
    }
}

/// 格式：字符串需匹配正则；缺失或 null 时跳过（交给存在性规则）
pub struct Format {
    attribute: &'static str,
    pattern: Regex,
}

impl Format {
    pub fn new(attribute: &'static str, pattern: Regex) -> Self {
        Self { attribute, pattern }
    }
}

#[async_trait]
impl<T> Rule<T> for Format
where
    T: Send + Sync + 'static,
{
    async fn check(
        &self,
        _target: &T,
        attributes: &Attributes,
        errors: &mut ValidationErrors,
    ) -> DomainResult<()> {
        match attributes.present(self.attribute) {
            None => {}
            Some(Value::String(s)) if self.pattern.is_match(s) => {}
            Some(_) => errors.add(self.attribute, ErrorKind::Invalid, "is invalid"),
        }
        Ok(())
    }
}

/// 长度：按字符计数；缺失或 null 时跳过
pub struct Length {
    attribute: &'static str,
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn min(attribute: &'static str, min: usize) -> Self {
        Self {
            attribute,
            min: Some(min),
            max: None,
        }
    }

    pub fn max(attribute: &'static str, max: usize) -> Self {
        Self {
            attribute,
            min: None,
            max: Some(max),
        }
    }

    pub fn between(attribute: &'static str, min: usize, max: usize) -> Self {
        Self {
            attribute,
            min: Some(min),
            max: Some(max),
        }
    }
}

#[async_trait]
impl<T> Rule<T> for Length
where
    T: Send + Sync + 'static,
{
    async fn check(
        &self,
        _target: &T,
        attributes: &Attributes,
        errors: &mut ValidationErrors,
    ) -> DomainResult<()> {
        let len = match attributes.present(self.attribute) {
            None => return Ok(()),
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(a)) => a.len(),
            Some(other) => other.to_string().chars().count(),
        };

        if let Some(min) = self.min.filter(|min| len < *min) {
            errors.add(
                self.attribute,
                ErrorKind::TooShort,
                format!("is too short (minimum is {min} characters)"),
            );
        }
        if let Some(max) = self.max.filter(|max| len > *max) {
            errors.add(
                self.attribute,
                ErrorKind::TooLong,
                format!("is too long (maximum is {max} characters)"),
            );
        }
        Ok(())
    }
}

type CustomFn<T> = Box<dyn Fn(&T, &Attributes, &mut ValidationErrors) + Send + Sync>;

/// 自定义规则（跨字段校验等）
pub struct Custom<T> {
    f: CustomFn<T>,
}

impl<T> Custom<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &Attributes, &mut ValidationErrors) + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }
}

#[async_trait]
impl<T> Rule<T> for Custom<T>
where
    T: Send + Sync + 'static,
{
    async fn check(
        &self,
        target: &T,
        attributes: &Attributes,
        errors: &mut ValidationErrors,
    ) -> DomainResult<()> {
        (self.f)(target, attributes, errors);
        Ok(())
    }
}
