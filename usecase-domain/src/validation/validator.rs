use super::ValidationErrors;
use super::rules::{Custom, Format, Length, Presence};
use super::uniqueness::Uniqueness;
use crate::attributes::Attributes;
use crate::error::DomainResult;
use crate::persist::ResourceAdapter;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

/// 校验规则
///
/// 每条规则可以向错误集合追加零或多条错误；返回 `Err` 表示致命错误
/// （例如唯一性规则缺少主键配置），而不是校验失败。
#[async_trait]
pub trait Rule<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    async fn check(
        &self,
        target: &T,
        attributes: &Attributes,
        errors: &mut ValidationErrors,
    ) -> DomainResult<()>;
}

/// 有序规则列表
///
/// 在构造命令时以构建器方式声明，执行时逐条运行且不短路：
/// ```rust
/// use usecase_domain::validation::{Length, Validator};
///
/// #[derive(Clone)]
/// struct Post;
///
/// let validator: Validator<Post> = Validator::new()
///     .presence("title")
///     .rule(Length::max("title", 120));
/// assert_eq!(validator.len(), 2);
/// ```
pub struct Validator<T> {
    rules: Vec<Arc<dyn Rule<T>>>,
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<T> Validator<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule<R>(mut self, rule: R) -> Self
    where
        R: Rule<T> + 'static,
    {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn presence(self, attribute: &'static str) -> Self {
        self.rule(Presence::new(attribute))
    }

    pub fn format(self, attribute: &'static str, pattern: Regex) -> Self {
        self.rule(Format::new(attribute, pattern))
    }

    /// 长度上下限（任一可省略）
    pub fn length(self, attribute: &'static str, min: Option<usize>, max: Option<usize>) -> Self {
        match (min, max) {
            (Some(min), Some(max)) => self.rule(Length::between(attribute, min, max)),
            (Some(min), None) => self.rule(Length::min(attribute, min)),
            (None, Some(max)) => self.rule(Length::max(attribute, max)),
            (None, None) => self,
        }
    }

    /// 唯一性（无作用域）；需要 scope 时用 `rule(Uniqueness::new(..).scope(..))`
    pub fn uniqueness<A: ResourceAdapter>(self, adapter: Arc<A>, attribute: &'static str) -> Self {
        self.rule(Uniqueness::new(adapter, attribute))
    }

    pub fn custom<F>(self, f: F) -> Self
    where
        F: Fn(&T, &Attributes, &mut ValidationErrors) + Send + Sync + 'static,
    {
        self.rule(Custom::new(f))
    }

    /// 追加另一组规则（保持各自顺序）
    pub fn extend(mut self, other: Validator<T>) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按声明顺序执行全部规则，返回归集后的错误
    pub async fn run(&self, target: &T, attributes: &Attributes) -> DomainResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for rule in &self.rules {
            rule.check(target, attributes, &mut errors).await?;
        }
        Ok(errors)
    }
}
