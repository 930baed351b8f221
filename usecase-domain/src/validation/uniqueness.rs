use super::{ErrorKind, Rule, ValidationErrors};
use crate::attributes::Attributes;
use crate::error::{DomainError, DomainResult};
use crate::persist::ResourceAdapter;
use crate::resource::{Resource, parse_id};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// 唯一性：对照适配器查询是否已有相同取值的行
///
/// - `scope` 中的属性按当前取值一并参与等值条件；
/// - 排除命令自身的资源（取属性包中主键字段的值，按资源标识类型规整，
///   因此 `"1"` 与 `1` 指向同一行）；
/// - 若该属性已被前序规则标记，则跳过查询；
/// - 适配器未配置主键属于配置错误，返回 [`DomainError::MissingPrimaryKey`]。
pub struct Uniqueness<A> {
    adapter: Arc<A>,
    attribute: &'static str,
    scope: Vec<&'static str>,
    message: String,
}

impl<A: ResourceAdapter> Uniqueness<A> {
    pub fn new(adapter: Arc<A>, attribute: &'static str) -> Self {
        Self {
            adapter,
            attribute,
            scope: Vec::new(),
            message: "has already been taken".to_string(),
        }
    }

    pub fn scope(mut self, attribute: &'static str) -> Self {
        self.scope.push(attribute);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl<T, A> Rule<T> for Uniqueness<A>
where
    T: Send + Sync + 'static,
    A: ResourceAdapter,
{
    async fn check(
        &self,
        _target: &T,
        attributes: &Attributes,
        errors: &mut ValidationErrors,
    ) -> DomainResult<()> {
        let primary_key = self
            .adapter
            .primary_key()
            .ok_or(DomainError::MissingPrimaryKey {
                resource: <A::Resource as Resource>::TYPE,
            })?;

        if errors.contains(self.attribute) {
            return Ok(());
        }
        let Some(value) = attributes.present(self.attribute) else {
            return Ok(());
        };

        let mut conditions = Attributes::new().with(self.attribute, value.clone());
        for attr in &self.scope {
            let scoped = attributes.get(attr).cloned().unwrap_or(Value::Null);
            conditions.insert(*attr, scoped);
        }

        let excluding = attributes
            .present(primary_key)
            .and_then(parse_id::<A::Resource>)
            .map(|id| serde_json::to_value(&id))
            .transpose()?;
        if self.adapter.exists(&conditions, excluding.as_ref()).await? {
            errors.add(self.attribute, ErrorKind::Taken, self.message.clone());
        }
        Ok(())
    }
}
