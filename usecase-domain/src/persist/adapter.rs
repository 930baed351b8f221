use crate::attributes::Attributes;
use crate::error::DomainResult;
use crate::resource::Resource;
use crate::validation::ValidationErrors;
use async_trait::async_trait;
use serde_json::Value;

/// 一次写操作的结果
///
/// 写入被拒绝（例如行级约束不满足）不是致命错误：资源与行级错误一并返回，
/// 由命令复制错误并请求中止。
#[derive(Debug, Clone, PartialEq)]
pub enum Write<R> {
    Persisted(R),
    Rejected { resource: R, errors: ValidationErrors },
}

impl<R> Write<R> {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Write::Persisted(_))
    }

    pub fn resource(&self) -> &R {
        match self {
            Write::Persisted(resource) | Write::Rejected { resource, .. } => resource,
        }
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Write::Persisted(_) => None,
            Write::Rejected { errors, .. } => Some(errors),
        }
    }

    pub fn into_resource(self) -> R {
        match self {
            Write::Persisted(resource) | Write::Rejected { resource, .. } => resource,
        }
    }
}

/// 资源适配器：CRUD 命令委托读写的持久化协作方
#[async_trait]
pub trait ResourceAdapter: Send + Sync + 'static {
    type Resource: Resource;

    async fn create(&self, attributes: &Attributes) -> DomainResult<Write<Self::Resource>>;

    async fn find_by_id(
        &self,
        id: &<Self::Resource as Resource>::Id,
    ) -> DomainResult<Option<Self::Resource>>;

    async fn update(
        &self,
        resource: Self::Resource,
        attributes: &Attributes,
    ) -> DomainResult<Write<Self::Resource>>;

    async fn destroy(&self, resource: Self::Resource) -> DomainResult<Write<Self::Resource>>;

    /// 主键属性名；`None` 表示未配置主键，唯一性校验将视为配置错误
    fn primary_key(&self) -> Option<&str>;

    /// 是否存在满足全部等值条件的行；`excluding` 为需排除的主键值
    async fn exists(&self, conditions: &Attributes, excluding: Option<&Value>)
    -> DomainResult<bool>;
}
