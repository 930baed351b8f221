use super::{CrudDeps, ResourceCommand, ResourceOf, copy_errors, require_resource, resolve};
use crate::command::{Command, Interrupt};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::policy::{Action, PolicyTarget};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use usecase_domain::attributes::{AttributeSet, Attributes};
use usecase_domain::error::DomainError;
use usecase_domain::persist::{ResourceAdapter, Write};
use usecase_domain::resource::Resource;
use usecase_domain::validation::{ValidationErrors, Validator};

/// 更新命令
///
/// 目标资源按 `id` 惰性查找一次，预检与执行共用同一份结果。
/// 找不到目标时授权放行，由校验报告 `resource must be present`。
pub struct Update<D: ResourceCommand> {
    attrs: D::Attrs,
    deps: CrudDeps<D::Adapter>,
    validator: Validator<D::Attrs>,
    resource: OnceCell<Option<ResourceOf<D>>>,
}

impl<D: ResourceCommand> Update<D> {
    pub fn new(attrs: D::Attrs, deps: CrudDeps<D::Adapter>) -> Self {
        let validator = D::rules(&deps);
        Self {
            attrs,
            deps,
            validator,
            resource: OnceCell::new(),
        }
    }

    pub fn from_attributes(attributes: &Attributes, deps: CrudDeps<D::Adapter>) -> AppResult<Self> {
        Ok(Self::new(D::Attrs::from_attributes(attributes)?, deps))
    }

    pub fn attrs(&self) -> &D::Attrs {
        &self.attrs
    }

    /// 目标资源（首次调用时查询）
    pub async fn resource(&self) -> AppResult<Option<&ResourceOf<D>>> {
        resolve::<D>(&self.resource, &self.attrs, &self.deps.adapter).await
    }
}

#[async_trait]
impl<D: ResourceCommand> Command for Update<D> {
    const NAME: &'static str = D::NAME;
    const TRANSACTIONAL: bool = D::TRANSACTIONAL;
    type Output = ResourceOf<D>;

    fn attributes(&self) -> AppResult<Attributes> {
        Ok(self.attrs.to_attributes()?)
    }

    async fn is_authorized(&self, _ctx: &AppContext) -> AppResult<bool> {
        let Some(resource) = self.resource().await? else {
            return Ok(true);
        };
        self.deps
            .policy
            .check(
                self.attrs.current_user(),
                PolicyTarget::Instance(resource),
                &Action::Update,
            )
            .await
    }

    async fn validate(&self, _ctx: &AppContext) -> AppResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_resource(&mut errors, self.resource().await?.is_some());

        let attributes = self.attributes()?;
        errors.merge(self.validator.run(&self.attrs, &attributes).await?);
        Ok(errors)
    }

    async fn is_stale(&self, _ctx: &AppContext) -> AppResult<bool> {
        let expected = D::expected_version(&self.attrs)?;
        match (expected, self.resource().await?) {
            (Some(version), Some(resource)) => Ok(version != resource.version()),
            _ => Ok(false),
        }
    }

    async fn process(
        &mut self,
        _ctx: &AppContext,
        errors: &mut ValidationErrors,
    ) -> Result<Self::Output, Interrupt> {
        let resource = self.resource.take().flatten().ok_or_else(|| DomainError::NotFound {
            reason: format!("{} to update", <ResourceOf<D> as Resource>::TYPE),
        })?;

        let attributes = D::write_attributes(&self.attrs)?;
        match self.deps.adapter.update(resource, &attributes).await? {
            Write::Persisted(resource) => Ok(resource),
            Write::Rejected {
                errors: rejected, ..
            } => {
                copy_errors(errors, rejected);
                Err(Interrupt::Abort)
            }
        }
    }
}
