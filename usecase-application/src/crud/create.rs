use super::{CrudDeps, ResourceCommand, ResourceOf, copy_errors};
use crate::command::{Command, Interrupt};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::policy::{Action, PolicyTarget};
use async_trait::async_trait;
use usecase_domain::attributes::{AttributeSet, Attributes};
use usecase_domain::persist::{ResourceAdapter, Write};
use usecase_domain::resource::Resource;
use usecase_domain::validation::{ValidationErrors, Validator};

/// 创建命令
pub struct Create<D: ResourceCommand> {
    attrs: D::Attrs,
    deps: CrudDeps<D::Adapter>,
    validator: Validator<D::Attrs>,
}

impl<D: ResourceCommand> Create<D> {
    pub fn new(attrs: D::Attrs, deps: CrudDeps<D::Adapter>) -> Self {
        let validator = D::rules(&deps);
        Self {
            attrs,
            deps,
            validator,
        }
    }

    /// 从属性包构造，未知字段返回错误
    pub fn from_attributes(attributes: &Attributes, deps: CrudDeps<D::Adapter>) -> AppResult<Self> {
        Ok(Self::new(D::Attrs::from_attributes(attributes)?, deps))
    }

    pub fn attrs(&self) -> &D::Attrs {
        &self.attrs
    }
}

#[async_trait]
impl<D: ResourceCommand> Command for Create<D> {
    const NAME: &'static str = D::NAME;
    const TRANSACTIONAL: bool = D::TRANSACTIONAL;
    type Output = ResourceOf<D>;

    fn attributes(&self) -> AppResult<Attributes> {
        Ok(self.attrs.to_attributes()?)
    }

    async fn is_authorized(&self, _ctx: &AppContext) -> AppResult<bool> {
        let target = PolicyTarget::Type(<ResourceOf<D> as Resource>::TYPE);
        self.deps
            .policy
            .check(self.attrs.current_user(), target, &Action::Create)
            .await
    }

    async fn validate(&self, _ctx: &AppContext) -> AppResult<ValidationErrors> {
        let attributes = self.attributes()?;
        Ok(self.validator.run(&self.attrs, &attributes).await?)
    }

    async fn process(
        &mut self,
        _ctx: &AppContext,
        errors: &mut ValidationErrors,
    ) -> Result<Self::Output, Interrupt> {
        let attributes = D::write_attributes(&self.attrs)?;
        match self.deps.adapter.create(&attributes).await? {
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
