//! CRUD 命令模板
//!
//! 每个具体命令用一个描述类型实现 [`ResourceCommand`]：名称、事务标志、
//! 属性集、资源适配器、校验规则与传给适配器的属性子集；运行时协作方
//! （适配器 + 授权策略）通过 [`CrudDeps`] 在构造时注入。
//!
//! - [`Create`]：对资源类型检查 `create?`，调用 `adapter.create`；
//! - [`Update`]：按 `id` 惰性查找目标，找不到时授权放行、由校验报告缺失；
//!   对实例检查 `update?`，调用 `adapter.update`，支持期望版本的乐观锁；
//! - [`Destroy`]：与 `Update` 同样的查找与授权方式，检查 `destroy?`，调用 `adapter.destroy`。
//!
//! 适配器拒绝写入时，行级错误被复制到命令上并请求中止。
//!
mod create;
mod destroy;
mod update;

pub use create::Create;
pub use destroy::Destroy;
pub use update::Update;

use crate::error::{AppError, AppResult};
use crate::policy::Policy;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use usecase_domain::attributes::{AttributeSet, Attributes};
use usecase_domain::persist::ResourceAdapter;
use usecase_domain::resource::{Resource, parse_id};
use usecase_domain::validation::{ErrorKind, ValidationErrors, Validator};

/// 框架字段：不会被直接写入资源
pub const FRAMEWORK_FIELDS: [&str; 3] = ["id", "current_user", "lock_version"];

/// 缺失目标资源时报告错误的属性名
pub const RESOURCE: &str = "resource";

/// 描述类型对应的资源类型
pub type ResourceOf<D> = <<D as ResourceCommand>::Adapter as ResourceAdapter>::Resource;

/// 资源命令描述
///
/// ```rust,ignore
/// struct CreatePostSpec;
///
/// impl ResourceCommand for CreatePostSpec {
///     const NAME: &'static str = "posts.create";
///     type Attrs = PostAttrs;
///     type Adapter = InMemoryStore<Post>;
///
///     fn rules(_deps: &CrudDeps<Self::Adapter>) -> Validator<PostAttrs> {
///         Validator::new().presence("title")
///     }
/// }
///
/// type CreatePost = Create<CreatePostSpec>;
/// ```
pub trait ResourceCommand: Send + Sync + 'static {
    const NAME: &'static str;

    const TRANSACTIONAL: bool = true;

    type Attrs: AttributeSet;

    type Adapter: ResourceAdapter;

    /// 校验规则，在构造命令时建立一次
    fn rules(_deps: &CrudDeps<Self::Adapter>) -> Validator<Self::Attrs> {
        Validator::new()
    }

    /// 传给适配器的属性子集：扩展点，可注入派生字段或来自操作主体的值
    fn write_attributes(attrs: &Self::Attrs) -> AppResult<Attributes> {
        Ok(attrs.to_attributes()?.without(&FRAMEWORK_FIELDS))
    }

    /// 目标资源的标识（更新/删除），默认取属性包中的 `id`
    ///
    /// 无法解析的标识按“找不到资源”处理，由校验报告 `resource must be present`。
    fn resource_id(attrs: &Self::Attrs) -> AppResult<Option<<ResourceOf<Self> as Resource>::Id>> {
        let attributes = attrs.to_attributes()?;
        Ok(attributes
            .present("id")
            .and_then(parse_id::<ResourceOf<Self>>))
    }

    /// 期望的资源版本（乐观锁），默认取属性包中的 `lock_version`
    fn expected_version(attrs: &Self::Attrs) -> AppResult<Option<usize>> {
        let attributes = attrs.to_attributes()?;
        Ok(attributes
            .present("lock_version")
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok()))
    }
}

/// CRUD 命令的运行时协作方
pub struct CrudDeps<A: ResourceAdapter> {
    pub adapter: Arc<A>,
    pub policy: Arc<dyn Policy<A::Resource>>,
}

impl<A: ResourceAdapter> CrudDeps<A> {
    pub fn new(adapter: Arc<A>, policy: Arc<dyn Policy<A::Resource>>) -> Self {
        Self { adapter, policy }
    }
}

impl<A: ResourceAdapter> Clone for CrudDeps<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// 惰性查找目标资源：同一命令实例内只查询一次
async fn resolve<'a, D: ResourceCommand>(
    slot: &'a OnceCell<Option<ResourceOf<D>>>,
    attrs: &D::Attrs,
    adapter: &D::Adapter,
) -> AppResult<Option<&'a ResourceOf<D>>> {
    let found = slot
        .get_or_try_init(|| async {
            match D::resource_id(attrs)? {
                Some(id) => Ok::<_, AppError>(adapter.find_by_id(&id).await?),
                None => Ok(None),
            }
        })
        .await?;
    Ok(found.as_ref())
}

fn require_resource(errors: &mut ValidationErrors, found: bool) {
    if !found {
        errors.add(RESOURCE, ErrorKind::Required, "must be present");
    }
}

/// 把适配器的行级错误复制到命令上
fn copy_errors(errors: &mut ValidationErrors, rejected: ValidationErrors) {
    if rejected.is_empty() {
        errors.add_base(ErrorKind::Invalid, "could not be saved");
    } else {
        errors.merge(rejected);
    }
}
