use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use usecase_domain::attributes::Attributes;
use usecase_domain::error::DomainError;
use usecase_domain::validation::ValidationErrors;

/// 应用层命令（Command）
///
/// 一次封装好的业务事务：先经过固定顺序的预检（授权 → 校验 → 过期），
/// 全部通过后才执行 [`process`](Command::process)。
/// - 命令实例由创建它的调用方独占，调用即消费，不会被执行两次；
/// - 跨越延迟执行边界的只有属性包（[`attributes`](Command::attributes)），而非实例本身。
///
/// 关联常量：
/// - `NAME`：稳定名称，用于日志、追踪与延迟执行注册表；避免依赖 `type_name::<T>()`；
/// - `TRANSACTIONAL`：是否在工作单元事务中执行 `process`，按类型声明，默认 `true`。
#[async_trait]
pub trait Command: Send + Sync + Sized + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    const TRANSACTIONAL: bool = true;

    /// `Ok` 结果携带的负载（通常是受影响的资源）
    type Output: Send + 'static;

    /// 命令的属性包
    fn attributes(&self) -> AppResult<Attributes>;

    async fn is_authorized(&self, _ctx: &AppContext) -> AppResult<bool> {
        Ok(true)
    }

    /// 运行校验规则，返回空集合表示有效
    async fn validate(&self, _ctx: &AppContext) -> AppResult<ValidationErrors> {
        Ok(ValidationErrors::new())
    }

    /// 乐观并发检查钩子
    async fn is_stale(&self, _ctx: &AppContext) -> AppResult<bool> {
        Ok(false)
    }

    /// 领域逻辑
    ///
    /// 返回 `Err(Interrupt::Abort)` 请求中止：事务型命令会先回滚，
    /// 然后以 `errors` 中已累积的错误产生 `Abort` 结果。
    async fn process(
        &mut self,
        ctx: &AppContext,
        errors: &mut ValidationErrors,
    ) -> Result<Self::Output, Interrupt>;
}

/// `process` 的非正常返回
#[derive(Debug)]
pub enum Interrupt {
    /// 显式中止（回滚并返回 `Abort`）
    Abort,
    /// 意外错误，原样传播给调用方
    Fatal(AppError),
}

impl From<AppError> for Interrupt {
    fn from(err: AppError) -> Self {
        Interrupt::Fatal(err)
    }
}

impl From<DomainError> for Interrupt {
    fn from(err: DomainError) -> Self {
        Interrupt::Fatal(AppError::Domain(err))
    }
}
