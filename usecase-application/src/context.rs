use crate::deferred::{Job, JobQueue};
use crate::error::{AppError, AppResult};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use usecase_domain::persist::UnitOfWork;

/// 业务语境：链路追踪与审计主体
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    /// 关联ID
    #[builder(into)]
    correlation_id: Option<String>,
    /// 因果ID
    #[builder(into)]
    causation_id: Option<String>,
    /// 主体类型（如用户、系统、后台任务）
    #[builder(into)]
    actor_type: Option<String>,
    /// 主体ID
    #[builder(into)]
    actor_id: Option<String>,
}

impl BusinessContext {
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn with_causation_id(mut self, causation_id: impl Into<String>) -> Self {
        self.causation_id = Some(causation_id.into());
        self
    }
}

/// 应用层上下文（Application Context）
///
/// 承载一次命令调用所需的横切信息与协作方：
/// - 业务语境（`BusinessContext`）：关联追踪、因果链、执行者；
/// - 幂等键（`idempotency_key`）：交由基础设施层实现请求幂等；
/// - 工作单元（`unit_of_work`）：事务型命令必需，缺失视为配置错误；
/// - 任务队列（`job_queue`）：`call_later`/`call_at` 必需。
///
/// 典型用法：
/// ```rust
/// use std::sync::Arc;
/// use usecase_application::context::{AppContext, BusinessContext};
/// use usecase_application::deferred::InMemoryJobQueue;
///
/// let ctx = AppContext::builder()
///     .biz(
///         BusinessContext::builder()
///             .correlation_id("cor-123")
///             .actor_type("user")
///             .actor_id("u-1")
///             .build(),
///     )
///     .idempotency_key("idem-xyz".to_string())
///     .job_queue(Arc::new(InMemoryJobQueue::new()))
///     .build();
///
/// assert!(ctx.job_queue().is_ok());
/// assert!(ctx.unit_of_work().is_err());
/// ```
#[derive(Builder, Clone, Default)]
pub struct AppContext {
    /// 业务语境（链路追踪、审计主体、操作因果）
    #[builder(default)]
    pub biz: BusinessContext,
    /// 幂等键（可选）
    pub idempotency_key: Option<String>,
    /// 事务边界
    pub unit_of_work: Option<Arc<dyn UnitOfWork>>,
    /// 延迟执行队列
    pub job_queue: Option<Arc<dyn JobQueue>>,
}

impl AppContext {
    pub fn unit_of_work(&self) -> AppResult<&Arc<dyn UnitOfWork>> {
        self.unit_of_work.as_ref().ok_or_else(|| {
            AppError::Configuration("transactional command requires a unit of work".to_string())
        })
    }

    pub fn job_queue(&self) -> AppResult<&Arc<dyn JobQueue>> {
        self.job_queue.as_ref().ok_or_else(|| {
            AppError::Configuration("deferred execution requires a job queue".to_string())
        })
    }

    /// 后台执行某个任务时使用的上下文：沿用协作方，因果ID 指向任务
    pub fn for_job(&self, job: &Job) -> AppContext {
        AppContext {
            biz: self.biz.clone().with_causation_id(job.id().to_string()),
            idempotency_key: Some(job.id().to_string()),
            unit_of_work: self.unit_of_work.clone(),
            job_queue: self.job_queue.clone(),
        }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("biz", &self.biz)
            .field("idempotency_key", &self.idempotency_key)
            .field("unit_of_work", &self.unit_of_work.is_some())
            .field("job_queue", &self.job_queue.is_some())
            .finish()
    }
}
