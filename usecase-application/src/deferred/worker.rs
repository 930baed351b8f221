//! 队列工作者（JobWorker）
//!
//! 周期性取出到期任务，经注册表重建命令并调用完整管线：
//! - 未注册的命令名：记录一条错误日志，不调用任何东西；
//! - 四种失败结果：通过订阅转换为结构化错误日志（命令名、任务ID、原始属性、错误）；
//! - 致命错误：由工作循环记录，任务被丢弃；
//! - 不重试、不重新入队。
//!
use super::job::Job;
use super::logger::{JobLogger, TracingJobLogger};
use super::queue::JobQueue;
use super::registry::CommandRegistry;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::listeners::Listeners;
use crate::outcome::{Outcome, OutcomeKind};
use bon::Builder;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use usecase_domain::validation::ValidationErrors;

/// 工作者配置
#[derive(Clone, Copy, Debug)]
pub struct WorkerConfig {
    /// 轮询队列的间隔
    pub poll_interval: Duration,
    /// 每个周期最多处理的任务数
    pub max_jobs_per_tick: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_jobs_per_tick: 32,
        }
    }
}

/// 队列工作者
///
/// 同一周期内的任务按顺序逐个执行。注意：工作者与请求侧共用上下文中的工作单元，
/// 若该工作单元不具备按事务隔离的能力（如 `InMemoryStore` 的整库快照），
/// 不要让工作者与请求在多线程运行时上并发写同一存储，否则一方回滚会覆盖另一方已提交的写入。
#[derive(Builder)]
pub struct JobWorker {
    queue: Arc<dyn JobQueue>,
    registry: Arc<CommandRegistry>,
    /// 执行任务时使用的基础上下文（工作单元、队列等协作方）
    #[builder(default)]
    context: AppContext,
    #[builder(default = Arc::new(TracingJobLogger) as Arc<dyn JobLogger>)]
    logger: Arc<dyn JobLogger>,
    #[builder(default)]
    config: WorkerConfig,
}

impl JobWorker {
    /// 启动工作循环，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> WorkerHandle {
        let token = CancellationToken::new();
        let worker = self.clone();
        let loop_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(worker.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = worker.run_pending().await {
                            tracing::error!(error = %err, "job queue poll failed");
                        }
                    }
                }
            }
        });

        WorkerHandle {
            token,
            task: Some(task),
        }
    }

    /// 处理当前全部到期任务（上限 `max_jobs_per_tick`），返回处理数
    pub async fn run_pending(&self) -> AppResult<usize> {
        let mut processed = 0;

        while processed < self.config.max_jobs_per_tick {
            let Some(job) = self.queue.pop_due(Utc::now()).await? else {
                break;
            };
            processed += 1;

            if let Err(err) = self.perform(&job).await {
                tracing::error!(
                    job_id = %job.id(),
                    command = job.command(),
                    error = %err,
                    "deferred command failed with a fatal error; job dropped"
                );
            }
        }

        Ok(processed)
    }

    /// 执行一条任务；未注册的命令返回 `Ok(None)`，其余返回结果类别
    pub async fn perform(&self, job: &Job) -> AppResult<Option<OutcomeKind>> {
        let span = tracing::info_span!("job", job_id = %job.id(), command = job.command());
        self.dispatch(job).instrument(span).await
    }

    async fn dispatch(&self, job: &Job) -> AppResult<Option<OutcomeKind>> {
        if !self.registry.contains(job.command()) {
            self.logger
                .error("unknown command in job queue", &record(job, None, None));
            return Ok(None);
        }

        let ctx = self.context.for_job(job);
        let outcome = self
            .registry
            .run(job.command(), job.attributes(), &ctx)
            .await?;

        let log = |kind: OutcomeKind, errors: Option<&ValidationErrors>| {
            self.logger
                .error("deferred command failed", &record(job, Some(kind), errors));
        };
        let mut listeners = Listeners::new()
            .on_invalid(|errors| log(OutcomeKind::Invalid, Some(errors)))
            .on_unauthorized(|| log(OutcomeKind::Unauthorized, None))
            .on_stale(|| log(OutcomeKind::Stale, None))
            .on_abort(|errors| log(OutcomeKind::Abort, Some(errors)));
        listeners.publish(&outcome);

        if let Outcome::Ok(()) = outcome {
            tracing::debug!("deferred command completed");
        }
        Ok(Some(outcome.kind()))
    }
}

fn record(
    job: &Job,
    kind: Option<OutcomeKind>,
    errors: Option<&ValidationErrors>,
) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("command".into(), Value::from(job.command()));
    context.insert("job_id".into(), Value::from(job.id().to_string()));
    if let Some(kind) = kind {
        context.insert("outcome".into(), Value::from(kind.as_str()));
    }
    context.insert(
        "attributes".into(),
        Value::Object(job.attributes().as_map().clone()),
    );
    if let Some(errors) = errors {
        let errors = serde_json::to_value(errors).unwrap_or(Value::Null);
        context.insert("errors".into(), errors);
    }
    context
}

/// 工作者运行句柄：用于优雅关闭与等待任务结束
pub struct WorkerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
