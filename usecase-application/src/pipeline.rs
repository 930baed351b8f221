//! 预检管线与执行引擎
//!
//! 固定顺序：授权 → 校验 → 过期检查，任一失败即停止并返回对应结果；
//! 全部通过后执行 `process`，事务型命令由工作单元包裹：
//! - 正常完成：提交并返回 `Ok(output)`；
//! - `Interrupt::Abort`：回滚并返回 `Abort(errors)`；
//! - `Interrupt::Fatal`：回滚后以 `Err` 传播，不会被转换为任何结果。
//!
use crate::command::{Command, Interrupt};
use crate::context::AppContext;
use crate::deferred::{Job, JobId};
use crate::error::AppResult;
use crate::listeners::Subscription;
use crate::outcome::{Outcome, OutcomeKind, Rejection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::Instrument;
use usecase_domain::validation::ValidationErrors;

/// 运行预检，返回 `None` 表示全部通过
pub async fn preflight<C: Command>(cmd: &C, ctx: &AppContext) -> AppResult<Option<Rejection>> {
    if !cmd.is_authorized(ctx).await? {
        tracing::debug!(command = C::NAME, "unauthorized");
        return Ok(Some(Rejection::Unauthorized));
    }

    let errors = cmd.validate(ctx).await?;
    if !errors.is_empty() {
        tracing::debug!(command = C::NAME, errors = errors.len(), "invalid");
        return Ok(Some(Rejection::Invalid(errors)));
    }

    if cmd.is_stale(ctx).await? {
        tracing::debug!(command = C::NAME, "stale");
        return Ok(Some(Rejection::Stale));
    }

    Ok(None)
}

/// 同步调用：预检 + 执行，恰好返回一个结果
pub async fn call<C: Command>(cmd: C, ctx: &AppContext) -> AppResult<Outcome<C::Output>> {
    let span = tracing::info_span!(
        "command",
        name = C::NAME,
        transactional = C::TRANSACTIONAL,
        correlation_id = ctx.biz.correlation_id(),
    );

    run(cmd, ctx).instrument(span).await
}

async fn run<C: Command>(mut cmd: C, ctx: &AppContext) -> AppResult<Outcome<C::Output>> {
    if let Some(rejection) = preflight(&cmd, ctx).await? {
        return Ok(rejection.into());
    }

    let outcome = execute(&mut cmd, ctx).await?;
    if let Outcome::Abort(errors) = &outcome {
        tracing::info!(errors = errors.len(), "aborted");
    }
    Ok(outcome)
}

async fn execute<C: Command>(cmd: &mut C, ctx: &AppContext) -> AppResult<Outcome<C::Output>> {
    let mut errors = ValidationErrors::new();

    if !C::TRANSACTIONAL {
        let result = cmd.process(ctx, &mut errors).await;
        return settle(result, errors);
    }

    let uow = ctx.unit_of_work()?.clone();
    uow.begin().await?;

    match cmd.process(ctx, &mut errors).await {
        Ok(output) => {
            uow.commit().await?;
            Ok(Outcome::Ok(output))
        }
        Err(Interrupt::Abort) => {
            uow.rollback().await?;
            Ok(Outcome::Abort(errors))
        }
        Err(Interrupt::Fatal(err)) => {
            // 回滚失败不覆盖原始错误
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after fatal error failed");
            }
            Err(err)
        }
    }
}

fn settle<T>(result: Result<T, Interrupt>, errors: ValidationErrors) -> AppResult<Outcome<T>> {
    match result {
        Ok(output) => Ok(Outcome::Ok(output)),
        Err(Interrupt::Abort) => Ok(Outcome::Abort(errors)),
        Err(Interrupt::Fatal(err)) => Err(err),
    }
}

/// 延迟调用：同步预检，通过后入队并立即返回 `Ok(job_id)`（已受理，而非已完成）
pub async fn call_later<C: Command>(cmd: C, ctx: &AppContext) -> AppResult<Outcome<JobId>> {
    enqueue(cmd, None, ctx).await
}

/// 定时调用：同 [`call_later`]，任务在 `at` 之后才会被取出
pub async fn call_at<C: Command>(
    cmd: C,
    at: DateTime<Utc>,
    ctx: &AppContext,
) -> AppResult<Outcome<JobId>> {
    enqueue(cmd, Some(at), ctx).await
}

async fn enqueue<C: Command>(
    cmd: C,
    run_at: Option<DateTime<Utc>>,
    ctx: &AppContext,
) -> AppResult<Outcome<JobId>> {
    let span = tracing::info_span!("command.enqueue", name = C::NAME);
    push_job(cmd, run_at, ctx).instrument(span).await
}

async fn push_job<C: Command>(
    cmd: C,
    run_at: Option<DateTime<Utc>>,
    ctx: &AppContext,
) -> AppResult<Outcome<JobId>> {
    if let Some(rejection) = preflight(&cmd, ctx).await? {
        return Ok(rejection.into());
    }

    let queue = ctx.job_queue()?;
    let job = Job::new(C::NAME, cmd.attributes()?, run_at);
    let id = job.id();
    queue.push(job).await?;

    tracing::info!(job_id = %id, run_at = ?run_at, "enqueued");
    Ok(Outcome::Ok(id))
}

/// 命令调用的便捷方法
///
/// ```rust,ignore
/// let outcome = CreatePost::new(attrs, deps)
///     .on_ok(|post| println!("created {}", post.id))
///     .on(OutcomeKind::FAILURES, |o| eprintln!("rejected: {}", o.kind()))
///     .call(&ctx)
///     .await?;
/// ```
#[async_trait]
pub trait CommandExt: Command {
    async fn call(self, ctx: &AppContext) -> AppResult<Outcome<Self::Output>> {
        call(self, ctx).await
    }

    async fn call_later(self, ctx: &AppContext) -> AppResult<Outcome<JobId>> {
        call_later(self, ctx).await
    }

    async fn call_at(self, at: DateTime<Utc>, ctx: &AppContext) -> AppResult<Outcome<JobId>> {
        call_at(self, at, ctx).await
    }

    fn subscribe<'a>(self) -> Subscription<'a, Self> {
        Subscription::new(self)
    }

    fn on<'a, I, F>(self, kinds: I, f: F) -> Subscription<'a, Self>
    where
        I: IntoIterator<Item = OutcomeKind>,
        F: FnMut(&Outcome<Self::Output>) + Send + 'a,
    {
        Subscription::new(self).on(kinds, f)
    }

    fn on_ok<'a, F>(self, f: F) -> Subscription<'a, Self>
    where
        F: FnMut(&Self::Output) + Send + 'a,
    {
        Subscription::new(self).on_ok(f)
    }
}

impl<C: Command> CommandExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::{Arc, Mutex};
    use usecase_domain::attributes::Attributes;
    use usecase_domain::validation::ErrorKind;

    type Trail = Arc<Mutex<Vec<&'static str>>>;

    #[derive(Default)]
    struct Probe {
        unauthorized: bool,
        invalid: bool,
        stale: bool,
        abort: bool,
        trail: Trail,
    }

    impl Probe {
        fn mark(&self, step: &'static str) {
            self.trail.lock().unwrap().push(step);
        }
    }

    #[async_trait]
    impl Command for Probe {
        const NAME: &'static str = "probe";
        const TRANSACTIONAL: bool = false;
        type Output = &'static str;

        fn attributes(&self) -> AppResult<Attributes> {
            Ok(Attributes::new())
        }

        async fn is_authorized(&self, _ctx: &AppContext) -> AppResult<bool> {
            self.mark("authorize");
            Ok(!self.unauthorized)
        }

        async fn validate(&self, _ctx: &AppContext) -> AppResult<ValidationErrors> {
            self.mark("validate");
            let mut errors = ValidationErrors::new();
            if self.invalid {
                errors.add("title", ErrorKind::Blank, "can't be blank");
            }
            Ok(errors)
        }

        async fn is_stale(&self, _ctx: &AppContext) -> AppResult<bool> {
            self.mark("stale");
            Ok(self.stale)
        }

        async fn process(
            &mut self,
            _ctx: &AppContext,
            errors: &mut ValidationErrors,
        ) -> Result<&'static str, Interrupt> {
            self.mark("process");
            if self.abort {
                errors.add_base(ErrorKind::Invalid, "stopped halfway");
                return Err(Interrupt::Abort);
            }
            Ok("done")
        }
    }

    fn steps(trail: &Trail) -> Vec<&'static str> {
        trail.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn runs_preflight_in_fixed_order_then_process() {
        let probe = Probe::default();
        let trail = probe.trail.clone();

        let outcome = call(probe, &AppContext::default()).await.unwrap();
        assert_eq!(outcome, Outcome::Ok("done"));
        assert_eq!(steps(&trail), vec!["authorize", "validate", "stale", "process"]);
    }

    #[tokio::test]
    async fn each_failed_check_halts_the_pipeline() {
        let ctx = AppContext::default();

        let probe = Probe {
            unauthorized: true,
            invalid: true,
            ..Default::default()
        };
        let trail = probe.trail.clone();
        assert_eq!(call(probe, &ctx).await.unwrap(), Outcome::Unauthorized);
        assert_eq!(steps(&trail), vec!["authorize"]);

        let probe = Probe {
            invalid: true,
            stale: true,
            ..Default::default()
        };
        let trail = probe.trail.clone();
        let outcome = call(probe, &ctx).await.unwrap();
        assert!(outcome.errors().unwrap().has("title", &ErrorKind::Blank));
        assert_eq!(steps(&trail), vec!["authorize", "validate"]);

        let probe = Probe {
            stale: true,
            ..Default::default()
        };
        let trail = probe.trail.clone();
        assert_eq!(call(probe, &ctx).await.unwrap(), Outcome::Stale);
        assert_eq!(steps(&trail), vec!["authorize", "validate", "stale"]);
    }

    #[tokio::test]
    async fn abort_carries_errors_collected_so_far() {
        let probe = Probe {
            abort: true,
            ..Default::default()
        };
        let outcome = call(probe, &AppContext::default()).await.unwrap();
        match outcome {
            Outcome::Abort(errors) => {
                assert_eq!(errors.full_messages(), vec!["stopped halfway"])
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn preflight_is_idempotent() {
        let probe = Probe {
            invalid: true,
            ..Default::default()
        };
        let ctx = AppContext::default();
        let first = preflight(&probe, &ctx).await.unwrap();
        let second = preflight(&probe, &ctx).await.unwrap();
        assert_eq!(first, second);
        assert!(matches!(first, Some(Rejection::Invalid(_))));
    }

    struct Transfer;

    #[async_trait]
    impl Command for Transfer {
        const NAME: &'static str = "transfer";
        type Output = ();

        fn attributes(&self) -> AppResult<Attributes> {
            Ok(Attributes::new())
        }

        async fn process(
            &mut self,
            _ctx: &AppContext,
            _errors: &mut ValidationErrors,
        ) -> Result<(), Interrupt> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn transactional_command_requires_a_unit_of_work() {
        let err = call(Transfer, &AppContext::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        let err = call_later(Transfer, &AppContext::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
