use super::job::{Job, JobId};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use usecase_domain::attributes::Attributes;

/// 任务队列
///
/// 核心只依赖“放入”与“取出到期任务”两个操作；持久化队列由基础设施层实现。
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn push(&self, job: Job) -> AppResult<()>;

    /// 取出一条到期任务（最早到期者优先），没有则返回 `None`
    async fn pop_due(&self, now: DateTime<Utc>) -> AppResult<Option<Job>>;

    async fn enqueue(&self, command: &str, attributes: Attributes) -> AppResult<JobId> {
        let job = Job::new(command, attributes, None);
        let id = job.id();
        self.push(job).await?;
        Ok(id)
    }

    async fn enqueue_at(
        &self,
        at: DateTime<Utc>,
        command: &str,
        attributes: Attributes,
    ) -> AppResult<JobId> {
        let job = Job::new(command, attributes, Some(at));
        let id = job.id();
        self.push(job).await?;
        Ok(id)
    }
}

/// 基于内存的任务队列（测试、示例与单进程场景）
#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前排队中的任务快照（按入队顺序）
    pub fn jobs(&self) -> AppResult<Vec<Job>> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> AppResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Vec<Job>>> {
        self.jobs
            .lock()
            .map_err(|_| AppError::Queue("job queue lock poisoned".to_string()))
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn push(&self, job: Job) -> AppResult<()> {
        self.lock()?.push(job);
        Ok(())
    }

    async fn pop_due(&self, now: DateTime<Utc>) -> AppResult<Option<Job>> {
        let mut jobs = self.lock()?;
        // 同一到期时间保持入队顺序
        let next = jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.is_due(now))
            .min_by_key(|(idx, job)| (job.due_at(), *idx))
            .map(|(idx, _)| idx);
        Ok(next.map(|idx| jobs.remove(idx)))
    }
}
