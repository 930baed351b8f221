use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use usecase_domain::attributes::Attributes;

pub type JobId = Ulid;

/// 队列中的一条任务：命令名 + 扁平属性包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    command: String,
    attributes: Attributes,
    enqueued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        command: impl Into<String>,
        attributes: Attributes,
        run_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            command: command.into(),
            attributes,
            enqueued_at: Utc::now(),
            run_at,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn run_at(&self) -> Option<DateTime<Utc>> {
        self.run_at
    }

    /// 最早可执行时间：未指定 `run_at` 时即入队时间
    pub fn due_at(&self) -> DateTime<Utc> {
        self.run_at.unwrap_or(self.enqueued_at)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at() <= now
    }
}
