//! 延迟执行（Deferred execution）
//!
//! `call_later`/`call_at` 在调用方同步完成预检后，只把“命令名 + 属性包”放入队列；
//! 工作者取出任务，经注册表重建一个全新的命令实例并重新走完整管线
//! （预检会再次运行，状态可能已在入队后改变）。
//! 四种失败结果统一转为结构化日志记录，不重试、不重新入队。
//!
mod job;
mod logger;
mod queue;
mod registry;
mod worker;

pub use job::{Job, JobId};
pub use logger::{JobLogger, TracingJobLogger};
pub use queue::{InMemoryJobQueue, JobQueue};
pub use registry::CommandRegistry;
pub use worker::{JobWorker, WorkerConfig, WorkerHandle};
