//! 用例应用层（usecase-application）
//!
//! 命令执行核心：每一个写操作都以“命令”的形式经过同一条管线。
//! - `command`：命令契约与中止信号；
//! - `pipeline`：授权 → 校验 → 过期检查的预检，以及事务包裹的执行；
//! - `outcome` / `listeners`：每次调用恰好一个终态结果，回调订阅作为语法糖；
//! - `crud`：基于资源适配器与授权策略的创建/更新/删除模板；
//! - `deferred`：入队、注册表与队列工作者，在后台重新进入完整管线。
//!
pub mod command;
pub mod context;
pub mod crud;
pub mod deferred;
pub mod error;
pub mod listeners;
pub mod observability;
pub mod outcome;
pub mod pipeline;
pub mod policy;
pub mod request;

pub use command::{Command, Interrupt};
pub use outcome::{Outcome, OutcomeKind};
pub use pipeline::CommandExt;
