//! 持久化契约（persist）
//!
//! 命令核心本身不拥有任何持久化状态，只依赖以下协作方：
//! - 资源适配器（`ResourceAdapter`）：按资源类型提供创建、查找、更新、删除与存在性查询；
//! - 工作单元（`UnitOfWork`）：事务边界，命令中止时由执行引擎回滚；
//! - 内存参考实现（`InMemoryStore`）：同时实现上述两者，用于测试、示例与本地开发。
//!
//! 具体存储后端（如 Postgres）由上层提供实现并注入。
//!
mod adapter;
mod in_memory;
mod unit_of_work;

pub use adapter::{ResourceAdapter, Write};
pub use in_memory::InMemoryStore;
pub use unit_of_work::{CompositeUnitOfWork, UnitOfWork};
