//! 用例领域层基础库（usecase-domain）
//!
//! 为“命令/业务事务”执行核心提供与存储、传输无关的基础构件：
//! - 属性包（`attributes`）：命令的扁平字符串键映射与强类型属性集；
//! - 操作主体（`actor`）：授权检查使用的当前用户；
//! - 资源（`resource`）：CRUD 命令作用的持久化对象契约；
//! - 校验引擎（`validation`）：有序规则、按属性归集的错误集合、唯一性校验；
//! - 持久化契约（`persist`）：资源适配器、工作单元（事务）及内存参考实现。
//!
//! 典型用法：
//! 1. 用 `#[attribute_set]` 声明命令属性，未知字段在构造时即被拒绝；
//! 2. 通过 `Validator` 构建器声明校验规则；
//! 3. 为资源实现 `ResourceAdapter`，或在测试中使用 `InMemoryStore`。
//!
pub mod actor;
pub mod attributes;
pub mod error;
pub mod persist;
pub mod resource;
pub mod validation;

// 允许在本 crate 内部通过 ::usecase_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::usecase_domain 路径。
extern crate self as usecase_domain;
