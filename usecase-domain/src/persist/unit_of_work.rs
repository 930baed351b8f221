use crate::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;

/// 工作单元（事务边界）
///
/// 支持嵌套：每次 `begin` 对应一次 `commit` 或 `rollback`。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> DomainResult<()>;

    async fn commit(&self) -> DomainResult<()>;

    async fn rollback(&self) -> DomainResult<()>;
}

/// 跨多个存储的工作单元：按顺序开始/提交，逆序回滚
///
/// - `begin` 中途失败：已开始的单元逆序回滚后返回原始错误；
/// - `commit` 中途失败：已提交的单元无法撤销，其余单元回滚后返回原始错误。
#[derive(Clone, Default)]
pub struct CompositeUnitOfWork {
    units: Vec<Arc<dyn UnitOfWork>>,
}

impl CompositeUnitOfWork {
    pub fn new(units: Vec<Arc<dyn UnitOfWork>>) -> Self {
        Self { units }
    }

    pub fn with(mut self, unit: Arc<dyn UnitOfWork>) -> Self {
        self.units.push(unit);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

// 逆序回滚；单个失败只记录，不打断其余单元
async fn rollback_all(units: &[Arc<dyn UnitOfWork>]) -> DomainResult<()> {
    let mut first_err = None;
    for unit in units.iter().rev() {
        if let Err(e) = unit.rollback().await {
            tracing::warn!(error = %e, "rollback of unit failed");
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[async_trait]
impl UnitOfWork for CompositeUnitOfWork {
    async fn begin(&self) -> DomainResult<()> {
        for (i, unit) in self.units.iter().enumerate() {
            if let Err(e) = unit.begin().await {
                let _ = rollback_all(&self.units[..i]).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn commit(&self) -> DomainResult<()> {
        for (i, unit) in self.units.iter().enumerate() {
            if let Err(e) = unit.commit().await {
                let _ = rollback_all(&self.units[i..]).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn rollback(&self) -> DomainResult<()> {
        rollback_all(&self.units).await
    }
}
