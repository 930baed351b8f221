//! 内存版资源存储（InMemoryStore）
//!
//! 同时实现 `ResourceAdapter` 与 `UnitOfWork`：
//! - 主键自增分配，行以主键的字符串形式为键；
//! - `begin` 压入一份快照，`rollback` 恢复、`commit` 丢弃，支持嵌套；
//! - 可选的行级检查（模拟模型校验/数据库约束）与删除检查；
//! - 若行中存在 `lock_version` 整数字段，每次更新自增。
//!
//! 典型用途：测试环境、示例与本地开发。快照不做并发隔离，面向单写者场景：
//! 保存点栈由整个存储共享，快照覆盖所有行。两个事务交错执行时，
//! 一方回滚会恢复到它开始时的整库状态，连同另一方已提交的行一起丢弃。

use crate::attributes::Attributes;
use crate::error::{DomainError, DomainResult};
use crate::persist::{ResourceAdapter, UnitOfWork, Write};
use crate::resource::Resource;
use crate::validation::ValidationErrors;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type RowCheck<R> = Arc<dyn Fn(&R) -> ValidationErrors + Send + Sync>;

const LOCK_VERSION: &str = "lock_version";

struct Snapshot<R> {
    rows: BTreeMap<String, R>,
    last_id: u64,
}

struct StoreState<R> {
    rows: BTreeMap<String, R>,
    last_id: u64,
    savepoints: Vec<Snapshot<R>>,
}

pub struct InMemoryStore<R: Resource> {
    state: Mutex<StoreState<R>>,
    primary_key: Option<&'static str>,
    row_check: Option<RowCheck<R>>,
    destroy_check: Option<RowCheck<R>>,
    write_calls: AtomicUsize,
}

impl<R: Resource> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(StoreState {
                rows: BTreeMap::new(),
                last_id: 0,
                savepoints: Vec::new(),
            }),
            primary_key: Some("id"),
            row_check: None,
            destroy_check: None,
            write_calls: AtomicUsize::new(0),
        }
    }
}

impl<R: Resource> InMemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建/更新时的行级检查，返回非空错误即拒绝写入
    pub fn with_row_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&R) -> ValidationErrors + Send + Sync + 'static,
    {
        self.row_check = Some(Arc::new(check));
        self
    }

    /// 删除前检查，返回非空错误即拒绝删除
    pub fn with_destroy_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&R) -> ValidationErrors + Send + Sync + 'static,
    {
        self.destroy_check = Some(Arc::new(check));
        self
    }

    /// 模拟未配置主键的表
    pub fn without_primary_key(mut self) -> Self {
        self.primary_key = None;
        self
    }

    /// 直接写入一行（绕过检查，用于准备测试数据）
    pub fn seed(&self, resource: R) -> DomainResult<()> {
        let mut state = self.state()?;
        if let Ok(n) = resource.id().to_string().parse::<u64>() {
            state.last_id = state.last_id.max(n);
        }
        state.rows.insert(resource.id().to_string(), resource);
        Ok(())
    }

    pub fn get(&self, id: &R::Id) -> DomainResult<Option<R>> {
        Ok(self.state()?.rows.get(&id.to_string()).cloned())
    }

    pub fn all(&self) -> DomainResult<Vec<R>> {
        Ok(self.state()?.rows.values().cloned().collect())
    }

    pub fn len(&self) -> DomainResult<usize> {
        Ok(self.state()?.rows.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.state()?.rows.is_empty())
    }

    /// create/update/destroy 被调用的总次数
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// 当前打开的事务层数
    pub fn depth(&self) -> DomainResult<usize> {
        Ok(self.state()?.savepoints.len())
    }

    fn state(&self) -> DomainResult<MutexGuard<'_, StoreState<R>>> {
        self.state.lock().map_err(|_| DomainError::Database {
            reason: format!("{} store lock poisoned", R::TYPE),
        })
    }

    fn key_field(&self) -> &'static str {
        self.primary_key.unwrap_or("id")
    }

    fn check(&self, check: &Option<RowCheck<R>>, resource: &R) -> ValidationErrors {
        check
            .as_ref()
            .map(|f| f(resource))
            .unwrap_or_default()
    }
}

#[async_trait]
impl<R: Resource> ResourceAdapter for InMemoryStore<R> {
    type Resource = R;

    async fn create(&self, attributes: &Attributes) -> DomainResult<Write<R>> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;

        let next = state.last_id + 1;
        let id: R::Id = next
            .to_string()
            .parse()
            .map_err(|_| DomainError::adapter(R::TYPE, format!("cannot use {next} as an id")))?;
        let row = attributes
            .clone()
            .with(self.key_field(), serde_json::to_value(&id)?);
        let resource: R = row.decode()?;

        let errors = self.check(&self.row_check, &resource);
        if !errors.is_empty() {
            tracing::debug!(resource = R::TYPE, "create rejected by row check");
            return Ok(Write::Rejected { resource, errors });
        }

        state.last_id = next;
        state.rows.insert(id.to_string(), resource.clone());
        Ok(Write::Persisted(resource))
    }

    async fn find_by_id(&self, id: &R::Id) -> DomainResult<Option<R>> {
        self.get(id)
    }

    async fn update(&self, resource: R, attributes: &Attributes) -> DomainResult<Write<R>> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;

        let key = resource.id().to_string();
        if !state.rows.contains_key(&key) {
            return Err(DomainError::NotFound {
                reason: format!("{} {key}", R::TYPE),
            });
        }

        let mut row = Attributes::encode(&resource)?.merge(attributes.clone());
        row.insert(self.key_field(), serde_json::to_value(resource.id())?);
        if let Some(version) = row.get(LOCK_VERSION).and_then(Value::as_u64) {
            row.insert(LOCK_VERSION, version + 1);
        }
        let updated: R = row.decode()?;

        let errors = self.check(&self.row_check, &updated);
        if !errors.is_empty() {
            return Ok(Write::Rejected {
                resource: updated,
                errors,
            });
        }

        state.rows.insert(key, updated.clone());
        Ok(Write::Persisted(updated))
    }

    async fn destroy(&self, resource: R) -> DomainResult<Write<R>> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let errors = self.check(&self.destroy_check, &resource);
        if !errors.is_empty() {
            return Ok(Write::Rejected { resource, errors });
        }

        self.state()?.rows.remove(&resource.id().to_string());
        Ok(Write::Persisted(resource))
    }

    fn primary_key(&self) -> Option<&str> {
        self.primary_key
    }

    async fn exists(&self, conditions: &Attributes, excluding: Option<&Value>) -> DomainResult<bool> {
        let excluded_key = match excluding {
            Some(value) => {
                let pk = self
                    .primary_key
                    .ok_or(DomainError::MissingPrimaryKey { resource: R::TYPE })?;
                Some((pk, value))
            }
            None => None,
        };

        let state = self.state()?;
        for resource in state.rows.values() {
            let row = Attributes::encode(resource)?;
            if let Some((pk, value)) = excluded_key {
                if row.get(pk) == Some(value) {
                    continue;
                }
            }
            let matches = conditions
                .iter()
                .all(|(k, v)| row.get(k).unwrap_or(&Value::Null) == v);
            if matches {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl<R: Resource> UnitOfWork for InMemoryStore<R> {
    async fn begin(&self) -> DomainResult<()> {
        let mut state = self.state()?;
        let snapshot = Snapshot {
            rows: state.rows.clone(),
            last_id: state.last_id,
        };
        state.savepoints.push(snapshot);
        tracing::trace!(resource = R::TYPE, depth = state.savepoints.len(), "begin");
        Ok(())
    }

    async fn commit(&self) -> DomainResult<()> {
        let mut state = self.state()?;
        state.savepoints.pop().ok_or_else(|| DomainError::UnitOfWork {
            reason: format!("commit without begin on {}", R::TYPE),
        })?;
        Ok(())
    }

    async fn rollback(&self) -> DomainResult<()> {
        let mut state = self.state()?;
        let snapshot = state.savepoints.pop().ok_or_else(|| DomainError::UnitOfWork {
            reason: format!("rollback without begin on {}", R::TYPE),
        })?;
        state.rows = snapshot.rows;
        state.last_id = snapshot.last_id;
        tracing::debug!(resource = R::TYPE, "rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorKind;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u64,
        text: String,
        #[serde(default)]
        lock_version: usize,
    }

    impl Resource for Note {
        const TYPE: &'static str = "note";
        type Id = u64;

        fn id(&self) -> &u64 {
            &self.id
        }

        fn version(&self) -> usize {
            self.lock_version
        }
    }

    fn text(t: &str) -> Attributes {
        Attributes::new().with("text", t)
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryStore::<Note>::new();
        let a = store.create(&text("a")).await.unwrap().into_resource();
        let b = store.create(&text("b")).await.unwrap().into_resource();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test]
    async fn row_check_rejects_without_persisting() {
        let store = InMemoryStore::<Note>::new().with_row_check(|n: &Note| {
            let mut errors = ValidationErrors::new();
            if n.text.len() > 3 {
                errors.add("text", ErrorKind::TooLong, "is too long");
            }
            errors
        });

        let write = store.create(&text("toolong")).await.unwrap();
        assert!(!write.is_persisted());
        assert!(write.errors().unwrap().contains("text"));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn update_bumps_lock_version() {
        let store = InMemoryStore::<Note>::new();
        let note = store.create(&text("a")).await.unwrap().into_resource();
        let updated = store
            .update(note, &text("b"))
            .await
            .unwrap()
            .into_resource();
        assert_eq!(updated.text, "b");
        assert_eq!(updated.version(), 1);
        assert_eq!(store.get(&1).unwrap().unwrap().lock_version, 1);
    }

    #[tokio::test]
    async fn rollback_restores_snapshot_and_nests() {
        let store = InMemoryStore::<Note>::new();
        store.create(&text("kept")).await.unwrap();

        store.begin().await.unwrap();
        store.create(&text("outer")).await.unwrap();
        store.begin().await.unwrap();
        store.create(&text("inner")).await.unwrap();
        store.rollback().await.unwrap();
        assert_eq!(store.len().unwrap(), 2);
        store.rollback().await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.depth().unwrap(), 0);
        let next = store.create(&text("next")).await.unwrap().into_resource();
        assert_eq!(next.id, 2);

        let err = store.commit().await.unwrap_err();
        assert!(matches!(err, DomainError::UnitOfWork { .. }));
    }

    #[tokio::test]
    async fn rollback_restores_the_whole_store() {
        let store = InMemoryStore::<Note>::new();

        store.begin().await.unwrap();
        store.create(&text("mine")).await.unwrap();
        // 嵌套事务提交后只是并入外层，外层回滚时一并撤销
        store.begin().await.unwrap();
        store.create(&text("nested")).await.unwrap();
        store.commit().await.unwrap();
        assert_eq!(store.len().unwrap(), 2);

        store.rollback().await.unwrap();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.depth().unwrap(), 0);
    }

    #[tokio::test]
    async fn exists_matches_conditions_and_honours_exclusion() {
        let store = InMemoryStore::<Note>::new();
        store.create(&text("same")).await.unwrap();

        let cond = text("same");
        assert!(store.exists(&cond, None).await.unwrap());
        assert!(!store.exists(&cond, Some(&json!(1))).await.unwrap());
        assert!(store.exists(&cond, Some(&json!(2))).await.unwrap());
        assert!(!store.exists(&text("other"), None).await.unwrap());

        let keyless = InMemoryStore::<Note>::new().without_primary_key();
        let err = keyless.exists(&cond, Some(&json!(1))).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingPrimaryKey { resource: "note" }));
    }

    #[tokio::test]
    async fn destroy_check_keeps_row() {
        let store = InMemoryStore::<Note>::new().with_destroy_check(|_: &Note| {
            let mut errors = ValidationErrors::new();
            errors.add_base(ErrorKind::Other("restricted".into()), "cannot delete");
            errors
        });
        let note = store.create(&text("a")).await.unwrap().into_resource();
        let write = store.destroy(note).await.unwrap();
        assert!(!write.is_persisted());
        assert_eq!(store.len().unwrap(), 1);
    }
}
