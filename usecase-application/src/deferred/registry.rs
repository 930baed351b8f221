use crate::command::Command;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::outcome::Outcome;
use crate::pipeline;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use usecase_domain::attributes::Attributes;

type RunFuture<'a> = Pin<Box<dyn Future<Output = AppResult<Outcome<()>>> + Send + 'a>>;

type RunFn =
    Arc<dyn for<'a> Fn(&'a Attributes, &'a AppContext) -> RunFuture<'a> + Send + Sync>;

/// 命令注册表：命令名 → 构造器
///
/// - 通过 `Command::NAME` 注册，构造器从属性包重建命令（协作方由闭包捕获）；
/// - 运行时以类型擦除方式调度，负载被丢弃，只保留结果类别与错误。
#[derive(Default)]
pub struct CommandRegistry {
    runners: DashMap<String, RunFn>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令构造器；同名重复注册返回错误
    pub fn register<C, F>(&self, factory: F) -> AppResult<()>
    where
        C: Command,
        F: Fn(&Attributes) -> AppResult<C> + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);

        let f: RunFn = Arc::new(move |attributes, ctx| {
            let factory = factory.clone();

            Box::pin(async move {
                let cmd = (factory)(attributes)?;
                let outcome = pipeline::call(cmd, ctx).await?;
                Ok::<_, AppError>(outcome.map(|_| ()))
            })
        });

        match self.runners.entry(C::NAME.to_string()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(f);
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.runners.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.runners.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 重建并调用一次命令（完整管线）
    pub async fn run(
        &self,
        name: &str,
        attributes: &Attributes,
        ctx: &AppContext,
    ) -> AppResult<Outcome<()>> {
        let Some(f) = self.runners.get(name).map(|r| r.clone()) else {
            return Err(AppError::CommandNotRegistered(name.to_string()));
        };

        (f)(attributes, ctx).await
    }
}
