//! 授权策略契约
//!
//! 命令只负责调用策略：`check(actor, 资源或资源类型, 动作名) → bool`，
//! 判定逻辑本身由外部实现。闭包可经 [`policy_fn`] 直接充当策略。
//!
use crate::error::AppResult;
use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use usecase_domain::actor::Actor;
use usecase_domain::resource::Resource;

/// 动作名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Destroy,
    Custom(String),
}

impl Action {
    pub fn custom(name: impl Into<String>) -> Self {
        Action::Custom(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Create => "create?",
            Action::Update => "update?",
            Action::Destroy => "destroy?",
            Action::Custom(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 授权对象：尚未存在的资源只有类型，已存在的资源是实例
#[derive(Debug)]
pub enum PolicyTarget<'a, R> {
    Type(&'static str),
    Instance(&'a R),
}

impl<R> Clone for PolicyTarget<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for PolicyTarget<'_, R> {}

impl<'a, R: Resource> PolicyTarget<'a, R> {
    pub fn resource_type(&self) -> &'static str {
        match self {
            PolicyTarget::Type(name) => name,
            PolicyTarget::Instance(_) => R::TYPE,
        }
    }

    pub fn instance(&self) -> Option<&'a R> {
        match self {
            PolicyTarget::Type(_) => None,
            PolicyTarget::Instance(resource) => Some(resource),
        }
    }
}

/// 授权策略
#[async_trait]
pub trait Policy<R: Resource>: Send + Sync {
    async fn check(
        &self,
        actor: Option<&Actor>,
        target: PolicyTarget<'_, R>,
        action: &Action,
    ) -> AppResult<bool>;
}

/// 放行一切（测试与内部命令）
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl<R: Resource> Policy<R> for AllowAll {
    async fn check(
        &self,
        _actor: Option<&Actor>,
        _target: PolicyTarget<'_, R>,
        _action: &Action,
    ) -> AppResult<bool> {
        Ok(true)
    }
}

/// 由闭包构造的策略，见 [`policy_fn`]
pub struct PolicyFn<R, F> {
    f: F,
    _resource: PhantomData<fn(&R)>,
}

/// 以同步闭包实现策略
///
/// ```rust
/// use usecase_application::policy::{Action, policy_fn};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, Serialize, Deserialize)]
/// # struct Post { id: u64, author_id: String }
/// # impl usecase_domain::resource::Resource for Post {
/// #     const TYPE: &'static str = "post";
/// #     type Id = u64;
/// #     fn id(&self) -> &u64 { &self.id }
/// # }
///
/// // 登录即可创建，只有作者可以修改或删除
/// let _policy = policy_fn::<Post, _>(|actor, target, action| match (actor, action) {
///     (None, _) => false,
///     (Some(_), Action::Create) => true,
///     (Some(actor), _) => target.instance().is_some_and(|p| p.author_id == actor.id()),
/// });
/// ```
pub fn policy_fn<R, F>(f: F) -> PolicyFn<R, F>
where
    R: Resource,
    F: Fn(Option<&Actor>, PolicyTarget<'_, R>, &Action) -> bool + Send + Sync + 'static,
{
    PolicyFn {
        f,
        _resource: PhantomData,
    }
}

#[async_trait]
impl<R, F> Policy<R> for PolicyFn<R, F>
where
    R: Resource,
    F: Fn(Option<&Actor>, PolicyTarget<'_, R>, &Action) -> bool + Send + Sync + 'static,
{
    async fn check(
        &self,
        actor: Option<&Actor>,
        target: PolicyTarget<'_, R>,
        action: &Action,
    ) -> AppResult<bool> {
        Ok((self.f)(actor, target, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Doc {
        id: u64,
        owner: String,
    }

    impl Resource for Doc {
        const TYPE: &'static str = "doc";
        type Id = u64;

        fn id(&self) -> &u64 {
            &self.id
        }
    }

    #[tokio::test]
    async fn closures_act_as_policies() {
        let policy = policy_fn::<Doc, _>(|actor, target, action| {
            match (actor, target, action) {
                (Some(a), _, Action::Create) => a.has_role("editor"),
                (Some(a), PolicyTarget::Instance(doc), _) => doc.owner == a.id(),
                _ => false,
            }
        });
        let editor = Actor::builder().id("e").roles(vec!["editor".into()]).build();
        let doc = Doc {
            id: 1,
            owner: "o".into(),
        };

        let create = PolicyTarget::<Doc>::Type(Doc::TYPE);
        assert!(policy.check(Some(&editor), create, &Action::Create).await.unwrap());
        assert!(!policy.check(None, create, &Action::Create).await.unwrap());

        let owner = Actor::builder().id("o").build();
        let target = PolicyTarget::Instance(&doc);
        assert!(policy.check(Some(&owner), target, &Action::Update).await.unwrap());
        assert!(!policy.check(Some(&editor), target, &Action::Destroy).await.unwrap());
        assert_eq!(target.resource_type(), "doc");
    }

    #[test]
    fn action_names() {
        assert_eq!(Action::Create.to_string(), "create?");
        assert_eq!(Action::custom("publish?").as_str(), "publish?");
    }
}
