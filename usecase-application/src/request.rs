//! 以“请求形状”的输入调用命令
//!
//! 参数的具体抽取由 Web 层负责；这里只约定抽取结果（扁平属性包）与当前用户，
//! 并按“请求参数 → 当前用户 → 额外属性”的顺序合并，后者覆盖前者。
//!
use crate::command::Command;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::outcome::Outcome;
use crate::pipeline;
use usecase_domain::actor::Actor;
use usecase_domain::attributes::Attributes;
use usecase_domain::error::DomainError;

/// 请求形状的输入
pub trait RequestLike {
    /// 已抽取的请求参数
    fn params(&self) -> Attributes;

    /// 已认证的当前用户
    fn current_user(&self) -> Option<&Actor> {
        None
    }
}

impl RequestLike for Attributes {
    fn params(&self) -> Attributes {
        self.clone()
    }
}

/// 从请求抽取属性、合并 `extra`，经 `factory` 构造命令后调用
pub async fn call_for<C, R, F>(
    request: &R,
    extra: Attributes,
    factory: F,
    ctx: &AppContext,
) -> AppResult<Outcome<C::Output>>
where
    C: Command,
    R: RequestLike + ?Sized,
    F: FnOnce(&Attributes) -> AppResult<C>,
{
    let attributes = extract(request, extra)?;
    let cmd = factory(&attributes)?;
    pipeline::call(cmd, ctx).await
}

fn extract<R: RequestLike + ?Sized>(request: &R, extra: Attributes) -> AppResult<Attributes> {
    let mut attributes = request.params();
    if let Some(actor) = request.current_user() {
        let actor = serde_json::to_value(actor).map_err(DomainError::from)?;
        attributes.insert("current_user", actor);
    }
    Ok(attributes.merge(extra))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FormPost {
        params: Attributes,
        user: Option<Actor>,
    }

    impl RequestLike for FormPost {
        fn params(&self) -> Attributes {
            self.params.clone()
        }

        fn current_user(&self) -> Option<&Actor> {
            self.user.as_ref()
        }
    }

    #[test]
    fn extra_attributes_win_over_request_params() {
        let request = FormPost {
            params: Attributes::new().with("title", "from form").with("body", "B"),
            user: Some(Actor::builder().id("u-1").build()),
        };

        let attrs = extract(&request, Attributes::new().with("title", "override")).unwrap();
        assert_eq!(attrs.get("title").unwrap(), "override");
        assert_eq!(attrs.get("body").unwrap(), "B");
        assert_eq!(attrs.get("current_user").unwrap()["id"], "u-1");
    }

    #[test]
    fn plain_attributes_are_request_like() {
        let params = Attributes::new().with("id", 7);
        let attrs = extract(&params, Attributes::new()).unwrap();
        assert_eq!(attrs, params);
    }
}
