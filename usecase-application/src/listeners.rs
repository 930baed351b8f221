//! 结果订阅（Listeners）
//!
//! 在 `call` 返回的 [`Outcome`] 之上提供“按事件名注册回调”的语法糖：
//! 一个回调可以订阅一个或多个类别，发布时按注册顺序同步调用；
//! 没有任何订阅者的类别被发布时什么也不做。
//!
use crate::command::Command;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::outcome::{Outcome, OutcomeKind};
use crate::pipeline;
use usecase_domain::validation::ValidationErrors;

type Callback<'a, T> = Box<dyn FnMut(&Outcome<T>) + Send + 'a>;

/// 按结果类别注册的回调列表
pub struct Listeners<'a, T> {
    entries: Vec<(Vec<OutcomeKind>, Callback<'a, T>)>,
}

impl<'a, T> Default for Listeners<'a, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<'a, T: 'a> Listeners<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<I, F>(mut self, kinds: I, f: F) -> Self
    where
        I: IntoIterator<Item = OutcomeKind>,
        F: FnMut(&Outcome<T>) + Send + 'a,
    {
        self.entries
            .push((kinds.into_iter().collect(), Box::new(f)));
        self
    }

    /// 以事件名订阅（`ok`/`invalid`/`unauthorized`/`stale`/`abort`）
    pub fn on_named<F>(self, names: &[&str], f: F) -> AppResult<Self>
    where
        F: FnMut(&Outcome<T>) + Send + 'a,
    {
        let kinds = names
            .iter()
            .map(|name| name.parse::<OutcomeKind>())
            .collect::<AppResult<Vec<_>>>()?;
        Ok(self.on(kinds, f))
    }

    pub fn on_ok<F>(self, mut f: F) -> Self
    where
        F: FnMut(&T) + Send + 'a,
    {
        self.on([OutcomeKind::Ok], move |outcome: &Outcome<T>| {
            if let Outcome::Ok(value) = outcome {
                f(value)
            }
        })
    }

    pub fn on_invalid<F>(self, mut f: F) -> Self
    where
        F: FnMut(&ValidationErrors) + Send + 'a,
    {
        self.on([OutcomeKind::Invalid], move |outcome: &Outcome<T>| {
            if let Outcome::Invalid(errors) = outcome {
                f(errors)
            }
        })
    }

    pub fn on_unauthorized<F>(self, mut f: F) -> Self
    where
        F: FnMut() + Send + 'a,
    {
        self.on([OutcomeKind::Unauthorized], move |_: &Outcome<T>| f())
    }

    pub fn on_stale<F>(self, mut f: F) -> Self
    where
        F: FnMut() + Send + 'a,
    {
        self.on([OutcomeKind::Stale], move |_: &Outcome<T>| f())
    }

    pub fn on_abort<F>(self, mut f: F) -> Self
    where
        F: FnMut(&ValidationErrors) + Send + 'a,
    {
        self.on([OutcomeKind::Abort], move |outcome: &Outcome<T>| {
            if let Outcome::Abort(errors) = outcome {
                f(errors)
            }
        })
    }

    /// 发布一个结果，返回被调用的回调数
    pub fn publish(&mut self, outcome: &Outcome<T>) -> usize {
        let kind = outcome.kind();
        let mut fired = 0;
        for (kinds, callback) in self.entries.iter_mut() {
            if kinds.contains(&kind) {
                callback(outcome);
                fired += 1;
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 绑定了回调的待执行命令，由 [`CommandExt::on`](crate::pipeline::CommandExt::on) 等创建
pub struct Subscription<'a, C: Command> {
    command: C,
    listeners: Listeners<'a, C::Output>,
}

impl<'a, C: Command> Subscription<'a, C> {
    pub fn new(command: C) -> Self {
        Self {
            command,
            listeners: Listeners::new(),
        }
    }

    pub fn on<I, F>(mut self, kinds: I, f: F) -> Self
    where
        I: IntoIterator<Item = OutcomeKind>,
        F: FnMut(&Outcome<C::Output>) + Send + 'a,
    {
        self.listeners = self.listeners.on(kinds, f);
        self
    }

    pub fn on_ok<F>(mut self, f: F) -> Self
    where
        F: FnMut(&C::Output) + Send + 'a,
    {
        self.listeners = self.listeners.on_ok(f);
        self
    }

    pub fn on_invalid<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ValidationErrors) + Send + 'a,
    {
        self.listeners = self.listeners.on_invalid(f);
        self
    }

    pub fn on_unauthorized<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'a,
    {
        self.listeners = self.listeners.on_unauthorized(f);
        self
    }

    pub fn on_stale<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'a,
    {
        self.listeners = self.listeners.on_stale(f);
        self
    }

    pub fn on_abort<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ValidationErrors) + Send + 'a,
    {
        self.listeners = self.listeners.on_abort(f);
        self
    }

    /// 执行命令并把结果发布给已注册的回调
    pub async fn call(self, ctx: &AppContext) -> AppResult<Outcome<C::Output>> {
        let Subscription {
            command,
            mut listeners,
        } = self;
        let outcome = pipeline::call(command, ctx).await?;
        listeners.publish(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use usecase_domain::validation::ErrorKind;

    fn invalid() -> Outcome<u32> {
        let mut errors = ValidationErrors::new();
        errors.add("title", ErrorKind::Blank, "can't be blank");
        Outcome::Invalid(errors)
    }

    #[test]
    fn fires_matching_listeners_in_registration_order() {
        let seen = Mutex::new(Vec::new());
        let push = |entry: String| seen.lock().unwrap().push(entry);

        let mut listeners = Listeners::new()
            .on_invalid(|errors| push(format!("first:{}", errors.len())))
            .on([OutcomeKind::Ok, OutcomeKind::Invalid], |o: &Outcome<u32>| {
                push(format!("second:{}", o.kind()))
            })
            .on_ok(|n| push(format!("ok:{n}")));

        assert_eq!(listeners.publish(&invalid()), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["first:1", "second:invalid"]);
    }

    #[test]
    fn unmatched_outcome_is_a_no_op() {
        let mut called = false;
        {
            let mut listeners = Listeners::<u32>::new().on_ok(|_| called = true);
            assert_eq!(listeners.publish(&Outcome::Stale), 0);
        }
        assert!(!called);
        assert_eq!(Listeners::<u32>::new().publish(&Outcome::Abort(ValidationErrors::new())), 0);
    }

    #[test]
    fn named_registration_rejects_unknown_names() {
        let mut count = 0;
        {
            let mut listeners = Listeners::<u32>::new()
                .on_named(&["unauthorized", "stale"], |_| count += 1)
                .unwrap();
            listeners.publish(&Outcome::Unauthorized);
            listeners.publish(&Outcome::Stale);
            listeners.publish(&Outcome::Ok(1));
        }
        assert_eq!(count, 2);

        assert!(Listeners::<u32>::new().on_named(&["finished"], |_| {}).is_err());
    }
}
