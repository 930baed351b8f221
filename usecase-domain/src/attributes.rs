//! 属性包（Attribute Bag）
//!
//! 命令的所有输入都以扁平的字符串键映射表示，这也是请求参数抽取与
//! 延迟执行（队列）共用的表示形式：跨越边界的只有“命令名 + 属性包”。
//!
//! - [`Attributes`]：无类型的属性包，`serde_json::Map` 的薄封装；
//! - [`AttributeSet`]：强类型属性集，构造时拒绝未知字段（由 `#[attribute_set]` 派生）。
//!
use crate::actor::Actor;
use crate::error::{DomainError, DomainResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::type_name;

/// 扁平的字符串键属性映射
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// 由任意可序列化值构造，要求序列化结果为 JSON 对象
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> DomainResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::InvalidAttributes {
                target: type_name::<T>(),
                reason: format!("expected an object, found {}", kind_of(&other)),
            }),
        }
    }

    /// 还原为强类型值；目标类型声明了 `deny_unknown_fields` 时未知键会失败
    pub fn decode<T: DeserializeOwned>(&self) -> DomainResult<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            DomainError::InvalidAttributes {
                target: type_name::<T>(),
                reason: e.to_string(),
            }
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 取非 null 值
    pub fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// 合并：`other` 中的同名键覆盖当前值
    pub fn merge(mut self, other: Attributes) -> Self {
        for (k, v) in other.0 {
            self.0.insert(k, v);
        }
        self
    }

    /// 去掉指定键（例如框架字段 `id`、`current_user`）
    pub fn without(mut self, keys: &[&str]) -> Self {
        for k in keys {
            self.0.remove(*k);
        }
        self
    }

    /// 仅保留指定键
    pub fn only(mut self, keys: &[&str]) -> Self {
        self.0.retain(|k, _| keys.contains(&k.as_str()));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TryFrom<Value> for Attributes {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::InvalidAttributes {
                target: "Attributes",
                reason: format!("expected an object, found {}", kind_of(&other)),
            }),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 强类型属性集
///
/// 每个命令类型显式声明自己的字段；通常由 `#[attribute_set]` 宏派生，
/// 它同时追加 `#[serde(deny_unknown_fields)]`，使未知字段在构造时失败。
pub trait AttributeSet: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 当前操作主体（约定字段名 `current_user`）
    fn current_user(&self) -> Option<&Actor> {
        None
    }

    fn to_attributes(&self) -> DomainResult<Attributes> {
        Attributes::encode(self)
    }

    fn from_attributes(attributes: &Attributes) -> DomainResult<Self> {
        attributes.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Draft {
        title: String,
        #[serde(default)]
        body: Option<String>,
    }

    impl AttributeSet for Draft {}

    #[test]
    fn decode_rejects_unknown_keys() {
        let attrs = Attributes::new().with("title", "T").with("bogus", 1);
        let err = Draft::from_attributes(&attrs).unwrap_err();
        match err {
            DomainError::InvalidAttributes { reason, .. } => assert!(reason.contains("bogus")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn encode_then_decode_keeps_fields() {
        let draft = Draft {
            title: "T".into(),
            body: None,
        };
        let attrs = draft.to_attributes().unwrap();
        assert_eq!(attrs.get("title"), Some(&json!("T")));
        assert_eq!(attrs.get("body"), Some(&Value::Null));
        assert!(attrs.present("body").is_none());
        assert_eq!(Draft::from_attributes(&attrs).unwrap(), draft);
    }

    #[test]
    fn encode_rejects_non_objects() {
        let err = Attributes::encode(&42).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAttributes { .. }));
    }

    #[test]
    fn merge_without_and_only() {
        let base = Attributes::new()
            .with("id", 1)
            .with("title", "old")
            .with("current_user", json!({ "id": "u-1" }));
        let merged = base.merge(Attributes::new().with("title", "new"));
        assert_eq!(merged.get("title"), Some(&json!("new")));

        let stripped = merged.clone().without(&["id", "current_user"]);
        assert_eq!(stripped.len(), 1);
        assert!(stripped.contains_key("title"));

        let only = merged.only(&["id"]);
        assert_eq!(only.len(), 1);
        assert_eq!(only.get("id"), Some(&json!(1)));
    }
}
