//! 资源（Resource）基础抽象
//!
//! CRUD 命令作用的持久化对象：具备类型名、唯一标识与版本（乐观锁）。
//!
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

/// 具备唯一标识与版本的资源抽象
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 资源类型名，用于授权检查与日志
    const TYPE: &'static str;

    /// 资源标识类型，要求可解析、可显示与可序列化
    type Id: FromStr + Clone + Display + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    /// 获取资源标识
    fn id(&self) -> &Self::Id;

    /// 当前版本（用于乐观锁），不参与并发控制的资源保持 0
    fn version(&self) -> usize {
        0
    }
}

/// 把属性包中的标识值转换为资源标识
///
/// 请求参数与队列中的属性常以字符串形式携带标识（`"1"`），数字与字符串一视同仁；
/// 无法解析时返回 `None`（视同找不到该资源）。
pub fn parse_id<R: Resource>(value: &Value) -> Option<R::Id> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ticket {
        id: u64,
    }

    impl Resource for Ticket {
        const TYPE: &'static str = "ticket";
        type Id = u64;

        fn id(&self) -> &u64 {
            &self.id
        }
    }

    #[test]
    fn ids_parse_from_numbers_and_strings() {
        assert_eq!(parse_id::<Ticket>(&json!(7)), Some(7));
        assert_eq!(parse_id::<Ticket>(&json!("7")), Some(7));
        assert_eq!(parse_id::<Ticket>(&json!(" 7 ")), Some(7));
    }

    #[test]
    fn unparsable_ids_are_none() {
        assert_eq!(parse_id::<Ticket>(&json!("abc")), None);
        assert_eq!(parse_id::<Ticket>(&json!(-1)), None);
        assert_eq!(parse_id::<Ticket>(&json!(null)), None);
        assert_eq!(parse_id::<Ticket>(&json!({"id": 7})), None);
    }
}
