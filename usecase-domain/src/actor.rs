use bon::Builder;
use serde::{Deserialize, Serialize};

/// 命令的操作主体（即 `current_user`）
///
/// 作为属性包的一部分随命令跨越队列边界，因此必须可序列化。
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[builder(into)]
    id: String,
    #[builder(default)]
    #[serde(default)]
    roles: Vec<String>,
}

impl Actor {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_default_to_empty_when_missing_from_payload() {
        let actor: Actor = serde_json::from_value(serde_json::json!({ "id": "u-1" })).unwrap();
        assert_eq!(actor.id(), "u-1");
        assert!(actor.roles().is_empty());
        assert!(!actor.has_role("admin"));
    }

    #[test]
    fn builder_sets_roles() {
        let actor = Actor::builder()
            .id("u-2")
            .roles(vec!["admin".into()])
            .build();
        assert!(actor.has_role("admin"));
    }
}
