use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the OpenDota `/heroes` collection.
///
/// Only the lookup keys are typed. Everything else (`name`, `roles`,
/// `primary_attr`, `legs`, ...) stays in `extra` exactly as upstream sent it,
/// nulls and missing fields included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    pub id: u32,
    pub localized_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HeroRecord {
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.extra
            .get("roles")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn primary_attr(&self) -> Option<&str> {
        self.extra.get("primary_attr").and_then(Value::as_str)
    }

    pub fn attack_type(&self) -> Option<&str> {
        self.extra.get("attack_type").and_then(Value::as_str)
    }

    pub fn has_role(&self, role: &str) -> bool {
        let role = role.to_lowercase();
        self.roles().any(|r| r.to_lowercase() == role)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.localized_name.to_lowercase() == name.to_lowercase()
    }
}
