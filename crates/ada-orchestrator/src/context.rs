//! Immutable task context.
//!
//! A task starts from its initial context and every step contributes fields
//! through [`TaskContext::merge`], which returns a new context and records
//! which keys the step added.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the customer name used for profile enrichment.
pub const CUSTOMER_NAME_KEY: &str = "customerName";
/// Key holding an enriched customer profile.
pub const CUSTOMER_PROFILE_KEY: &str = "customerProfile";

/// What one step merged into the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: String,
    pub keys: Vec<String>,
}

/// Free-form key-value bag threaded through one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    values: Map<String, Value>,
    history: Vec<Contribution>,
}

impl TaskContext {
    pub fn new(initial: Map<String, Value>) -> Self {
        Self { values: initial, history: Vec::new() }
    }

    /// Returns a new context with the object fields of `data` layered on top.
    ///
    /// Non-object data contributes nothing.
    #[must_use]
    pub fn merge(&self, source: &str, data: &Value) -> Self {
        let Some(fields) = data.as_object() else {
            return self.clone();
        };
        if fields.is_empty() {
            return self.clone();
        }

        let mut next = self.clone();
        for (key, value) in fields {
            next.values.insert(key.clone(), value.clone());
        }
        next.history.push(Contribution {
            source: source.to_string(),
            keys: fields.keys().cloned().collect(),
        });
        next
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.get(CUSTOMER_NAME_KEY).and_then(Value::as_str).filter(|name| !name.trim().is_empty())
    }

    pub fn customer_profile(&self) -> Option<&Value> {
        self.get(CUSTOMER_PROFILE_KEY).filter(|p| !p.is_null())
    }

    /// `customerProfile.preferences.airline`, if present.
    pub fn airline_preference(&self) -> Option<&str> {
        self.customer_profile()?.pointer("/preferences/airline")?.as_str()
    }

    /// Whether the enriched profile lists an asset of the given type.
    pub fn has_asset(&self, asset_type: &str) -> bool {
        self.customer_profile()
            .and_then(|p| p.get("assets"))
            .and_then(Value::as_array)
            .is_some_and(|assets| {
                assets.iter().any(|a| a.get("type").and_then(Value::as_str) == Some(asset_type))
            })
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Step contributions in merge order.
    pub fn history(&self) -> &[Contribution] {
        &self.history
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn initial() -> TaskContext {
        let Value::Object(map) = json!({ "customerName": "Ahmet Bey" }) else { unreachable!() };
        TaskContext::new(map)
    }

    #[test]
    fn test_merge_returns_new_context() {
        let before = initial();
        let after = before.merge("crm_agent", &json!({ "customerProfile": { "tier": "Platinum" } }));

        assert!(before.customer_profile().is_none());
        assert_eq!(after.customer_profile().unwrap()["tier"], "Platinum");
        assert_eq!(after.customer_name(), Some("Ahmet Bey"));
        assert_eq!(
            after.history(),
            &[Contribution { source: "crm_agent".into(), keys: vec!["customerProfile".into()] }]
        );
    }

    #[test]
    fn test_merge_ignores_non_objects_and_empty_data() {
        let ctx = initial();
        assert_eq!(ctx.merge("tool", &Value::Null), ctx);
        assert_eq!(ctx.merge("tool", &json!({})), ctx);
        assert_eq!(ctx.merge("tool", &json!([1, 2])), ctx);
    }

    #[test]
    fn test_later_fields_override() {
        let ctx = initial()
            .merge("a", &json!({ "price": 2800 }))
            .merge("b", &json!({ "price": 1800 }));
        assert_eq!(ctx.get("price"), Some(&json!(1800)));
        assert_eq!(ctx.history().len(), 2);
    }

    #[test]
    fn test_profile_helpers() {
        let ctx = initial().merge(
            "crm_agent",
            &json!({ "customerProfile": {
                "preferences": { "airline": "THY" },
                "assets": [{ "type": "yacht", "name": "Wim" }]
            }}),
        );
        assert_eq!(ctx.airline_preference(), Some("THY"));
        assert!(ctx.has_asset("yacht"));
        assert!(!ctx.has_asset("jet"));
        assert!(TaskContext::default().airline_preference().is_none());
    }

    #[test]
    fn test_blank_customer_name_is_absent() {
        let Value::Object(map) = json!({ "customerName": "  " }) else { unreachable!() };
        assert!(TaskContext::new(map).customer_name().is_none());
    }
}
