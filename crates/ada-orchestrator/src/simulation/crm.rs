use ada_core::{Clock, RandomSource};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Profile returned for unknown customers when the fallback is enabled.
pub const DEFAULT_PROFILE: &str = "Default User";

/// Customer profile lookup. Absence is `None`, never an error.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn lookup(&self, customer_name: &str) -> Option<Value>;
}

/// In-memory CRM with simulated latency.
pub struct SimulatedCrm {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    latency_ms: [u64; 2],
    default_fallback: bool,
    profiles: BTreeMap<String, Value>,
}

impl std::fmt::Debug for SimulatedCrm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedCrm")
            .field("profiles", &self.profiles.keys().collect::<Vec<_>>())
            .field("default_fallback", &self.default_fallback)
            .finish_non_exhaustive()
    }
}

impl SimulatedCrm {
    /// CRM seeded with the reference customers.
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>, latency_ms: [u64; 2]) -> Self {
        Self {
            clock,
            random,
            latency_ms,
            default_fallback: true,
            profiles: reference_profiles(),
        }
    }

    /// Unknown names resolve to the default profile when enabled.
    #[must_use]
    pub fn with_default_fallback(mut self, enabled: bool) -> Self {
        self.default_fallback = enabled;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, name: impl Into<String>, profile: Value) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }
}

#[async_trait]
impl CustomerDirectory for SimulatedCrm {
    async fn lookup(&self, customer_name: &str) -> Option<Value> {
        let [min, max] = self.latency_ms;
        self.clock.sleep(Duration::from_millis(self.random.between(min, max))).await;

        let profile = self.profiles.get(customer_name).or_else(|| {
            if self.default_fallback { self.profiles.get(DEFAULT_PROFILE) } else { None }
        });
        debug!(customer = %customer_name, found = profile.is_some(), "CRM lookup");
        profile.cloned()
    }
}

fn reference_profiles() -> BTreeMap<String, Value> {
    BTreeMap::from([
        (
            "Ahmet Bey".to_string(),
            json!({
                "customerId": "CUST12345",
                "fullName": "Ahmet Engin",
                "tier": "Platinum",
                "preferences": {
                    "airline": "THY",
                    "class_preference": "Business",
                    "seat_preference": "1A, Aisle",
                    "meal_preference": "Vegetarian"
                },
                "loyalty": { "miles_card": "TK123456789", "miles_balance": 150_000 },
                "family": { "spouse": "Ayşe Engin", "children": ["Efe Engin", "Ela Engin"] },
                "assets": [{
                    "type": "yacht",
                    "id": "ada.sea.yacht.wim",
                    "name": "Wim",
                    "home_port": "Gocek, Turkey",
                    "current_location": "Monaco"
                }],
                "financial": { "payment_method": "Amex Centurion", "credit_status": "Excellent" },
                "notes": "Always books last-minute. Prefers direct flights."
            }),
        ),
        (
            DEFAULT_PROFILE.to_string(),
            json!({
                "customerId": "CUST_DEFAULT",
                "fullName": "Default User",
                "tier": "Standard",
                "preferences": {},
                "loyalty": {},
                "assets": [],
                "financial": { "payment_method": "Visa", "credit_status": "Good" },
                "notes": "No specific preferences on file."
            }),
        ),
    ])
}
