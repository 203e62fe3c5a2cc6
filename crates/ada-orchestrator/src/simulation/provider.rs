use ada_abstraction::VotableResponse;
use ada_core::{Clock, RandomSource};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::context::{CUSTOMER_PROFILE_KEY, TaskContext};

/// Answer of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub response: Option<VotableResponse>,
    /// Object fields merged into the task context; `Null` for none.
    pub data: Value,
}

impl SimulationResult {
    pub fn new(response: Option<VotableResponse>, data: Value) -> Self {
        Self { response, data }
    }
}

/// Executes a tool through a provider.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    async fn invoke(&self, tool_id: &str, provider_id: &str, context: &TaskContext) -> SimulationResult;
}

/// Canned provider answers with randomized latency and confidence.
pub struct SimulatedProviders {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    latency_ms: [u64; 2],
}

impl std::fmt::Debug for SimulatedProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedProviders").field("latency_ms", &self.latency_ms).finish_non_exhaustive()
    }
}

impl SimulatedProviders {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>, latency_ms: [u64; 2]) -> Self {
        Self { clock, random, latency_ms }
    }

    fn confirm(&self, reason: impl Into<String>, data: Value) -> SimulationResult {
        let confidence = 0.1f64.mul_add(self.random.next_f64(), 0.9);
        SimulationResult::new(Some(VotableResponse::new("confirm", reason, confidence)), data)
    }

    fn flight_offer(provider_id: &str) -> Value {
        match provider_id {
            "turkish_airlines" => json!({
                "airline": "Turkish Airlines", "from": "IST", "to": "NCE", "direct": true,
                "price": 2500, "currency": "EUR",
                "summary": "Direct THY flight to Nice (NCE) found."
            }),
            "amadeus" => json!({
                "airline": "Lufthansa", "from": "IST", "to": "NCE", "direct": true,
                "price": 2800, "currency": "EUR",
                "summary": "Direct Lufthansa flight found via Amadeus."
            }),
            "sabre" => json!({
                "airline": "Air France", "from": "IST", "to": "NCE", "direct": false, "stops": 1,
                "price": 1800, "currency": "EUR",
                "summary": "Cheaper Air France flight with 1 stop found via Sabre."
            }),
            _ => json!({}),
        }
    }
}

#[async_trait]
impl ProviderBackend for SimulatedProviders {
    async fn invoke(&self, tool_id: &str, provider_id: &str, context: &TaskContext) -> SimulationResult {
        debug!(tool_id = %tool_id, provider_id = %provider_id, "Simulating provider call");
        let [min, max] = self.latency_ms;
        self.clock.sleep(Duration::from_millis(self.random.between(min, max))).await;

        match tool_id {
            "tk_verify_customer" => self.confirm("Miles&Smiles member verified.", Value::Null),
            "tk_check_miles" => self.confirm("Member has 150,000 miles.", Value::Null),
            "tk_search_flights" | "gds_flight_search" => self.confirm(
                format!("Flight option found via {provider_id}."),
                Self::flight_offer(provider_id),
            ),
            "check_marina_availability" => {
                if context.has_asset("yacht") {
                    self.confirm(
                        "Berth available at Port Hercule for yacht 'Wim'.",
                        json!({ "marinaConfirmation": "MHB-8817", "summary": "Marina berth confirmed in Monaco." }),
                    )
                } else {
                    self.confirm("No yacht in profile, marina check skipped.", json!({}))
                }
            }
            "customer_lookup" => self.confirm(
                "Customer profile found.",
                json!({ CUSTOMER_PROFILE_KEY: context.customer_profile().cloned().unwrap_or(Value::Null) }),
            ),
            other => self.confirm(format!("Generic tool '{other}' executed successfully."), Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_core::{ManualClock, SequenceRandom};

    fn providers(clock: &Arc<ManualClock>) -> SimulatedProviders {
        SimulatedProviders::new(clock.clone(), Arc::new(SequenceRandom::constant(0.5)), [800, 1500])
    }

    #[tokio::test]
    async fn test_flight_search_per_provider() {
        let clock = Arc::new(ManualClock::new());
        let sim = providers(&clock);

        let result = sim.invoke("gds_flight_search", "sabre", &TaskContext::default()).await;
        let response = result.response.unwrap();
        assert_eq!(response.decision, "confirm");
        assert_eq!(response.reason, "Flight option found via sabre.");
        assert!((response.confidence - 0.95).abs() < 1e-9);
        assert_eq!(result.data["airline"], "Air France");
        assert_eq!(result.data["stops"], 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1150)]);
    }

    #[tokio::test]
    async fn test_marina_depends_on_yacht_asset() {
        let clock = Arc::new(ManualClock::new());
        let sim = providers(&clock);

        let without = sim.invoke("check_marina_availability", "port_hercule_monaco", &TaskContext::default()).await;
        assert_eq!(without.data, json!({}));

        let with_yacht = TaskContext::default()
            .merge("crm_agent", &json!({ "customerProfile": { "assets": [{ "type": "yacht" }] } }));
        let result = sim.invoke("check_marina_availability", "port_hercule_monaco", &with_yacht).await;
        assert_eq!(result.data["marinaConfirmation"], "MHB-8817");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_generic_success() {
        let clock = Arc::new(ManualClock::new());
        let result = providers(&clock).invoke("process_payment", "internal_finance", &TaskContext::default()).await;
        assert_eq!(
            result.response.unwrap().reason,
            "Generic tool 'process_payment' executed successfully."
        );
        assert!(result.data.is_null());
    }
}
