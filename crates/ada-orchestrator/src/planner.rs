//! Workflow planning.
//!
//! Maps a requested `(agent, skill)` pair to the ordered list of agents the
//! executor visits. The table is a closed set of skill kinds; anything else
//! gets a single-step plan of the requested agent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent that owns customer profiles.
pub const CRM_AGENT: &str = "crm_agent";
/// Agent that handles payments.
pub const FINANCE_AGENT: &str = "finance_agent";

/// Skills with a dedicated execution path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkillKind {
    FlightBooking,
    MarinaBooking,
    HandlePayment,
    FetchCustomerProfile,
    Other(String),
}

impl SkillKind {
    pub fn from_skill_id(skill_id: &str) -> Self {
        match skill_id {
            "flight_booking" => Self::FlightBooking,
            "marina_booking" => Self::MarinaBooking,
            "handle_payment" => Self::HandlePayment,
            "fetch_customer_profile" => Self::FetchCustomerProfile,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::FlightBooking => "flight_booking",
            Self::MarinaBooking => "marina_booking",
            Self::HandlePayment => "handle_payment",
            Self::FetchCustomerProfile => "fetch_customer_profile",
            Self::Other(id) => id,
        }
    }
}

/// Ordered, duplicate-free list of agents to visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub steps: Vec<String>,
}

impl WorkflowPlan {
    fn from_steps<'a>(steps: impl IntoIterator<Item = &'a str>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for step in steps {
            if !unique.iter().any(|s| s == step) {
                unique.push(step.to_string());
            }
        }
        Self { steps: unique }
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.steps.iter().any(|s| s == agent_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for WorkflowPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.steps.join(" -> "))
    }
}

/// Plans the steps for `skill_id` requested from `agent_id`.
pub fn plan(agent_id: &str, skill_id: &str) -> WorkflowPlan {
    match SkillKind::from_skill_id(skill_id) {
        SkillKind::FlightBooking | SkillKind::MarinaBooking => {
            WorkflowPlan::from_steps([CRM_AGENT, agent_id])
        }
        SkillKind::HandlePayment => WorkflowPlan::from_steps([CRM_AGENT, FINANCE_AGENT]),
        SkillKind::FetchCustomerProfile => WorkflowPlan::from_steps([CRM_AGENT]),
        SkillKind::Other(_) => WorkflowPlan::from_steps([agent_id]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_booking_visits_crm_first() {
        let plan = plan("travel_agent", "flight_booking");
        assert_eq!(plan.steps, vec!["crm_agent", "travel_agent"]);
        assert_eq!(plan.to_string(), "[crm_agent -> travel_agent]");
    }

    #[test]
    fn test_marina_booking() {
        assert_eq!(plan("maritime_agent", "marina_booking").steps, vec!["crm_agent", "maritime_agent"]);
    }

    #[test]
    fn test_payment_goes_through_finance() {
        assert_eq!(plan("finance_agent", "handle_payment").steps, vec!["crm_agent", "finance_agent"]);
        assert_eq!(plan("travel_agent", "handle_payment").steps, vec!["crm_agent", "finance_agent"]);
    }

    #[test]
    fn test_profile_fetch_is_single_step() {
        assert_eq!(plan("crm_agent", "fetch_customer_profile").steps, vec!["crm_agent"]);
    }

    #[test]
    fn test_unknown_skill_is_single_requested_agent() {
        let plan = plan("x", "unknown_skill");
        assert_eq!(plan.steps, vec!["x"]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_plan_has_no_duplicates() {
        let plan = plan("crm_agent", "flight_booking");
        assert_eq!(plan.steps, vec!["crm_agent"]);
        assert!(plan.contains("crm_agent"));
    }

    #[test]
    fn test_skill_kind_round_trip() {
        for id in ["flight_booking", "marina_booking", "handle_payment", "fetch_customer_profile", "x"] {
            assert_eq!(SkillKind::from_skill_id(id).as_str(), id);
        }
    }
}
