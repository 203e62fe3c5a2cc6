//! Reference catalog shipped with the binary.

use super::{AgentModule, Catalog, Provider, Skill, Tool, VotingStrategy};

const TOOLS: &[(&str, &str)] = &[
    ("customer_lookup", "Looks up a profile in the customer database."),
    ("tk_verify_customer", "Verifies Miles&Smiles membership."),
    ("tk_check_miles", "Checks the customer's miles balance."),
    ("tk_search_flights", "Searches Turkish Airlines flights."),
    ("gds_flight_search", "Searches flights through Amadeus or Sabre."),
    ("aggregator_flight_search", "Searches flights through aggregators."),
    ("check_marina_availability", "Checks berth availability for a yacht."),
    ("provision_yacht", "Arranges provisions and services for a yacht."),
    ("check_credit", "Checks the customer's credit limit."),
    ("process_payment", "Processes a payment."),
];

const PROVIDERS: &[(&str, &str, &[&str])] = &[
    ("internal_crm", "Ada Internal CRM Database", &["customer_lookup"]),
    (
        "turkish_airlines",
        "Turkish Airlines Direct Connect",
        &["tk_verify_customer", "tk_check_miles", "tk_search_flights"],
    ),
    ("amadeus", "Amadeus GDS", &["gds_flight_search"]),
    ("sabre", "Sabre GDS", &["gds_flight_search"]),
    ("port_hercule_monaco", "Port Hercule, Monaco Marina Authority", &["check_marina_availability"]),
    ("yacht_services_inc", "Global Yacht Provisioning Inc.", &["provision_yacht"]),
    ("internal_finance", "Ada Internal Payment Gateway", &["check_credit", "process_payment"]),
];

fn skill(id: &str, description: &str, providers: &[&str]) -> Skill {
    Skill {
        id: id.to_string(),
        description: description.to_string(),
        provider_ids: providers.iter().map(ToString::to_string).collect(),
    }
}

fn module(id: &str, skills: Vec<Skill>, voting_strategy: VotingStrategy, red_flagging: bool) -> AgentModule {
    AgentModule { id: id.to_string(), skills, voting_strategy, red_flagging }
}

pub(super) fn catalog() -> Catalog {
    let mut catalog = Catalog::default();

    for (id, description) in TOOLS {
        catalog.tools.insert((*id).to_string(), Tool::new(*id, *description));
    }

    for (id, description, tools) in PROVIDERS {
        catalog.providers.insert(
            (*id).to_string(),
            Provider {
                id: (*id).to_string(),
                description: (*description).to_string(),
                supported_tool_ids: tools.iter().map(ToString::to_string).collect(),
            },
        );
    }

    let modules = [
        module(
            "crm_agent",
            vec![skill("fetch_customer_profile", "Fetch Customer Profile", &["internal_crm"])],
            VotingStrategy::FirstSuccess,
            false,
        ),
        module(
            "travel_agent",
            vec![skill(
                "flight_booking",
                "Flight Booking",
                &["turkish_airlines", "amadeus", "sabre"],
            )],
            VotingStrategy::Plurality,
            true,
        ),
        module(
            "maritime_agent",
            vec![
                skill("marina_booking", "Marina Booking", &["port_hercule_monaco"]),
                skill("yacht_provisioning", "Yacht Provisioning", &["yacht_services_inc"]),
            ],
            VotingStrategy::FirstSuccess,
            true,
        ),
        module(
            "finance_agent",
            vec![skill("handle_payment", "Payment Handling", &["internal_finance"])],
            VotingStrategy::FirstSuccess,
            true,
        ),
    ];
    for m in modules {
        catalog.modules.insert(m.id.clone(), m);
    }

    catalog
}
