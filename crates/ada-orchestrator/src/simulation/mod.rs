//! Simulated collaborators: provider tool calls and CRM profile lookups.
//!
//! Both sit behind traits so tests can script their answers.

pub mod crm;
pub mod provider;

pub use crm::{CustomerDirectory, SimulatedCrm};
pub use provider::{ProviderBackend, SimulatedProviders, SimulationResult};
