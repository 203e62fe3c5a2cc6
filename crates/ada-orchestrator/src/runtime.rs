//! The `AdaNode` facade: wires configuration, catalog, shared state and the
//! executor together and exposes them to presentation layers.

use ada_abstraction::GenerativeModel;
use ada_core::events::Connection;
use ada_core::{
    AdaConfig, AdaEvent, Catalog, CheckpointStore, Clock, EventBus, InMemoryCheckpointStore,
    JsonFileCheckpointStore, LogBook, LogEntry, LogType, Node, NodeRegistry, NodeStatus,
    RandomSource, SeededRandom, TokioClock,
};
use ada_models::{ModelConfig, ModelFactory, ModelType};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::command::{HELP_TEXT, TerminalCommand, unknown_command_message};
use crate::error::{OrchestrationError, Result};
use crate::executor::{ExecutorParts, TaskExecutor, TaskReport};
use crate::generative::GenerativeService;
use crate::lifecycle::TaskState;
use crate::metrics::SystemMetrics;
use crate::simulation::{CustomerDirectory, ProviderBackend, SimulatedCrm, SimulatedProviders};
use crate::task::TaskDetails;

const SYSTEM_SOURCE: &str = "System";
const TERMINAL_SOURCE: &str = "Terminal";
const COORDINATOR_SOURCE: &str = "Coordinator";

/// Result of a checkpoint restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Missing,
    Failed,
}

/// Result of a terminal command.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// A task ran (successfully or not).
    Task(Box<TaskReport>),
    /// A task was requested while another was running.
    Rejected,
    /// Handled without running a task.
    Handled,
}

/// Builder for [`AdaNode`]; every collaborator defaults from the configuration.
#[derive(Default)]
pub struct AdaNodeBuilder {
    config: AdaConfig,
    catalog: Option<Catalog>,
    clock: Option<Arc<dyn Clock>>,
    random: Option<Arc<dyn RandomSource>>,
    model: Option<Arc<dyn GenerativeModel>>,
    store: Option<Arc<dyn CheckpointStore>>,
    providers: Option<Arc<dyn ProviderBackend>>,
    crm: Option<Arc<dyn CustomerDirectory>>,
    bus: Option<EventBus>,
}

impl AdaNodeBuilder {
    #[must_use]
    pub fn config(mut self, config: AdaConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    #[must_use]
    pub fn model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.model = Some(model);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn providers(mut self, providers: Arc<dyn ProviderBackend>) -> Self {
        self.providers = Some(providers);
        self
    }

    #[must_use]
    pub fn crm(mut self, crm: Arc<dyn CustomerDirectory>) -> Self {
        self.crm = Some(crm);
        self
    }

    #[must_use]
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Validates the configuration and catalog and assembles the node.
    ///
    /// # Errors
    /// Returns an error for invalid configuration, a dangling catalog
    /// reference or an unsupported model type.
    pub fn build(self) -> Result<AdaNode> {
        let config = self.config;
        config.validate()?;
        let catalog = self.catalog.unwrap_or_else(Catalog::builtin);
        catalog.validate()?;

        let bus = self.bus.unwrap_or_default();
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(TokioClock::new()));
        let random: Arc<dyn RandomSource> = self.random.unwrap_or_else(|| {
            Arc::new(config.simulation.seed.map_or_else(SeededRandom::from_entropy, SeededRandom::from_seed))
        });

        let model = match self.model {
            Some(model) => model,
            None => {
                let settings = &config.model;
                let mut model_config =
                    ModelConfig::new(settings.model_type.parse::<ModelType>()?, &settings.model_id)
                        .with_retries(
                            settings.max_retries,
                            Duration::from_millis(settings.initial_backoff_ms),
                        );
                if let Some(key) = &settings.api_key {
                    model_config = model_config.with_api_key(key);
                }
                ModelFactory::create(model_config)
            }
        };

        let store: Arc<dyn CheckpointStore> = match (self.store, &config.general.checkpoint_path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(JsonFileCheckpointStore::new(path)),
            (None, None) => Arc::new(InMemoryCheckpointStore::new()),
        };

        let providers = self.providers.unwrap_or_else(|| {
            Arc::new(SimulatedProviders::new(
                Arc::clone(&clock),
                Arc::clone(&random),
                config.simulation.provider_latency_ms,
            ))
        });
        let crm = self.crm.unwrap_or_else(|| {
            Arc::new(
                SimulatedCrm::new(Arc::clone(&clock), Arc::clone(&random), config.simulation.crm_latency_ms)
                    .with_default_fallback(config.simulation.crm_default_fallback),
            )
        });

        let nodes = Arc::new(NodeRegistry::from_catalog(&catalog, Arc::clone(&clock), bus.clone()));
        let log = Arc::new(LogBook::new(config.general.log_capacity, Arc::clone(&clock), bus.clone()));
        let config = Arc::new(config);
        let catalog = Arc::new(catalog);

        info!(
            agents = catalog.modules.len(),
            model_id = %model.model_id(),
            auto_seal = config.general.auto_seal,
            "Ada node assembled"
        );

        let executor = TaskExecutor::new(ExecutorParts {
            catalog: Arc::clone(&catalog),
            config: Arc::clone(&config),
            clock: Arc::clone(&clock),
            random,
            nodes: Arc::clone(&nodes),
            log: Arc::clone(&log),
            store: Arc::clone(&store),
            providers,
            crm,
            generative: GenerativeService::new(model),
            bus: bus.clone(),
        });

        Ok(AdaNode { config, catalog, nodes, log, store, executor, bus })
    }
}

/// A running coordination node.
pub struct AdaNode {
    config: Arc<AdaConfig>,
    catalog: Arc<Catalog>,
    nodes: Arc<NodeRegistry>,
    log: Arc<LogBook>,
    store: Arc<dyn CheckpointStore>,
    executor: TaskExecutor,
    bus: EventBus,
}

impl std::fmt::Debug for AdaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaNode")
            .field("nodes", &self.nodes.len())
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl AdaNode {
    pub fn builder() -> AdaNodeBuilder {
        AdaNodeBuilder::default()
    }

    /// Node with the given configuration and catalog and default collaborators.
    ///
    /// # Errors
    /// See [`AdaNodeBuilder::build`].
    pub fn new(config: AdaConfig, catalog: Catalog) -> Result<Self> {
        Self::builder().config(config).catalog(catalog).build()
    }

    /// Executes a task with explicit voting.
    ///
    /// # Errors
    /// Returns `Busy` if a task is already running.
    pub async fn execute(&self, details: TaskDetails, voting_enabled: bool) -> Result<TaskReport> {
        self.executor.execute(details, voting_enabled).await
    }

    /// Executes a task with voting as configured.
    ///
    /// # Errors
    /// Returns `Busy` if a task is already running.
    pub async fn run_task(&self, details: TaskDetails) -> Result<TaskReport> {
        self.execute(details, self.config.voting.enabled).await
    }

    /// Adds a new online instance of `node_type`.
    pub fn clone_node(&self, node_type: &str, instance_name: &str) -> Node {
        let node = self.nodes.clone_node(node_type, instance_name);
        self.log.log(
            LogType::Info,
            format!("New node cloned: {} ({node_type})", node.name),
            COORDINATOR_SOURCE,
        );
        node
    }

    /// Replaces nodes and logs from the stored checkpoint, if any.
    ///
    /// Transient statuses in the snapshot come back as `online`.
    pub async fn restore_checkpoint(&self) -> RestoreOutcome {
        match self.store.load().await {
            Ok(Some(snapshot)) => {
                let nodes = snapshot
                    .nodes
                    .into_iter()
                    .map(|mut node| {
                        if matches!(node.status, NodeStatus::Processing | NodeStatus::Sealing) {
                            node.status = NodeStatus::Online;
                        }
                        node
                    })
                    .collect();
                self.nodes.replace(nodes);
                self.log.replace(snapshot.logs);
                self.log.log(LogType::Info, "State restored from checkpoint.", SYSTEM_SOURCE);
                RestoreOutcome::Restored
            }
            Ok(None) => {
                self.log.log(LogType::Info, "No checkpoint found.", SYSTEM_SOURCE);
                RestoreOutcome::Missing
            }
            Err(e) => {
                warn!(error = %e, "Checkpoint load failed");
                self.log.log(LogType::Error, "Failed to load checkpoint.", SYSTEM_SOURCE);
                RestoreOutcome::Failed
            }
        }
    }

    /// Echoes and executes one terminal line.
    pub async fn submit_command(&self, line: &str) -> CommandOutcome {
        self.log.log(LogType::Info, format!("> {line}"), TERMINAL_SOURCE);

        match TerminalCommand::parse(line) {
            TerminalCommand::Run { agent_id, skill_id } => {
                let Some(module) = self.catalog.module(&agent_id) else {
                    self.log.log(
                        LogType::Error,
                        OrchestrationError::AgentNotFound(agent_id).to_string(),
                        SYSTEM_SOURCE,
                    );
                    return CommandOutcome::Handled;
                };
                if module.skill(&skill_id).is_none() {
                    self.log.log(
                        LogType::Error,
                        OrchestrationError::SkillNotFound { agent: agent_id, skill: skill_id }.to_string(),
                        SYSTEM_SOURCE,
                    );
                    return CommandOutcome::Handled;
                }
                match self.run_task(TaskDetails::new(agent_id, skill_id)).await {
                    Ok(report) => CommandOutcome::Task(Box::new(report)),
                    Err(e) => {
                        self.log.log(LogType::Error, format!("Task rejected: {e}"), SYSTEM_SOURCE);
                        CommandOutcome::Rejected
                    }
                }
            }
            TerminalCommand::Help => {
                self.log.log(LogType::Info, HELP_TEXT, SYSTEM_SOURCE);
                CommandOutcome::Handled
            }
            TerminalCommand::Clear => {
                self.log.clear();
                CommandOutcome::Handled
            }
            TerminalCommand::Nodes => {
                let listing = self
                    .nodes
                    .list()
                    .iter()
                    .map(|n| format!("{} [{}]", n.id, n.status))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.log.log(LogType::Info, format!("Nodes: {listing}"), SYSTEM_SOURCE);
                CommandOutcome::Handled
            }
            TerminalCommand::Restore => {
                self.restore_checkpoint().await;
                CommandOutcome::Handled
            }
            TerminalCommand::Unknown(command) => {
                self.log.log(LogType::Error, unknown_command_message(&command), SYSTEM_SOURCE);
                CommandOutcome::Handled
            }
        }
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.list()
    }

    pub fn node_registry(&self) -> &NodeRegistry {
        &self.nodes
    }

    /// Activity log entries, newest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    pub fn log_book(&self) -> &LogBook {
        &self.log
    }

    pub fn metrics(&self) -> SystemMetrics {
        self.executor.scoreboard().snapshot(self.nodes.active_agent_count())
    }

    pub fn active_connections(&self) -> Vec<Connection> {
        self.executor.connections().active()
    }

    pub fn error_connections(&self) -> Vec<Connection> {
        self.executor.connections().errors()
    }

    pub fn is_processing(&self) -> bool {
        self.executor.is_processing()
    }

    pub fn task_state(&self) -> TaskState {
        self.executor.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdaEvent> {
        self.bus.subscribe()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &AdaConfig {
        &self.config
    }
}
