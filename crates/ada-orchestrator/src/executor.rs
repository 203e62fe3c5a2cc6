//! Task executor.
//!
//! Drives one task through the workflow plan: a mesh exchange per step,
//! optional CRM enrichment, sequential tool calls for the primary agent, an
//! optional vote and the seal. Steps run strictly in plan order and tools in
//! list order; nothing within a task runs concurrently.

use ada_core::{
    AdaConfig, Catalog, CheckpointStore, Clock, Direction, EventBus, LogBook, LogRecord, LogType,
    NodeRegistry, NodeStatus, RandomSource, Skill, Snapshot, CENTRAL_NODE_ID,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connections::ConnectionSet;
use crate::context::{CUSTOMER_PROFILE_KEY, TaskContext};
use crate::error::{OrchestrationError, Result};
use crate::generative::GenerativeService;
use crate::lifecycle::{TaskLifecycle, TaskState};
use crate::mesh::{MeshLink, RequestTracker, TimeoutEvent, TimeoutHandler};
use crate::metrics::Scoreboard;
use crate::planner::{self, CRM_AGENT};
use crate::simulation::{CustomerDirectory, ProviderBackend};
use crate::slot::TaskSlot;
use crate::task::{TaskDetails, ToolOutput};
use crate::voting::{MajorityVote, VoteOutcome};

/// Log source for coordinator decisions.
pub const MCP_SOURCE: &str = "MCP";
const OBSERVER_SOURCE: &str = "Observer";
const COORDINATOR_SOURCE: &str = "Coordinator";
const SYSTEM_SOURCE: &str = "System";

/// Airline code in a customer profile that selects the preferred provider.
const PREFERRED_AIRLINE: &str = "THY";
const PREFERRED_AIRLINE_PROVIDER: &str = "turkish_airlines";

/// Tool id recorded for model voter outputs.
pub const MODEL_VOTE_TOOL: &str = "model_vote";

const DEFAULT_SUMMARY: &str = "Task completed.";

/// Collaborators and shared state the executor works with.
pub struct ExecutorParts {
    pub catalog: Arc<Catalog>,
    pub config: Arc<AdaConfig>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
    pub nodes: Arc<NodeRegistry>,
    pub log: Arc<LogBook>,
    pub store: Arc<dyn CheckpointStore>,
    pub providers: Arc<dyn ProviderBackend>,
    pub crm: Arc<dyn CustomerDirectory>,
    pub generative: GenerativeService,
    pub bus: EventBus,
}

/// Final account of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub task_id: String,
    pub agent_id: String,
    pub skill_id: Option<String>,
    pub state: TaskState,
    pub plan: Vec<String>,
    pub outputs: Vec<ToolOutput>,
    pub vote: Option<VoteOutcome>,
    pub summary: Option<String>,
    /// A checkpoint was persisted.
    pub sealed: bool,
    pub error: Option<String>,
    pub latency_ms: u64,
    pub context: TaskContext,
}

impl TaskReport {
    pub fn succeeded(&self) -> bool {
        self.state == TaskState::Succeeded
    }
}

enum Outcome {
    Completed,
    Rejected(String),
}

/// Mutable state of the task in flight; owned by exactly one `execute` call.
struct TaskRun {
    skill_id: Option<String>,
    plan: Vec<String>,
    context: TaskContext,
    outputs: Vec<ToolOutput>,
    vote: Option<VoteOutcome>,
    summary: Option<String>,
    sealed: bool,
}

/// The orchestrator state machine.
pub struct TaskExecutor {
    catalog: Arc<Catalog>,
    config: Arc<AdaConfig>,
    clock: Arc<dyn Clock>,
    nodes: Arc<NodeRegistry>,
    log: Arc<LogBook>,
    store: Arc<dyn CheckpointStore>,
    providers: Arc<dyn ProviderBackend>,
    crm: Arc<dyn CustomerDirectory>,
    generative: GenerativeService,
    tracker: RequestTracker,
    link: MeshLink,
    slot: TaskSlot,
    lifecycle: TaskLifecycle,
    connections: Arc<ConnectionSet>,
    scoreboard: Scoreboard,
    voter: MajorityVote,
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("lifecycle", &self.lifecycle)
            .field("busy", &self.slot.is_busy())
            .finish_non_exhaustive()
    }
}

impl TaskExecutor {
    pub fn new(parts: ExecutorParts) -> Self {
        let connections = Arc::new(ConnectionSet::new(parts.bus.clone()));
        let timeout = parts.config.mesh.request_timeout();

        let on_timeout: TimeoutHandler = {
            let nodes = Arc::clone(&parts.nodes);
            let log = Arc::clone(&parts.log);
            let connections = Arc::clone(&connections);
            Arc::new(move |event: &TimeoutEvent| {
                nodes.set_status(&event.to, NodeStatus::Offline);
                connections.add_error(&event.from, &event.to);
                log.append(
                    LogRecord::new(
                        LogType::Timeout,
                        format!(
                            "No response from '{}' within {}ms. Node marked offline.",
                            event.to,
                            timeout.as_millis()
                        ),
                    )
                    .source(&event.from)
                    .rtc(&event.request_id, Direction::Outbound),
                );
            })
        };

        let tracker = RequestTracker::new(Arc::clone(&parts.clock), timeout, on_timeout)
            .with_log(Arc::clone(&parts.log));
        let link = MeshLink::new(
            Arc::clone(&parts.clock),
            Arc::clone(&parts.random),
            parts.config.mesh.clone(),
        )
        .with_log(Arc::clone(&parts.log));

        Self {
            voter: MajorityVote::new(parts.config.voting.confidence_threshold),
            slot: TaskSlot::new(parts.bus),
            catalog: parts.catalog,
            config: parts.config,
            clock: parts.clock,
            nodes: parts.nodes,
            log: parts.log,
            store: parts.store,
            providers: parts.providers,
            crm: parts.crm,
            generative: parts.generative,
            tracker,
            link,
            lifecycle: TaskLifecycle::new(),
            connections,
            scoreboard: Scoreboard::new(),
        }
    }

    /// Runs a task to completion.
    ///
    /// Every failure, including a rejected vote, is reported through the
    /// returned [`TaskReport`] and a single log entry.
    ///
    /// # Errors
    /// Returns `Busy` if another task holds the slot; the task never started.
    pub async fn execute(&self, details: TaskDetails, voting_enabled: bool) -> Result<TaskReport> {
        let _slot = self.slot.try_acquire()?;
        self.connections.clear_errors();
        self.enter_state(TaskState::Running);

        let task_id = Uuid::new_v4().to_string();
        let started_at = self.clock.now();
        info!(
            task_id = %task_id,
            agent_id = %details.agent_id,
            skill_id = ?details.skill_id,
            voting_enabled,
            "Task started"
        );
        self.log.log(
            LogType::Info,
            format!(
                "Task injected: Agent '{}', Skill '{}'",
                details.agent_id,
                details.skill_id.as_deref().unwrap_or("default")
            ),
            OBSERVER_SOURCE,
        );

        let mut run = TaskRun {
            skill_id: details.skill_id.clone(),
            plan: Vec::new(),
            context: details.context(),
            outputs: Vec::new(),
            vote: None,
            summary: None,
            sealed: false,
        };

        let result = self.run(&details, voting_enabled, &mut run).await;
        self.connections.clear_active();

        let (state, error) = match result {
            Ok(Outcome::Completed) => (TaskState::Succeeded, None),
            Ok(Outcome::Rejected(reason)) => (TaskState::Failed, Some(reason)),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Task failed");
                self.log.log(LogType::Error, format!("Task failed: {e}"), MCP_SOURCE);
                self.settle_nodes(&details.agent_id, &run.plan);
                (TaskState::Failed, Some(e.to_string()))
            }
        };

        self.enter_state(state);
        let latency_ms = self.clock.millis_since(started_at);
        self.scoreboard.record_task(state == TaskState::Succeeded, latency_ms);
        info!(task_id = %task_id, state = %state, latency_ms, "Task finished");

        Ok(TaskReport {
            task_id,
            agent_id: details.agent_id,
            skill_id: run.skill_id,
            state,
            plan: run.plan,
            outputs: run.outputs,
            vote: run.vote,
            summary: run.summary,
            sealed: run.sealed,
            error,
            latency_ms,
            context: run.context,
        })
    }

    async fn run(&self, details: &TaskDetails, voting_enabled: bool, run: &mut TaskRun) -> Result<Outcome> {
        let agent_id = details.agent_id.as_str();
        let module = self
            .catalog
            .module(agent_id)
            .ok_or_else(|| OrchestrationError::AgentNotFound(agent_id.to_string()))?;
        let skill = match details.skill_id.as_deref() {
            Some(id) => module.skill(id),
            None => module.skills.first(),
        }
        .ok_or_else(|| OrchestrationError::SkillNotFound {
            agent: agent_id.to_string(),
            skill: details.skill_id.clone().unwrap_or_default(),
        })?;
        run.skill_id = Some(skill.id.clone());

        let plan = planner::plan(agent_id, &skill.id);
        run.plan.clone_from(&plan.steps);
        self.log.log(
            LogType::McpWorkflowPlan,
            format!("Workflow Plan: {plan}. Reason: Skill '{}' requires this execution path.", skill.id),
            MCP_SOURCE,
        );

        for (index, step) in plan.steps.iter().enumerate() {
            self.lifecycle.enter_step(index);
            debug!(step = %step, index, "Entering plan step");
            self.exchange(step, &skill.id).await?;

            if step == CRM_AGENT {
                if let Some(name) = run.context.customer_name().map(str::to_string) {
                    self.enrich(step, &name, run).await;
                }
            }
            if step == agent_id {
                self.execute_primary(details, skill, run).await?;
            }
        }

        if voting_enabled {
            self.collect_model_votes(agent_id, &skill.id, run).await;
            if run.outputs.len() > 1 {
                if let Some(reason) = self.decide(run).await {
                    return Ok(Outcome::Rejected(reason));
                }
            }
        }

        if run.summary.is_none() {
            let joined =
                run.outputs.iter().filter_map(ToolOutput::summary).collect::<Vec<_>>().join(" ");
            run.summary =
                Some(if joined.is_empty() { DEFAULT_SUMMARY.to_string() } else { joined });
        }

        self.seal(agent_id, &skill.id, run).await;
        Ok(Outcome::Completed)
    }

    /// Moves the lifecycle; an illegal move is logged by the lifecycle and
    /// trips a debug assertion.
    fn enter_state(&self, to: TaskState) {
        let moved = self.lifecycle.transition(to);
        debug_assert!(moved.is_ok(), "illegal task state transition to {to}");
    }

    /// Coordinator-to-agent request through the timeout ledger and the link.
    async fn exchange(&self, step: &str, skill_id: &str) -> Result<()> {
        self.connections.add_active(CENTRAL_NODE_ID, step);
        let request_id = self.tracker.begin_request(CENTRAL_NODE_ID, step, skill_id);

        match self.link.deliver(CENTRAL_NODE_ID, step).await {
            Ok(delivery) => {
                let message =
                    format!("Acknowledged '{skill_id}' after {} attempt(s).", delivery.attempts);
                match self.tracker.complete_request(&request_id, &message) {
                    Some(_) => Ok(()),
                    None => Err(OrchestrationError::Timeout { request_id, to: step.to_string() }),
                }
            }
            Err(e) => {
                self.tracker.cancel_request(&request_id);
                self.connections.add_error(CENTRAL_NODE_ID, step);
                Err(e)
            }
        }
    }

    /// CRM profile lookup; a miss is logged and the task continues.
    async fn enrich(&self, step: &str, customer_name: &str, run: &mut TaskRun) {
        self.log.log(
            LogType::WorkflowStep,
            format!("[1] Retrieving customer profile for '{customer_name}'."),
            step,
        );
        self.nodes.set_task(step, NodeStatus::Processing, Some("fetch_customer_profile".to_string()));
        let profile = self.crm.lookup(customer_name).await;
        self.nodes.set_task(step, NodeStatus::Online, None);

        match profile {
            Some(profile) => {
                run.context = run.context.merge(step, &json!({ CUSTOMER_PROFILE_KEY: profile }));
                self.log.log(
                    LogType::ContextEnrichment,
                    format!("Context enriched with profile for '{customer_name}'."),
                    step,
                );
            }
            None => {
                self.log.log(
                    LogType::Error,
                    format!("Customer profile for '{customer_name}' not found."),
                    step,
                );
            }
        }
    }

    async fn execute_primary(&self, details: &TaskDetails, skill: &Skill, run: &mut TaskRun) -> Result<()> {
        let agent_id = details.agent_id.as_str();
        self.log.log(
            LogType::WorkflowStep,
            format!("[2] Executing primary skill '{}' for agent '{agent_id}'.", skill.id),
            agent_id,
        );

        let mut providers: Vec<&str> = skill.provider_ids.iter().map(String::as_str).collect();
        if let Some(requested) = details.provider_id.as_deref() {
            if !providers.contains(&requested) {
                return Err(OrchestrationError::ProviderNotFound(requested.to_string()));
            }
            providers = vec![requested];
        }

        if run.context.airline_preference() == Some(PREFERRED_AIRLINE) {
            let narrowed: Vec<&str> =
                providers.iter().copied().filter(|p| *p == PREFERRED_AIRLINE_PROVIDER).collect();
            if !narrowed.is_empty() {
                self.log.log(
                    LogType::McpDecision,
                    format!(
                        "Customer preference detected. Prioritizing '{PREFERRED_AIRLINE_PROVIDER}' provider."
                    ),
                    MCP_SOURCE,
                );
                providers = narrowed;
            }
        }

        let pairs = self.tool_pairs(&providers, details.tool_id.as_deref())?;
        self.log.log(
            LogType::ToolSelection,
            format!(
                "MCP selected {} tool(s) for skill '{}': {}",
                pairs.len(),
                skill.id,
                pairs.iter().map(|(_, tool)| tool.as_str()).collect::<Vec<_>>().join(", ")
            ),
            MCP_SOURCE,
        );

        for (provider_id, tool_id) in pairs {
            self.log.log(
                LogType::Thinking,
                format!("Executing tool '{tool_id}' via provider '{provider_id}'."),
                agent_id,
            );
            self.connections.add_active(CENTRAL_NODE_ID, agent_id);
            self.nodes.set_task(agent_id, NodeStatus::Processing, Some(tool_id.clone()));

            let result = self.providers.invoke(&tool_id, &provider_id, &run.context).await;
            run.context = run.context.merge(&tool_id, &result.data);
            let reason = result.response.as_ref().map_or("OK", |r| r.reason.as_str()).to_string();
            run.outputs.push(ToolOutput::new(&tool_id, provider_id, result.response, result.data));

            self.log.log(LogType::Info, format!("Tool '{tool_id}' responded: {reason}"), agent_id);
            self.nodes.set_task(agent_id, NodeStatus::Online, None);
            self.clock.sleep(self.config.pacing.tool_delay()).await;
        }
        Ok(())
    }

    /// Expands providers into `(provider, tool)` pairs in catalog order.
    fn tool_pairs(&self, providers: &[&str], only_tool: Option<&str>) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        for provider_id in providers {
            let provider = self
                .catalog
                .provider(provider_id)
                .ok_or_else(|| OrchestrationError::ProviderNotFound((*provider_id).to_string()))?;
            for tool_id in &provider.supported_tool_ids {
                if self.catalog.tool(tool_id).is_none() {
                    return Err(OrchestrationError::ToolNotFound(tool_id.clone()));
                }
                pairs.push((provider.id.clone(), tool_id.clone()));
            }
        }

        if let Some(tool) = only_tool {
            pairs.retain(|(_, t)| t == tool);
            if pairs.is_empty() {
                return Err(OrchestrationError::ToolNotFound(tool.to_string()));
            }
        }
        Ok(pairs)
    }

    async fn collect_model_votes(&self, agent_id: &str, skill_id: &str, run: &mut TaskRun) {
        let voters = self.config.voting.voter_count;
        if voters == 0 {
            return;
        }

        self.log.log(
            LogType::Thinking,
            format!("Requesting {voters} model vote(s) from '{}'.", self.generative.model_id()),
            MCP_SOURCE,
        );
        let data = provider_data(&run.outputs);
        for voter in 1..=voters {
            let prompt = format!(
                "You are voter {voter} of {voters} reviewing the '{skill_id}' task for agent \
                 '{agent_id}'. Should the coordinator confirm the result? Provider data: {data}"
            );
            let response = self.generative.decision(&prompt).await;
            run.outputs.push(ToolOutput::new(
                MODEL_VOTE_TOOL,
                self.generative.model_id(),
                response,
                Value::Null,
            ));
        }
    }

    /// Votes over the outputs; returns the rejection reason if the task must
    /// backtrack, otherwise records the coordinator's verdict as the summary.
    async fn decide(&self, run: &mut TaskRun) -> Option<String> {
        let outcome = self.voter.vote(&run.outputs);
        self.scoreboard.record_vote(outcome.confidence);
        self.log.append(
            LogRecord::new(
                LogType::Voting,
                format!(
                    "Majority vote over {} output(s): {}. Mean confidence {:.2}.",
                    outcome.raw_responses.len(),
                    outcome.distribution_label(),
                    outcome.confidence
                ),
            )
            .source(MCP_SOURCE)
            .votes(outcome.vote_distribution.clone()),
        );

        let confirm = self.config.voting.confirm_decision.as_str();
        if !outcome.confirms(confirm) {
            let reason = if outcome.is_consensus {
                format!(
                    "Consensus rejected: majority decision '{}'",
                    outcome.majority_decision.as_deref().unwrap_or_default()
                )
            } else {
                "Consensus not reached".to_string()
            };
            self.log.append(
                LogRecord::new(
                    LogType::Backtrack,
                    format!("{reason} ({}). Backtracking without sealing.", outcome.distribution_label()),
                )
                .source(MCP_SOURCE)
                .votes(outcome.vote_distribution.clone()),
            );
            run.vote = Some(outcome);
            return Some(reason);
        }

        self.log.log(
            LogType::Thinking,
            "Compiling simulated data for final consensus check...",
            MCP_SOURCE,
        );
        let prompt = format!(
            "You are a master travel coordinator. Based on the following data from multiple \
             providers, what is the single best option for your client and why? Be concise. \
             Data: {}",
            provider_data(&run.outputs)
        );
        let verdict = self.generative.text(&prompt).await;
        self.log.log(
            LogType::Consensus,
            format!("Final decision from AI coordinator: {verdict}"),
            self.generative.model_id(),
        );
        run.summary = Some(verdict);
        run.vote = Some(outcome);
        None
    }

    /// Success log plus, with auto-seal, a best-effort checkpoint.
    async fn seal(&self, agent_id: &str, skill_id: &str, run: &mut TaskRun) {
        let summary = run.summary.clone().unwrap_or_else(|| DEFAULT_SUMMARY.to_string());

        if !self.config.general.auto_seal {
            self.log.log(LogType::Success, summary, COORDINATOR_SOURCE);
            return;
        }

        let involved = involved_nodes(agent_id, &run.plan);
        self.log.log(
            LogType::Seal,
            format!("Sealing operation results for skill '{skill_id}'."),
            MCP_SOURCE,
        );
        for id in &involved {
            self.nodes.set_status(id, NodeStatus::Sealing);
        }
        self.clock.sleep(self.config.pacing.seal_delay()).await;
        self.log.log(LogType::Success, summary, COORDINATOR_SOURCE);

        let snapshot = Snapshot::new(
            self.clock.now(),
            self.nodes.list(),
            self.log.recent(self.config.general.checkpoint_log_limit),
        );
        match self.store.save(&snapshot).await {
            Ok(()) => {
                debug!(snapshot_id = %snapshot.id, "Checkpoint saved");
                run.sealed = true;
            }
            Err(e) => {
                warn!(error = %e, "Checkpoint save failed");
                self.log.log(LogType::Error, format!("Failed to save checkpoint: {e}"), SYSTEM_SOURCE);
            }
        }

        for id in &involved {
            self.nodes.set_status(id, NodeStatus::Online);
        }
    }

    /// Returns nodes left busy by a failed task to `online`; offline stays offline.
    fn settle_nodes(&self, agent_id: &str, plan: &[String]) {
        for id in involved_nodes(agent_id, plan) {
            if matches!(self.nodes.status_of(&id), Some(NodeStatus::Processing | NodeStatus::Sealing)) {
                self.nodes.set_status(&id, NodeStatus::Online);
            }
        }
    }

    /// The processing flag.
    pub fn is_processing(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn state(&self) -> TaskState {
        self.lifecycle.state()
    }

    pub fn current_step(&self) -> Option<usize> {
        self.lifecycle.step()
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }
}

fn involved_nodes(agent_id: &str, plan: &[String]) -> Vec<String> {
    let mut ids = vec![agent_id.to_string()];
    for step in plan {
        if !ids.contains(step) {
            ids.push(step.clone());
        }
    }
    ids
}

fn provider_data(outputs: &[ToolOutput]) -> Value {
    Value::Array(outputs.iter().map(|o| o.data.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involved_nodes_starts_with_agent() {
        let plan = vec!["crm_agent".to_string(), "travel_agent".to_string()];
        assert_eq!(involved_nodes("travel_agent", &plan), vec!["travel_agent", "crm_agent"]);
        assert_eq!(involved_nodes("x", &[]), vec!["x"]);
    }

    #[test]
    fn test_provider_data_keeps_order() {
        let outputs = vec![
            ToolOutput::new("a", "p", None, json!({ "n": 1 })),
            ToolOutput::new("b", "p", None, Value::Null),
        ];
        assert_eq!(provider_data(&outputs), json!([{ "n": 1 }, null]));
    }
}
