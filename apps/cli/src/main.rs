//! Ada CLI - command-line front end for the Ada Node coordination demo
//!
//! The `ada` binary runs tasks through the simulated agent mesh, prints
//! workflow plans, inspects the catalog and nodes, restores checkpoints and
//! offers an interactive terminal.

mod commands;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{catalog, config, nodes, plan, restore, run, shell};

/// Ada CLI - agent coordination over a simulated mesh
#[derive(Parser, Debug)]
#[command(
    name = "ada",
    author,
    version,
    about = "Ada Node - agent coordination over a simulated mesh",
    long_about = "Ada Node plans workflows across specialised agents, simulates the mesh between them,\nvotes over provider answers and seals results into checkpoints."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Configuration file (overrides ADA_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file; the built-in catalog is used when absent
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a task
    ///
    /// Plans the workflow for the agent's skill, exchanges with every step
    /// over the mesh, invokes the selected tools and seals the result.
    Run {
        /// Agent ID (e.g. travel_agent)
        agent: String,

        /// Skill ID; defaults to the agent's first skill
        skill: Option<String>,

        /// Restrict the skill's providers to this one
        #[arg(long)]
        provider: Option<String>,

        /// Restrict the selected tools to this one
        #[arg(long)]
        tool: Option<String>,

        /// Customer name used for profile enrichment
        #[arg(long)]
        customer: Option<String>,

        /// Enable consensus voting (overrides the configuration)
        #[arg(long, conflicts_with = "no_vote")]
        vote: bool,

        /// Disable consensus voting (overrides the configuration)
        #[arg(long)]
        no_vote: bool,

        /// Output the task report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the workflow plan for a skill
    Plan {
        /// Agent ID
        agent: String,

        /// Skill ID
        skill: String,
    },

    /// List agents, skills, providers and tools
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the initial node set
    Nodes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore nodes and logs from the configured checkpoint file
    Restore,

    /// Print the effective configuration as TOML
    Config,

    /// Interactive terminal (run, help, clear, nodes, restore, exit)
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the tracing subscriber")?;

    let sources = commands::Sources { config: args.config, catalog: args.catalog };

    match args.command {
        Command::Run { agent, skill, provider, tool, customer, vote, no_vote, json } => {
            let voting = if vote {
                Some(true)
            } else if no_vote {
                Some(false)
            } else {
                None
            };
            let request = run::RunRequest { agent, skill, provider, tool, customer, voting, json };
            run::execute(&sources, request).await
        }
        Command::Plan { agent, skill } => plan::execute(&sources, &agent, &skill),
        Command::Catalog { json } => catalog::execute(&sources, json),
        Command::Nodes { json } => nodes::execute(&sources, json),
        Command::Restore => restore::execute(&sources).await,
        Command::Config => config::execute(&sources),
        Command::Shell => shell::execute(&sources).await,
    }
}
