//! Interactive terminal.
//!
//! Each line goes through `AdaNode::submit_command`; log entries appended
//! since the previous prompt are printed after every command.

use ada_orchestrator::{AdaNode, CommandOutcome};
use anyhow::Context;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Sources;
use crate::render;

const PROMPT: &str = "ada> ";

pub async fn execute(sources: &Sources) -> anyhow::Result<()> {
    let node = sources.build_node()?;
    println!("{}", "Ada Node terminal. Type 'help' for commands, 'exit' to quit.".bold());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_seen = 0;
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let outcome = node.submit_command(line).await;
        last_seen = print_new_entries(&node, last_seen);
        if let CommandOutcome::Task(report) = outcome {
            render::print_report(&report);
        }
    }
    println!();
    Ok(())
}

/// Prints entries with an id above `last_seen`; returns the new high-water mark.
fn print_new_entries(node: &AdaNode, last_seen: u64) -> u64 {
    let fresh: Vec<_> = node.logs().into_iter().filter(|e| e.id > last_seen).collect();
    render::print_entries(&fresh);
    fresh.iter().map(|e| e.id).max().unwrap_or(last_seen)
}
