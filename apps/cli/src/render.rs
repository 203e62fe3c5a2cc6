//! Terminal rendering of activity log entries, nodes and task reports.

use ada_core::{Direction, LogEntry, LogType, Node, NodeStatus};
use ada_orchestrator::TaskReport;
use chrono::Local;
use colored::{ColoredString, Colorize};
use tabled::{Table, Tabled};

fn colored_code(log_type: LogType) -> ColoredString {
    let code = format!("{:<4}", log_type.code());
    match log_type {
        LogType::Success | LogType::Seal => code.green().bold(),
        LogType::Error | LogType::Backtrack => code.red().bold(),
        LogType::Retry | LogType::Timeout => code.yellow(),
        LogType::Voting | LogType::Consensus => code.magenta(),
        LogType::McpDecision | LogType::McpWorkflowPlan | LogType::ToolSelection => code.cyan(),
        LogType::RtcMessage => code.dimmed(),
        _ => code.normal(),
    }
}

/// One log line: `12:00:01 SUCC [Coordinator] message`.
pub fn entry_line(entry: &LogEntry) -> String {
    let mut line = format!(
        "{} {}",
        entry.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string().dimmed(),
        colored_code(entry.log_type)
    );
    if let Some(source) = &entry.source {
        line.push_str(&format!(" [{}]", source.bright_white()));
    }
    match entry.direction {
        Some(Direction::Outbound) => line.push_str(" ->"),
        Some(Direction::Inbound) => line.push_str(" <-"),
        None => {}
    }
    line.push(' ');
    line.push_str(&entry.message);
    if let Some(ms) = entry.response_time_ms {
        line.push_str(&format!(" ({ms}ms)").dimmed().to_string());
    }
    line
}

/// Prints entries oldest first; the log book keeps them newest first.
pub fn print_entries(entries: &[LogEntry]) {
    for entry in entries.iter().rev() {
        println!("{}", entry_line(entry));
    }
}

#[derive(Tabled)]
struct NodeRow {
    id: String,
    name: String,
    #[tabled(rename = "type")]
    node_type: String,
    instance: String,
    status: String,
}

pub fn print_nodes(nodes: &[Node]) {
    let rows: Vec<NodeRow> = nodes
        .iter()
        .map(|n| NodeRow {
            id: n.id.clone(),
            name: n.name.clone(),
            node_type: n.node_type.clone(),
            instance: n.instance_name.clone().unwrap_or_default(),
            status: status_label(n.status),
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn status_label(status: NodeStatus) -> String {
    match status {
        NodeStatus::Online => status.to_string().green().to_string(),
        NodeStatus::Offline => status.to_string().red().to_string(),
        NodeStatus::Processing | NodeStatus::Sealing => status.to_string().yellow().to_string(),
    }
}

pub fn print_report(report: &TaskReport) {
    println!();
    if report.succeeded() {
        println!("{} {}", "Task succeeded:".green().bold(), report.task_id.dimmed());
    } else {
        println!("{} {}", "Task failed:".red().bold(), report.task_id.dimmed());
    }
    println!(
        "  Agent: {}  Skill: {}",
        report.agent_id.cyan(),
        report.skill_id.as_deref().unwrap_or("-").cyan()
    );
    if !report.plan.is_empty() {
        println!("  Plan: {}", report.plan.join(" -> "));
    }
    println!("  Tool outputs: {}", report.outputs.len());
    if let Some(vote) = &report.vote {
        println!(
            "  Vote: {} (consensus: {}, confidence {:.2})",
            vote.distribution_label(),
            vote.is_consensus,
            vote.confidence
        );
    }
    if let Some(summary) = &report.summary {
        println!("  Summary: {summary}");
    }
    if let Some(error) = &report.error {
        println!("  Error: {}", error.red());
    }
    println!("  Sealed: {}  Latency: {}ms", report.sealed, report.latency_ms);
}
