//! Rendering of server entities for the terminal.

use std::fmt::Write as _;

use clap::ValueEnum;
use plumber_core::{Agent, StepExecution, Task, TaskExecution};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` in `format`, using `text` to render the text form.
pub fn print<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn format_agents(agents: &[Agent]) -> String {
    if agents.is_empty() {
        return "No agents\n".to_string();
    }
    let mut out = format!("{:<36}  {:<20}  {:<8}  {:<24}  {}\n", "ID", "NAME", "STATUS", "SSH", "LAST SEEN");
    for agent in agents {
        let ssh = agent
            .ssh()
            .map(|s| match s.port {
                Some(port) => format!("{}@{}:{port}", s.user, s.host),
                None => format!("{}@{}", s.user, s.host),
            });
        let seen = agent.last_heartbeat.map(|t| t.to_rfc3339());
        let _ = writeln!(
            out,
            "{:<36}  {:<20}  {:<8}  {:<24}  {}",
            agent.id,
            agent.name,
            agent.status,
            or_dash(ssh.as_deref()),
            or_dash(seen.as_deref()),
        );
    }
    out
}

pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks\n".to_string();
    }
    let mut out = format!("{:<36}  {:<24}  {:<8}  {}\n", "ID", "NAME", "STATUS", "DESCRIPTION");
    for task in tasks {
        let _ = writeln!(
            out,
            "{:<36}  {:<24}  {:<8}  {}",
            task.id,
            task.name,
            task.status,
            or_dash(Some(task.description.as_str())),
        );
    }
    out
}

pub fn format_execution(execution: &TaskExecution) -> String {
    let mut out = format!(
        "Execution {}\nTask      {}\nStatus    {}\n",
        execution.id, execution.task_id, execution.status
    );
    if let Some(start) = execution.start_time {
        let _ = writeln!(out, "Started   {}", start.to_rfc3339());
    }
    if let Some(end) = execution.end_time {
        let _ = writeln!(out, "Finished  {}", end.to_rfc3339());
    }

    for step in &execution.steps {
        out.push_str(&format_step(step));
    }
    out
}

/// One step with its exit code and indented output.
pub fn format_step(step: &StepExecution) -> String {
    let exit = step.exit_code.map(|c| c.to_string());
    let mut out = format!(
        "\n[{}] {} ({}, exit {})\n    agent {}\n",
        step.step_index,
        step.command,
        step.status,
        or_dash(exit.as_deref()),
        step.agent_id,
    );
    if let Some(output) = step.output.as_deref().filter(|o| !o.is_empty()) {
        for line in output.lines() {
            let _ = writeln!(out, "    | {line}");
        }
    }
    out
}

/// Closing line for a followed execution.
pub fn format_outcome(execution: &TaskExecution) -> String {
    match (execution.start_time, execution.end_time) {
        (Some(start), Some(end)) => format!(
            "\nExecution {} after {}s\n",
            execution.status,
            (end - start).num_seconds()
        ),
        _ => format!("\nExecution {}\n", execution.status),
    }
}
