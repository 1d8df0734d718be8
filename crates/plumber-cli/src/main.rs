//! Plumber - command-line client for the Plumber server.
//!
//! Logs in, keeps the credential in a local file and drives the agent, task
//! and execution endpoints.

mod output;

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use plumber_core::{AgentId, ExecutionId, KeyValueStore, RunStatus, TaskExecution, TaskId};
use plumber_store::{AppContext, FileStore, Navigation};
use plumber_transport::{
    HttpTransport, LOGIN_PATH, TransportConfig,
    config::{BASE_URL_ENV, DEFAULT_BASE_URL},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::output::{
    OutputFormat, format_agents, format_execution, format_outcome, format_step, format_tasks,
};

type Client = AppContext<HttpTransport>;

/// How often a followed execution is re-fetched.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "plumber")]
#[command(version)]
#[command(about = "Command-line client for the Plumber server")]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    url: String,

    /// File holding the login credential
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(
        long,
        global = true,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t)]
    output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the credential
    Login {
        #[arg(short, long)]
        user: String,

        #[arg(short, long, env = "PLUMBER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored credential
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage agents
    #[command(subcommand)]
    Agent(AgentCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Inspect task executions
    #[command(subcommand)]
    Execution(ExecutionCommand),
}

#[derive(Debug, Subcommand)]
enum AgentCommand {
    /// List agents
    List,

    /// Print an agent's generated config
    Config {
        id: AgentId,

        /// Save to this file instead of printing
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// List tasks
    List,

    /// Start a run of a task
    Run {
        id: TaskId,

        /// Follow the started execution until it finishes
        #[arg(long)]
        wait: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ExecutionCommand {
    /// Show an execution and its steps
    Show {
        id: ExecutionId,

        /// Keep polling until the execution finishes
        #[arg(long)]
        follow: bool,
    },
}

impl Command {
    /// Client route the command reads from, if it needs a login.
    const fn route(&self) -> Option<&'static str> {
        match self {
            Self::Login { .. } | Self::Logout | Self::Whoami => None,
            Self::Agent(_) => Some("/agents"),
            Self::Task(_) | Self::Execution(_) => Some("/tasks"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TransportConfig::new(&cli.url).with_timeout(Duration::from_secs(cli.timeout));
    let storage = open_storage(cli.state_file.clone())?;
    let ctx = AppContext::connect(&config, storage)?;

    let result = run(&ctx, cli.command, cli.output).await;
    if result.is_err() && ctx.navigation().current() == LOGIN_PATH {
        return result.context("Session expired. Run `plumber login` to sign in again");
    }
    result
}

fn open_storage(path: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    let path = match path.or_else(FileStore::default_path) {
        Some(path) => path,
        None => bail!("No config directory found; pass --state-file"),
    };
    let store = FileStore::open(&path)
        .with_context(|| format!("Failed to open credential file {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn run(ctx: &Client, command: Command, format: OutputFormat) -> Result<ExitCode> {
    let gated = command.route().map(|route| ctx.navigation().check(route));
    if gated == Some(Navigation::Redirect(LOGIN_PATH)) {
        bail!("Not logged in. Run `plumber login` first");
    }

    match command {
        Command::Login { user, password } => {
            let result = ctx.auth.login(&user, &password).await?;
            println!("Logged in as {} ({})", result.username, result.user_id);
        }
        Command::Logout => {
            ctx.auth.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            if ctx.auth.is_logged_in() {
                println!("{} ({})", ctx.auth.username(), ctx.auth.user_id());
            } else {
                println!("Not logged in");
            }
        }
        Command::Agent(AgentCommand::List) => {
            ctx.agents.fetch_agents().await?;
            output::print(&ctx.agents.agents(), format, |a| format_agents(a))?;
        }
        Command::Agent(AgentCommand::Config { id, save }) => {
            let config = ctx.agents.fetch_agent_config(id).await?;
            match save {
                Some(path) => {
                    std::fs::write(&path, &config.config)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Saved {} to {}", config.filename, path.display());
                }
                None => println!("{}", config.config),
            }
        }
        Command::Task(TaskCommand::List) => {
            ctx.tasks.fetch_tasks().await?;
            output::print(&ctx.tasks.tasks(), format, |t| format_tasks(t))?;
        }
        Command::Task(TaskCommand::Run { id, wait }) => {
            let outcome = ctx.tasks.execute_task(id).await?;
            println!("{}", outcome.message);
            if let Some(task) = ctx.tasks.get_task_by_id(id) {
                println!("{}: {}", task.name, task.status);
            }
            if wait {
                let Some(execution_id) = outcome.execution_id else {
                    bail!("Server did not report the started execution; use `plumber execution show --follow`");
                };
                return follow(ctx, execution_id, format).await;
            }
        }
        Command::Execution(ExecutionCommand::Show { id, follow: true }) => {
            return follow(ctx, id, format).await;
        }
        Command::Execution(ExecutionCommand::Show { id, follow: false }) => {
            let execution = ctx.tasks.fetch_execution(id).await?;
            output::print(&execution, format, format_execution)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Poll an execution until it finishes, printing steps as they complete.
async fn follow(ctx: &Client, id: ExecutionId, format: OutputFormat) -> Result<ExitCode> {
    let text = format == OutputFormat::Text;
    if text {
        println!("Following execution {id}");
    }
    let execution = ctx
        .tasks
        .follow_execution(id, POLL_INTERVAL, |step| {
            if text {
                print!("{}", format_step(step));
            }
        })
        .await?;
    output::print(&execution, format, format_outcome)?;
    Ok(exit_code(&execution))
}

fn exit_code(execution: &TaskExecution) -> ExitCode {
    if execution.status == RunStatus::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
