// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! insights-web main entry point - settings inspection and pipeline simulation.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use uuid::Uuid;

use insights_web::config::{self, InsightsOptions, SettingsSources};
use insights_web::diagnostics::{
    DbCommandInfo, DiagnosticEvent, ENTITY_FRAMEWORK_LISTENER_NAME,
};
use insights_web::logging::{init_logging, init_logging_with_client, LogConfig};
use insights_web::{HttpRequest, InMemoryChannel, RequestTracker, TelemetryItem, TelemetryServices};

/// insights-web version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Telemetry enrichment for web request pipelines.
#[derive(Parser)]
#[command(name = "insights-web")]
#[command(author, version, about = "Telemetry enrichment for web request pipelines", long_about = None)]
struct Cli {
    /// Directory holding appsettings files
    #[arg(short = 'C', long, env = "INSIGHTS_CONTENT_ROOT")]
    content_root: Option<PathBuf>,

    /// Hosting environment name, selects appsettings.<env>.json
    #[arg(short, long, env = "INSIGHTS_ENVIRONMENT")]
    environment: Option<String>,

    /// Instrumentation key, overrides files and environment
    #[arg(short = 'k', long)]
    instrumentation_key: Option<String>,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    /// Show trace output
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or create settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Run a synthetic request through the pipeline and print the telemetry
    Simulate(SimulateArgs),

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved settings
    Show,
    /// Write an example appsettings.json
    Init,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// HTTP method
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Request path
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Request header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Cookie as "name=value" (repeatable)
    #[arg(short = 'c', long = "cookie")]
    cookies: Vec<String>,

    /// Remote address of the connection
    #[arg(long)]
    remote_addr: Option<IpAddr>,

    /// Response status code
    #[arg(short, long, default_value_t = 200)]
    status: u16,

    /// SQL command to report as a database dependency
    #[arg(long, default_value = "SELECT 1")]
    sql: String,

    /// Database name for the dependency
    #[arg(long, default_value = "app")]
    database: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_config = log_config(&cli);
    let options = InsightsOptions {
        instrumentation_key: cli.instrumentation_key.clone(),
        ..Default::default()
    };

    match cli.command {
        Commands::Config { ref action } => {
            let _guard = init_logging(&log_config)?;
            let content_root = content_root(cli.content_root.clone())?;
            match action {
                Some(ConfigAction::Show) | None => {
                    let env = |name: &str| std::env::var(name).ok();
                    let settings = config::load_settings(&SettingsSources {
                        content_root: Some(&content_root),
                        environment: cli.environment.as_deref(),
                        env: &env,
                        options,
                    })?;
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                }
                Some(ConfigAction::Init) => {
                    let path = config::init_settings(&content_root)?;
                    println!("{} {}", "Created settings file:".green(), path.display());
                }
            }
        }
        Commands::Simulate(ref args) => {
            let content_root = content_root(cli.content_root.clone())?;
            simulate(&log_config, content_root, cli.environment.clone(), options, args)?;
        }
        Commands::Version => {
            println!("insights-web {}", VERSION);
            println!("SDK version: {}", insights_web::initializers::sdk_version());
        }
    }
    Ok(())
}

fn log_config(cli: &Cli) -> LogConfig {
    if cli.trace {
        LogConfig::development().with_level(tracing::Level::TRACE)
    } else if cli.debug {
        LogConfig::development()
    } else {
        LogConfig::default().with_level(tracing::Level::WARN)
    }
}

fn content_root(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(config::find_content_root(&cwd).unwrap_or(cwd))
}

fn build_request(args: &SimulateArgs) -> anyhow::Result<HttpRequest> {
    let mut request = HttpRequest::new(args.method.as_str(), args.path.as_str());
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header '{}' is not in 'Name: value' form", header))?;
        request = request.with_header(name.trim(), value.trim());
    }
    if !args.cookies.is_empty() {
        request = request.with_header("Cookie", args.cookies.join("; "));
    }
    if let Some(addr) = args.remote_addr {
        request = request.with_remote_addr(addr);
    }
    Ok(request)
}

fn simulate(
    log_config: &LogConfig,
    content_root: PathBuf,
    environment: Option<String>,
    options: InsightsOptions,
    args: &SimulateArgs,
) -> anyhow::Result<()> {
    let channel = Arc::new(InMemoryChannel::new());
    let mut services = TelemetryServices::new().with_content_root(content_root, environment);
    services
        .add_application_insights_telemetry(options)
        .add_telemetry_channel(channel.clone());
    let provider = services.build().context("Failed to build telemetry services")?;

    let _guard = init_logging_with_client(log_config, provider.client().clone())?;

    let tracker = RequestTracker::new(provider.client().clone());
    let operation = tracker.begin(build_request(args)?);

    let instance_id = Uuid::new_v4();
    let hub = provider.diagnostic_hub();
    hub.publish(
        ENTITY_FRAMEWORK_LISTENER_NAME,
        &DiagnosticEvent::BeforeExecuteCommand {
            instance_id,
            timestamp: Instant::now(),
        },
    );
    hub.publish(
        ENTITY_FRAMEWORK_LISTENER_NAME,
        &DiagnosticEvent::AfterExecuteCommand {
            command: DbCommandInfo::new(args.sql.as_str(), args.database.as_str()),
            execute_method: "ExecuteReader".to_string(),
            instance_id,
            timestamp: Instant::now(),
            is_async: false,
        },
    );

    tracing::info!(target: "simulate", path = %args.path, "Handled simulated request");
    operation.complete(args.status);
    provider.client().flush();

    print_items(&channel.drain(), args.format)
}

fn print_items(items: &[TelemetryItem], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            println!("{}", format!("{} telemetry items", items.len()).bright_blue().bold());
            for item in items {
                let context = item.context();
                println!(
                    "{} op={} session={} user={} ip={}",
                    format!("{:?}", item.kind()).bright_white(),
                    context.operation.id.as_deref().unwrap_or("-"),
                    context.session.id.as_deref().unwrap_or("-").cyan(),
                    context.user.id.as_deref().unwrap_or("-").cyan(),
                    context.location.ip.as_deref().unwrap_or("-").dimmed(),
                );
            }
        }
    }
    Ok(())
}
