//! CLI entry point for `rls-guard`.

mod output;

use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, error};
use rls_guard_core::{
    ApplyMode, ApplyOptions, DatabaseConfig, ReconciliationPlan, RlsGuardService, SslRequirement,
    DATABASE_URL_ENV,
};
use rls_guard_server::{AppState, ServerConfig};

/// Operation completed
const EXIT_OK: i32 = 0;
/// Operation ran but failed or found drift
const EXIT_FAILED: i32 = 1;
/// Bad configuration or arguments
const EXIT_CONFIG: i32 = 2;

#[derive(Parser)]
#[command(
    name = "rls-guard",
    version,
    about = "Enable PostgreSQL row-level security on the application tables and report its status"
)]
struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Print debug logs (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = DATABASE_URL_ENV, global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// TLS mode: require, verify-ca or verify-full
    #[arg(long, global = true, default_value = "require")]
    ssl_mode: String,

    /// Maximum pooled connections
    #[arg(long, global = true, default_value_t = DatabaseConfig::DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,

    /// Seconds to wait for a connection
    #[arg(long, global = true, default_value_t = DatabaseConfig::DEFAULT_CONNECT_TIMEOUT.as_secs())]
    connect_timeout: u64,

    /// Seconds before an idle pooled connection is closed
    #[arg(long, global = true, default_value_t = DatabaseConfig::DEFAULT_IDLE_TIMEOUT.as_secs())]
    idle_timeout: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Enable RLS and (re)create the declared policies
    Apply {
        /// Run every statement in one transaction
        #[arg(long)]
        transactional: bool,
    },
    /// Show the RLS state of each target table
    Status {
        #[arg(long)]
        json: bool,
    },
    /// List installed policies and compare them with the declared set
    Policies {
        #[arg(long)]
        json: bool,
    },
    /// Print the statements `apply` would run, without connecting
    Plan {
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP endpoints
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Apply in a single transaction when triggered over HTTP
        #[arg(long)]
        transactional: bool,
    },
}

const fn apply_mode(transactional: bool) -> ApplyMode {
    if transactional {
        ApplyMode::Transactional
    } else {
        ApplyMode::Sequential
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_CONFIG
        }
    };
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Returns the process exit code. `Err` is reserved for configuration problems.
async fn run(cli: Cli) -> Result<i32> {
    let Cli {
        database, command, ..
    } = cli;

    match command {
        Command::Plan { json } => {
            output::print_plan(&ReconciliationPlan::declared(), json)?;
            Ok(EXIT_OK)
        }
        Command::Apply { transactional } => {
            let options = ApplyOptions {
                mode: apply_mode(transactional),
            };
            match connect(&database)?.apply(options).await {
                Ok(result) => {
                    println!("{}", result.message);
                    Ok(EXIT_OK)
                }
                Err(e) => Ok(report_failure(&e)),
            }
        }
        Command::Status { json } => match connect(&database)?.inspect().await {
            Ok(statuses) => {
                output::print_status(&statuses, json)?;
                Ok(EXIT_OK)
            }
            Err(e) => Ok(report_failure(&e)),
        },
        Command::Policies { json } => match connect(&database)?.audit_policies().await {
            Ok(audit) => {
                output::print_audit(&audit, json)?;
                Ok(if audit.is_compliant() {
                    EXIT_OK
                } else {
                    EXIT_FAILED
                })
            }
            Err(e) => Ok(report_failure(&e)),
        },
        Command::Serve {
            host,
            port,
            transactional,
        } => {
            let state =
                AppState::new(connect(&database)?).with_apply_mode(apply_mode(transactional));
            if let Err(e) = rls_guard_server::run(&ServerConfig { host, port }, state).await {
                error!("Server stopped: {e:#}");
                eprintln!("Error: {e:#}");
                return Ok(EXIT_FAILED);
            }
            Ok(EXIT_OK)
        }
    }
}

fn connect(args: &DatabaseArgs) -> Result<RlsGuardService> {
    let config = database_config(args)?;
    debug!("Using {config:?}");
    RlsGuardService::connect(&config).context("Failed to initialize service")
}

fn database_config(args: &DatabaseArgs) -> Result<DatabaseConfig> {
    let url = args
        .database_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .with_context(|| format!("{DATABASE_URL_ENV} is not set (or pass --database-url)"))?;
    let ssl: SslRequirement = args.ssl_mode.parse()?;

    Ok(DatabaseConfig {
        url,
        max_connections: args.max_connections,
        idle_timeout: Duration::from_secs(args.idle_timeout),
        connect_timeout: Duration::from_secs(args.connect_timeout),
        ssl,
    })
}

fn report_failure(err: &rls_guard_core::RlsGuardError) -> i32 {
    error!("{err}");
    eprintln!("Error: {}", err.public_message());
    EXIT_FAILED
}
