//! Assistants Gateway CLI
//!
//! The process that hosts the assistants rule/routing engine: loads
//! configuration, wires the collaborator clients, and exposes the ingress
//! HTTP surface for `message.new` delivery and the webhook fallback path.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod config;
mod error;
mod server;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use config::GatewayConfig;
use error::Result;

use engine::action::handlers::build_registry;
use engine::action::ActionDeps;
use engine::collaborators::Collaborators;
use engine::registry::RuleSetRegistry;
use engine::router::{AliasMap, Router};
use engine::run::{InMemoryConversationStore, Mailbox, RunCoordinator, StaticCredentialRefresher};

/// Assistants Gateway - hosts the assistants rule/routing engine
#[derive(Parser)]
#[command(name = "assistants-gateway")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "ASSISTANTS_GATEWAY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init(InitArgs),

    /// Start the ingress HTTP server
    Serve(ServeArgs),

    /// Show gateway status and configuration
    Status,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the serve command
#[derive(Args)]
struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory of `*.json` rule set files to load at startup
    #[arg(long, env = "ASSISTANTS_GATEWAY_RULES_DIR")]
    rules_dir: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Edit configuration in default editor
    Edit,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gateway={level},engine={level},{}", if verbosity >= 2 { "debug" } else { "warn" })));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(verbosity >= 2).init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => cmd_init(args).await,
        Commands::Serve(args) => cmd_serve(args, cli.config).await,
        Commands::Status => cmd_status(cli.config).await,
        Commands::Config(args) => cmd_config(args, cli.config).await,
    }
}

async fn load_effective_config(path: Option<PathBuf>) -> Result<GatewayConfig> {
    match path {
        Some(path) => Ok(config::load_config_from(path).await?),
        None => Ok(config::load_config().await?),
    }
}

/// Initialize configuration.
async fn cmd_init(args: InitArgs) -> Result<()> {
    let config_file = config::config_path();

    if config_file.exists() && !args.force {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    config::init_config().await?;

    println!("Configuration created: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. assistants-gateway config edit");
    println!("  2. export {}=<token>", util::DEFAULT_AGENT_CREDENTIAL_ENV);
    println!("  3. assistants-gateway serve");

    Ok(())
}

/// Start the ingress HTTP server.
async fn cmd_serve(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = load_effective_config(config_path).await?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    tracing::info!(bind_addr = %config.server.bind_addr, "starting assistants gateway");

    let http = reqwest::Client::new();
    let collaborators = Collaborators::http(
        &config.services.identity_url,
        &config.services.catalog_url,
        &config.services.messaging_url,
        &config.services.integrations_url,
        http.clone(),
    );

    let rule_sets = Arc::new(RuleSetRegistry::new());
    if let Some(rules_dir) = &args.rules_dir {
        load_rule_sets(rules_dir, &rule_sets).await;
    }

    let alias_map = if config.routing.alias_map.is_empty() {
        AliasMap::default()
    } else {
        AliasMap::from_entries(config.routing.alias_map.clone())
    };
    let router = Arc::new(Router::new(
        alias_map,
        rule_sets.clone(),
        collaborators.catalog.clone(),
        collaborators.messaging.clone(),
        http,
    ));

    let action_deps = ActionDeps::new(collaborators, router, config.routing.service_id.clone(), config.limits.embedding_cache_size);

    let coordinator = Arc::new(RunCoordinator {
        rule_sets,
        action_deps,
        action_registry: Arc::new(build_registry()),
        store: Arc::new(InMemoryConversationStore::new()),
        mailbox: Arc::new(Mailbox::new(config.limits.mailbox_depth)),
        credentials: Arc::new(StaticCredentialRefresher::new(config.agent_credential.clone().unwrap_or_default())),
    });

    let config_ref = config.llm.default_preset.clone().map(|preset| engine::config::ConfigRef {
        preset: Some(preset),
        overrides: None,
    });
    let default_llm_config = engine::config::resolve(config_ref.as_ref(), None);

    let state = Arc::new(server::AppState { coordinator, default_llm_config });
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

async fn load_rule_sets(dir: &PathBuf, registry: &RuleSetRegistry) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "could not read rule sets directory");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(std::ffi::OsStr::to_str) != Some("json") {
            continue;
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<engine::model::RuleSet>(&content) {
                Ok(rule_set) => {
                    tracing::info!(key = %rule_set.key, path = %path.display(), "loaded rule set");
                    registry.put(rule_set);
                }
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "failed to parse rule set"),
            },
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "failed to read rule set file"),
        }
    }
}

/// Show status.
async fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.clone().unwrap_or_else(config::config_path);

    println!("Assistants Gateway Status\n");
    println!("Configuration:");
    println!("  Path:   {}", config_file.display());
    println!("  Exists: {}", if config_file.exists() { "yes" } else { "no" });

    match load_effective_config(config_path).await {
        Ok(config) => {
            println!("  Valid:  {}", if config.is_valid() { "yes" } else { "no" });
            println!();
            println!("Services:");
            println!("  Identity:     {}", config.services.identity_url);
            println!("  Catalog:      {}", config.services.catalog_url);
            println!("  Messaging:    {}", config.services.messaging_url);
            println!("  Integrations: {}", config.services.integrations_url);
            println!();
            println!("Limits:");
            println!("  Mailbox depth:        {}", config.limits.mailbox_depth);
            println!("  Embedding cache size: {}", config.limits.embedding_cache_size);
            println!("  Run timeout (ms):     {}", config.limits.run_timeout_ms);
        }
        Err(e) => println!("  Valid:  no ({e})"),
    }

    println!();
    println!("Environment:");
    print_env_status(util::DEFAULT_AGENT_CREDENTIAL_ENV);

    Ok(())
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(config::config_path);

    match args.command {
        ConfigCommands::Path => println!("{}", config_file.display()),
        ConfigCommands::Show => {
            if config_file.exists() {
                let content = tokio::fs::read_to_string(&config_file).await?;
                println!("{content}");
            } else {
                println!("Configuration file does not exist.");
                println!("Run 'assistants-gateway init' to create one.");
            }
        }
        ConfigCommands::Edit => {
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            std::process::Command::new(&editor).arg(&config_file).status()?;
        }
        ConfigCommands::Validate => {
            if !config_file.exists() {
                println!("error: configuration file does not exist");
                return Ok(());
            }
            match config::load_config_from(config_file).await {
                Ok(config) if config.is_valid() => println!("Configuration is valid"),
                Ok(config) => {
                    for issue in config.validate() {
                        println!("{issue}");
                    }
                }
                Err(e) => println!("error: {e}"),
            }
        }
    }

    Ok(())
}

/// Print environment variable status.
fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() { "set" } else { "-" };
    println!("  {name}: {status}");
}
