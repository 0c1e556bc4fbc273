// Signalscope - Audience signal discovery over MCP
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;

use signalscope::cli::{delivery_target, render_outcomes, render_tools};
use signalscope::config::{load_config, load_config_from, Config};
use signalscope::mcp::{ClientError, ErrorCallback, SignalQuery, SignalQueryClient};
use signalscope::providers::{create_providers, discover_all};
use signalscope::server::ProxyServer;

#[derive(Parser, Debug)]
#[command(name = "signalscope")]
#[command(about = "Audience signal discovery over MCP", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Query a single MCP endpoint instead of the configured providers
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Path to a config file (default: ~/.signalscope/config.toml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Parser, Debug)]
enum Command {
    /// List the tools each provider offers
    Tools,
    /// Discover signals for a free-text query
    Signals {
        /// Targeting query (e.g. "electric bikes")
        query: String,
        /// Platform to deliver to, as PLATFORM[:ACCOUNT] (repeatable, or "all")
        #[arg(long = "platform")]
        platforms: Vec<String>,
        /// ISO country code (repeatable)
        #[arg(long = "country")]
        countries: Vec<String>,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print push messages from the first provider until Ctrl-C
    Watch,
    /// Run the REST proxy
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    match args.command {
        Command::Tools => run_tools(&config).await,
        Command::Signals {
            query,
            platforms,
            countries,
            json,
        } => run_signals(&config, &query, &platforms, &countries, json).await,
        Command::Watch => run_watch(&config).await,
        Command::Serve { bind } => run_serve(config, bind).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("signalscope=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &Args) -> Result<Config> {
    if let Some(endpoint) = &args.endpoint {
        return Ok(Config::single(endpoint.clone()));
    }
    match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

async fn run_tools(config: &Config) -> Result<()> {
    for entry in config.enabled_providers() {
        let client = SignalQueryClient::new(entry.client_config())?;
        match client.list_tools().await {
            Ok(tools) => {
                println!("== {}", entry.name);
                print!("{}", render_tools(&tools));
            }
            Err(e) => {
                tracing::error!(provider = %entry.name, kind = e.kind(), "listTools failed: {}", e);
            }
        }
    }
    Ok(())
}

async fn run_signals(
    config: &Config,
    query: &str,
    platforms: &[String],
    countries: &[String],
    json: bool,
) -> Result<()> {
    let target = delivery_target(platforms, countries)?;
    let providers = create_providers(config)?;

    let request = SignalQuery::new(query).with_delivery_target(target);
    let outcomes = discover_all(&providers, &request, config.request_timeout()).await;

    if json {
        let value: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(response) => serde_json::json!({"provider": o.provider, "result": response}),
                Err(e) => serde_json::json!({
                    "provider": o.provider,
                    "error": {"kind": e.kind(), "message": e.to_string()}
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render_outcomes(&outcomes));
    }

    if outcomes.iter().all(|o| !o.is_ok()) && !outcomes.is_empty() {
        anyhow::bail!("All providers failed for query '{}'", query);
    }
    Ok(())
}

async fn run_watch(config: &Config) -> Result<()> {
    let entry = config
        .enabled_providers()
        .next()
        .context("No enabled provider to watch")?;
    let client = SignalQueryClient::new(entry.client_config())?;

    let on_error: ErrorCallback = Box::new(|e: ClientError| {
        tracing::error!(kind = e.kind(), "Signal stream error: {}", e);
    });

    let mut stream = client.connect_signal_stream(
        |message| match serde_json::to_string(&message) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Failed to print message: {}", e),
        },
        Some(on_error),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Closing signal stream");
    stream.close();
    Ok(())
}

async fn run_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    ProxyServer::from_config(&config)?.serve().await
}
