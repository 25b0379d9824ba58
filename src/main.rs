//! Command-line front end for the fallback RPC client.
//!
//! ```text
//! rpc-fallback [--config PATH] call --network N --method M [--params JSON] [--timeout-ms MS] [--retries N]
//! rpc-fallback [--config PATH] health --network N [--probe]
//! rpc-fallback [--config PATH] order --network N
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use rpc_fallback::config::load_config;
use rpc_fallback::observability::{init_logging, init_metrics};
use rpc_fallback::{NetworkId, RequestOptions, RpcCall, RpcClient};

const CONFIG_ENV: &str = "RPC_FALLBACK_CONFIG";
const DEFAULT_CONFIG: &str = "rpc-fallback.toml";

#[derive(Parser)]
#[command(name = "rpc-fallback")]
#[command(about = "JSON-RPC client with health-ranked endpoint failover", long_about = None)]
struct Cli {
    /// Config file (defaults to $RPC_FALLBACK_CONFIG, then ./rpc-fallback.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one JSON-RPC call with fallback
    Call {
        #[arg(short, long)]
        network: String,
        #[arg(short, long)]
        method: String,
        /// JSON array or object of parameters
        #[arg(short, long, default_value = "[]")]
        params: String,
        /// Per-attempt timeout override
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Tries per endpoint override
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Print the health records of a network
    Health {
        #[arg(short, long)]
        network: String,
        /// Probe every endpoint once before printing
        #[arg(long)]
        probe: bool,
    },
    /// Print the current fallback order of a network
    Order {
        #[arg(short, long)]
        network: String,
    },
}

fn config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = config_path(cli.config);
    let mut config = load_config(&path)?;
    // One-shot commands probe on demand instead.
    config.health_check.enabled = false;

    init_logging(&config.observability.log_level);
    tracing::info!(config = %path.display(), networks = config.networks.len(), "Configuration loaded");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = RpcClient::from_config(&config)?;

    let output = match cli.command {
        Commands::Call {
            network,
            method,
            params,
            timeout_ms,
            retries,
        } => {
            let params: Value = serde_json::from_str(&params)?;
            let network = NetworkId::from(network);
            let mut options = RequestOptions::default();
            if let Some(ms) = timeout_ms {
                options = options.with_timeout(Duration::from_millis(ms));
            }
            if let Some(retries) = retries {
                options = options.with_retry_attempts(retries);
            }
            let result = client.request(&network, RpcCall::new(&method, params), options).await;
            match result {
                Ok(value) => json!({ "network": network, "method": method, "result": value }),
                Err(e) => {
                    client.destroy();
                    return Err(e.into());
                }
            }
        }
        Commands::Health { network, probe } => {
            let network = NetworkId::from(network);
            let probed = if probe {
                client.check_health(&network).await
            } else {
                client.registry().initialize_network(&network);
                0
            };
            let mut endpoints: Vec<Value> = client
                .health_snapshot(&network)
                .into_iter()
                .map(|(url, record)| {
                    json!({
                        "url": url,
                        "status": record.status,
                        "score": record.score(),
                        "success_count": record.success_count,
                        "failure_count": record.failure_count,
                        "consecutive_failures": record.consecutive_failures,
                        "rate_limited": client.is_rate_limited(&url),
                    })
                })
                .collect();
            endpoints.sort_by(|a, b| a["url"].as_str().cmp(&b["url"].as_str()));
            json!({ "network": network, "probed": probed, "endpoints": endpoints })
        }
        Commands::Order { network } => {
            let network = NetworkId::from(network);
            client.registry().initialize_network(&network);
            json!({
                "network": network,
                "best": client.best_endpoint(&network),
                "order": client.fallback_order(&network),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    client.destroy();
    Ok(())
}
