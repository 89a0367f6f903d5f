use clap::{Args, Parser, Subcommand};
use pisa_types::{AssetUnit, BalanceMode, OutRef};
use std::path::PathBuf;
use std::time::Duration;

mod commands;

/// Pisa balancer command-line tools.
#[derive(Parser)]
#[command(name = "pisa")]
#[command(about = "Talk to a Pisa transaction balancer")]
#[command(version)]
struct Cli {
    /// Balancer websocket URL.
    #[arg(long, env = "PISA_URL", default_value = "ws://localhost:8080")]
    url: String,

    /// Seconds to wait for the websocket handshake.
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prebuilt unbalanced transaction and print the balanced CBOR.
    Request {
        #[command(flatten)]
        request: RequestArgs,

        /// Give up on the reply after this many seconds.
        #[arg(long)]
        request_timeout: Option<u64>,
    },

    /// Recompute the script-data and auxiliary-data hashes of a transaction.
    Repair {
        /// Transaction CBOR hex, or @path to a file containing it.
        #[arg(long)]
        tx: String,

        /// JSON file with cost models, e.g. {"PlutusV2": [..]}.
        #[arg(long)]
        cost_models: PathBuf,
    },

    /// Print the request JSON that would be sent, without connecting.
    Preview {
        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Unbalanced transaction CBOR hex, or @path to a file containing it.
    #[arg(long)]
    tx: String,

    /// Position being acted on, <txHash>#<index>.
    #[arg(long)]
    position: OutRef,

    /// Asset involved in the swap, <policy><name> or <policy>.<name>. Repeatable.
    #[arg(long = "asset")]
    assets: Vec<AssetUnit>,

    /// Wallet address (bech32).
    #[arg(long)]
    wallet_address: String,

    /// Change address. Defaults to the wallet address.
    #[arg(long)]
    change_address: Option<String>,

    /// Collateral UTxO, <txHash>#<index>.
    #[arg(long)]
    collateral: Option<OutRef>,

    /// Balancing mode: fake-input or rebalance.
    #[arg(long, default_value = "fake-input")]
    mode: BalanceMode,
}

/// Application context shared across commands.
struct AppContext {
    url: String,
    connect_timeout: Duration,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let ctx = AppContext {
        url: cli.url,
        connect_timeout: Duration::from_secs(cli.connect_timeout),
    };

    let result = match cli.command {
        Commands::Request {
            request,
            request_timeout,
        } => {
            commands::send_request(&ctx, &request, request_timeout.map(Duration::from_secs)).await
        }
        Commands::Repair { tx, cost_models } => commands::repair(&tx, &cost_models),
        Commands::Preview { request } => commands::preview(&request),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
