use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wallet_store::cli::commands::{
    cmd_allowance, cmd_approve, cmd_balances, cmd_history, cmd_mint, cmd_network, cmd_profile,
    cmd_transfer, parse_address,
};
use wallet_store::cli::formatters::OutputFormat;
use wallet_store::{Config, RpcClient, Store};

#[derive(Parser)]
#[command(name = "wallet")]
#[command(about = "Inspect and operate an ERC20 wallet", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    /// Wallet to inspect; defaults to the PRIVATE_KEY address
    #[arg(short, long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Profile,
    Network,
    Balances,
    History {
        #[arg(long)]
        token: Option<String>,
    },
    Allowance {
        token: String,
        spender: String,
    },
    Mint {
        token: String,
        amount: String,
    },
    Transfer {
        token: String,
        recipient: String,
        amount: String,
    },
    Approve {
        token: String,
        spender: String,
        amount: String,
    },
}

fn resolve_address(arg: Option<&str>, config: &Config) -> Result<Address> {
    if let Some(address) = arg {
        return parse_address(address);
    }
    let key = config
        .private_key
        .as_deref()
        .context("Pass --address or set PRIVATE_KEY")?;
    let signer: PrivateKeySigner = key.trim().parse().context("Invalid PRIVATE_KEY")?;
    Ok(signer.address())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.json_rpc_urls.len()
    );

    let client = RpcClient::new(&config.json_rpc_urls, config.private_key.as_deref())?;
    let store = Store::new(Arc::new(client), config.store.clone());

    let address = cli.address.as_deref();
    let result = match &cli.command {
        Commands::Profile => cmd_profile(&store, resolve_address(address, &config)?, &format).await,
        Commands::Network => cmd_network(&store, &format).await,
        Commands::Balances => {
            cmd_balances(&store, resolve_address(address, &config)?, &format).await
        }
        Commands::History { token } => {
            let owner = resolve_address(address, &config)?;
            cmd_history(&store, owner, token.as_deref(), &format).await
        }
        Commands::Allowance { token, spender } => {
            let owner = resolve_address(address, &config)?;
            cmd_allowance(&store, owner, token, spender, &format).await
        }
        Commands::Mint { token, amount } => {
            let owner = resolve_address(None, &config)?;
            cmd_mint(&store, owner, token, amount, &format).await
        }
        Commands::Transfer {
            token,
            recipient,
            amount,
        } => {
            let owner = resolve_address(None, &config)?;
            cmd_transfer(&store, owner, token, recipient, amount, &format).await
        }
        Commands::Approve {
            token,
            spender,
            amount,
        } => {
            let owner = resolve_address(None, &config)?;
            cmd_approve(&store, owner, token, spender, amount, &format).await
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}
