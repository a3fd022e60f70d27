//! Chainsig CLI
//!
//! Operator tool for the cross-chain signing pipeline: derive addresses,
//! encode call data, query balances, and inspect pending signing sessions.

use anyhow::{bail, Context, Result};
use chainsig_core::{
    derive_address, encode_call, AbiValue, DerivationPath, EvmClient, EvmConfig, FileSessionStore,
    RootPublicKey, SessionStore, CoordinatorConfig, Eip1559Transaction,
};
use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chainsig")]
#[command(about = "Cross-chain MPC signing pipeline CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the EVM address an (owner, path) pair controls
    DeriveAddress {
        /// Owner account id on the source chain
        owner: String,

        /// Derivation path, e.g. evm-1
        #[arg(short, long, default_value = "evm-1")]
        path: String,

        /// Coordinator root public key; defaults to the testnet deployment
        #[arg(short, long)]
        root_key: Option<String>,
    },

    /// Encode contract call data from a canonical signature
    EncodeCall {
        /// Canonical function signature, e.g. transfer(address,uint256)
        signature: String,

        /// Arguments as address:0x.., uint:.., bool:.. pairs
        args: Vec<String>,
    },

    /// Query the native balance of an address
    Balance {
        /// EVM address to query
        address: String,

        /// Target chain (mainnet, sepolia, aurora)
        #[arg(short, long, default_value = "sepolia")]
        chain: String,
    },

    /// List the built-in target chains
    Chains,

    /// Inspect or clear the pending signing session checkpoint
    Pending {
        /// Directory holding session checkpoints
        #[arg(short, long, default_value = ".chainsig")]
        dir: String,

        /// Signer scope (usually the owner account id)
        owner: String,

        /// Remove the checkpoint instead of showing it
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DeriveAddress {
            owner,
            path,
            root_key,
        } => derive(&owner, &path, root_key.as_deref()),
        Commands::EncodeCall { signature, args } => encode(&signature, &args),
        Commands::Balance { address, chain } => balance(&address, &chain).await,
        Commands::Chains => {
            show_chains();
            Ok(())
        }
        Commands::Pending { dir, owner, clear } => pending(&dir, &owner, clear).await,
    }
}

fn derive(owner: &str, path: &str, root_key: Option<&str>) -> Result<()> {
    let root: RootPublicKey = root_key
        .unwrap_or(&CoordinatorConfig::testnet().root_public_key)
        .parse()?;
    let path = DerivationPath::new(path)?;
    let derived = derive_address(&root, owner, &path)?;

    println!("Owner:      {}", owner);
    println!("Path:       {}", path);
    println!("Address:    {:#x}", derived.address);
    println!("Public key: {}", derived.public_key.to_base58_string());
    Ok(())
}

fn encode(signature: &str, raw_args: &[String]) -> Result<()> {
    let args = raw_args
        .iter()
        .map(|raw| parse_abi_value(raw))
        .collect::<Result<Vec<_>>>()?;
    let data = encode_call(signature, &args)?;
    println!("0x{}", hex::encode(data));
    Ok(())
}

fn parse_abi_value(raw: &str) -> Result<AbiValue> {
    let (kind, value) = raw
        .split_once(':')
        .with_context(|| format!("argument '{}' must be kind:value", raw))?;
    match kind {
        "address" => {
            let address: Address = value
                .parse()
                .with_context(|| format!("invalid address '{}'", value))?;
            Ok(AbiValue::Address(address))
        }
        "uint" => {
            let amount: U256 = value
                .parse()
                .with_context(|| format!("invalid uint '{}'", value))?;
            Ok(AbiValue::Uint(amount))
        }
        "bool" => {
            let flag: bool = value
                .parse()
                .with_context(|| format!("invalid bool '{}'", value))?;
            Ok(AbiValue::Bool(flag))
        }
        other => bail!("unsupported argument kind '{}'", other),
    }
}

async fn balance(address: &str, chain: &str) -> Result<()> {
    let config = chain_config(chain)?;
    let address: Address = address
        .parse()
        .with_context(|| format!("invalid address '{}'", address))?;

    let client = EvmClient::new(config)?;
    let balance = client.get_balance(address).await?;
    println!("{}", balance);
    Ok(())
}

fn chain_config(name: &str) -> Result<EvmConfig> {
    match name {
        "mainnet" => Ok(EvmConfig::ethereum_mainnet()),
        "sepolia" => Ok(EvmConfig::ethereum_sepolia()),
        "aurora" => Ok(EvmConfig::aurora_mainnet()),
        other => bail!("unknown chain '{}', expected mainnet, sepolia, or aurora", other),
    }
}

fn show_chains() {
    for config in [
        EvmConfig::ethereum_mainnet(),
        EvmConfig::ethereum_sepolia(),
        EvmConfig::aurora_mainnet(),
    ] {
        println!("{}", config.chain_id);
        for url in &config.rpc_urls {
            println!("  rpc: {}", url);
        }
        if let Some(explorer) = &config.explorer_url {
            println!("  explorer: {}", explorer);
        }
    }
}

async fn pending(dir: &str, owner: &str, clear: bool) -> Result<()> {
    let store = FileSessionStore::new(dir, owner);

    if clear {
        store.clear().await?;
        println!("Checkpoint cleared");
        return Ok(());
    }

    match store.resume().await? {
        Some(session) => {
            let tx = Eip1559Transaction::decode_unsigned(&session.transaction)?;
            println!("Path:     {}", session.path);
            println!("Chain id: {}", tx.chain_id);
            println!("Nonce:    {}", tx.nonce);
            println!("To:       {:#x}", tx.to);
            println!("Value:    {}", tx.value);
            println!("Payload:  0x{}", hex::encode(tx.signing_hash()));
        }
        None => println!("No pending signing session"),
    }
    Ok(())
}
