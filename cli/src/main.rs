//! SecureChain node: ledger bootstrap and HTTP service

use clap::Parser;
use owo_colors::OwoColorize;
use securechain_api::{ApiState, VoterRegistry};
use securechain_core::{verify_chain, Ledger, PartyRegistry, DEFAULT_DIFFICULTY};
use securechain_crypto::KeyPair;
use securechain_storage::{ChainStore, SnapshotStore};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "securechaind")]
#[command(about = "SecureChain voting ledger node")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Proof-of-work difficulty (overrides config)
    #[arg(long)]
    difficulty: Option<usize>,

    /// Dev mode: accept the demo OTP code and log issued codes
    #[arg(long)]
    dev: bool,

    /// Show version
    #[arg(long)]
    version: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    node: NodeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NodeConfig {
    listen: String,
    data_dir: PathBuf,
    difficulty: usize,
    dev_mode: bool,
    session_ttl_minutes: i64,
    /// JSON file with the ballot; the standard four-party ballot if unset
    parties_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            data_dir: PathBuf::from("data"),
            difficulty: DEFAULT_DIFFICULTY,
            dev_mode: false,
            session_ttl_minutes: 60,
            parties_file: None,
        }
    }
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("securechaind v{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to read config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(listen) = cli.listen {
        config.node.listen = listen;
    }
    if let Some(data_dir) = cli.data_dir {
        config.node.data_dir = data_dir;
    }
    if let Some(difficulty) = cli.difficulty {
        config.node.difficulty = difficulty;
    }
    if cli.dev {
        config.node.dev_mode = true;
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "node failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let node = config.node;
    let addr: SocketAddr = node.listen.parse()?;

    let keypair = Arc::new(KeyPair::load_or_generate(node.data_dir.join("node_key.bin"))?);

    let chain_store = Arc::new(ChainStore::open(node.data_dir.join("chain"))?);
    let blocks = chain_store.load()?;

    // A chain that fails verification is an operator problem, not something
    // to serve votes on top of.
    let verification = verify_chain(&blocks, node.difficulty);
    if !verification.valid {
        return Err(format!(
            "chain verification failed at index {:?} ({:?}); refusing to start",
            verification.first_invalid_index, verification.fault
        )
        .into());
    }

    let height = blocks.len() as u64;
    let ledger = Arc::new(Ledger::with_blocks(chain_store, blocks, node.difficulty));

    let voters = Arc::new(VoterRegistry::open(SnapshotStore::open(
        node.data_dir.join("state"),
    )?)?);

    let parties = Arc::new(match &node.parties_file {
        Some(path) => PartyRegistry::from_file(path)?,
        None => PartyRegistry::default(),
    });

    display_banner(&addr, height, node.difficulty, node.dev_mode, &keypair);
    tracing::info!(
        listen = %addr,
        height,
        difficulty = node.difficulty,
        dev_mode = node.dev_mode,
        "node_started"
    );

    let state = ApiState::new(ledger, voters, keypair, parties, node.dev_mode)
        .with_session_ttl(node.session_ttl_minutes);

    securechain_api::start_server(addr, state).await
}

fn display_banner(addr: &SocketAddr, height: u64, difficulty: usize, dev_mode: bool, keypair: &KeyPair) {
    println!(
        "\n{}",
        "╔═══════════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║              SECURECHAIN VOTING NODE              ║".cyan().bold()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════════╝".cyan()
    );

    println!("\n{}: {}", "Listen".yellow().bold(), addr);
    println!("{}: {} block(s)", "Chain".yellow().bold(), height.to_string().green());
    println!("{}: {} leading zero(s)", "Difficulty".yellow().bold(), difficulty);
    println!(
        "{}: {}",
        "Public key".yellow().bold(),
        keypair.public_key_hex().bright_blue()
    );
    if dev_mode {
        println!("{}", "Dev mode: demo OTP code accepted".red().bold());
    }
    println!();
}
