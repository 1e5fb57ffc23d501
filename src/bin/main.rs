//! usd-withdrawer CLI - the bridge against a JSON-RPC node
//!
//! Reads:
//!   usd-withdrawer quote              → {"quote": "0.0164..."}   (50 USD in ETH)
//!   usd-withdrawer balance            → {"balance": "1.25"}      (contract ETH)
//!   usd-withdrawer owner              → {"owner": "0x..."}
//!   usd-withdrawer status             → account, ownership, quote, balance
//!   usd-withdrawer accounts           → node accounts
//!   usd-withdrawer networks           → configured networks
//!
//! Transactions (sent from the node's first unlocked account):
//!   usd-withdrawer deposit [amount]   → default 0.03 ETH
//!   usd-withdrawer withdraw           → withdraw50USDInETH()
//!
//! Configuration:
//!   --rpc <url>        (USD_WITHDRAWER_RPC_URL, default: network RPC)
//!   --contract <addr>  (USD_WITHDRAWER_CONTRACT)
//!   --network <id>     (USD_WITHDRAWER_NETWORK, chain id or slug)
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use tracing::debug;
use usd_withdrawer::config::{ENV_CONTRACT, ENV_NETWORK, ENV_RPC_URL};
use usd_withdrawer::logging::init_logging;
use usd_withdrawer::session::DEFAULT_DEPOSIT;
use usd_withdrawer::{AppConfig, Bridge, Contract, HttpProvider, Level, Network, Recorder};

type CliBridge = Bridge<HttpProvider, Contract<HttpProvider>, Recorder>;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("usd-withdrawer {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            emit_error(&opts, &format!("runtime: {}", e));
            std::process::exit(1);
        }
    };

    match runtime.block_on(run(&command, &opts)) {
        Ok(output) => println!("{}", render(&opts, &output)),
        Err(e) => {
            emit_error(&opts, &format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

fn render(opts: &ParsedArgs, value: &Value) -> String {
    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

fn emit_error(opts: &ParsedArgs, message: &str) {
    eprintln!("{}", render(opts, &json!({ "error": message })));
}

fn load_config(opts: &ParsedArgs) -> anyhow::Result<AppConfig> {
    let cli = |key: &str| match key {
        ENV_RPC_URL => opts.rpc_url.clone(),
        ENV_CONTRACT => opts.contract.clone(),
        ENV_NETWORK => opts.network.clone(),
        _ => None,
    };
    Ok(AppConfig::from_lookup(|key| cli(key).or_else(|| env::var(key).ok()))?)
}

fn build_bridge(config: &AppConfig) -> (CliBridge, Recorder) {
    debug!(rpc = config.rpc_url(), contract = %config.contract, "using node");
    let provider = Rc::new(HttpProvider::new(config.rpc_url()));
    let contract = Contract::new(config.contract, provider.clone());
    let recorder = Recorder::new();
    (Bridge::new(provider, contract, recorder.clone()), recorder)
}

/// Collapse the bridge's notifications into a CLI error.
fn failure(recorder: &Recorder, err: impl std::fmt::Display) -> anyhow::Error {
    match recorder.drain().into_iter().rev().find(|n| n.level != Level::Success) {
        Some(n) => anyhow!("{} ({})", n.message, err),
        None => anyhow!("{}", err),
    }
}

async fn run(command: &str, opts: &ParsedArgs) -> anyhow::Result<Value> {
    let config = load_config(opts)?;

    if command == "networks" {
        return Ok(json!({
            "default": config.default_network.chain_id,
            "networks": config.networks,
        }));
    }

    let (bridge, recorder) = build_bridge(&config);

    match command {
        "quote" => {
            let quote = bridge.get_quote().await.map_err(|e| failure(&recorder, e))?;
            Ok(json!({ "quote": quote, "usd": 50 }))
        }
        "balance" => {
            let balance = bridge.get_balance().await.map_err(|e| failure(&recorder, e))?;
            Ok(json!({ "contract": config.contract, "balance": balance }))
        }
        "owner" => {
            use usd_withdrawer::ContractClient;
            let owner = bridge.contract().owner().await?;
            Ok(json!({ "owner": owner }))
        }
        "accounts" => {
            let account = bridge.connect().await.map_err(|e| failure(&recorder, e))?;
            Ok(json!({ "account": account }))
        }
        "status" => {
            bridge.load().await;
            let view = bridge.session().view();
            Ok(json!({
                "network": config.default_network.name,
                "contract": config.contract,
                "view": view,
                "notifications": recorder.drain(),
            }))
        }
        "deposit" => {
            let amount = opts.argument.clone().unwrap_or_else(|| DEFAULT_DEPOSIT.to_string());
            connected(&bridge, &recorder).await?;
            let receipt = bridge.deposit(&amount).await.map_err(|e| failure(&recorder, e))?;
            Ok(json!({
                "deposited": amount,
                "tx": receipt.transaction_hash,
                "balance": bridge.session().balance(),
            }))
        }
        "withdraw" => {
            connected(&bridge, &recorder).await?;
            let receipt = bridge.withdraw().await.map_err(|e| failure(&recorder, e))?;
            Ok(json!({
                "withdrawn": true,
                "tx": receipt.transaction_hash,
                "balance": bridge.session().balance(),
            }))
        }
        other => bail!("Unknown command: {}", other),
    }
}

async fn connected(bridge: &CliBridge, recorder: &Recorder) -> anyhow::Result<()> {
    match bridge.connect().await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => bail!("node exposes no unlocked account"),
        Err(e) => Err(failure(recorder, e)),
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    argument: Option<String>,
    rpc_url: Option<String>,
    contract: Option<String>,
    network: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        // Load .env file if present
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    if !value.is_empty() && env::var(key.trim()).is_err() {
                        env::set_var(key.trim(), value);
                    }
                }
            }
        }

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--rpc" | "-r" => {
                    if i + 1 < args.len() {
                        opts.rpc_url = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--contract" | "-c" => {
                    if i + 1 < args.len() {
                        opts.contract = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--network" | "-n" => {
                    if i + 1 < args.len() {
                        opts.network = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                // Negative amounts reach parse_ether and are rejected there
                _ if arg.len() > 1 && arg[1..].starts_with(|c: char| c.is_ascii_digit()) => {
                    positional.push(arg.clone())
                }
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.argument = positional.next();
        opts
    }
}

fn print_usage() {
    let networks: Vec<String> = Network::all()
        .iter()
        .map(|n| format!("{} ({})", n.slug, n.chain_id))
        .collect();
    println!(
        r#"usd-withdrawer - deposit ETH and withdraw 50 USD worth from the contract

USAGE:
    usd-withdrawer <command> [argument] [options]

COMMANDS:
    quote              ETH equivalent of 50 USD
    balance            Contract ETH balance
    owner              Contract owner address
    status             Account, ownership, quote and balance
    accounts           First unlocked account of the node
    networks           Configured networks
    deposit [amount]   Send ETH to the contract (default {default})
    withdraw           Withdraw 50 USD in ETH (owner only)

OPTIONS:
    -r, --rpc <url>          JSON-RPC endpoint
    -c, --contract <addr>    Contract address
    -n, --network <id>       Network: {networks}
    --json                   Compact JSON output
    --pretty                 Pretty JSON output
    -h, --help               Show this help
    -V, --version            Show version

ENVIRONMENT:
    USD_WITHDRAWER_RPC_URL, USD_WITHDRAWER_CONTRACT, USD_WITHDRAWER_NETWORK,
    USD_WITHDRAWER_LOG_JSON=1, RUST_LOG"#,
        default = DEFAULT_DEPOSIT,
        networks = networks.join(", "),
    );
}
