use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use eth_contracts::{
    config::Config,
    ethereum::utils,
    AlloyProvider, ArgumentMap, ContractDefinition, ContractFactory, TracingLogger,
    TransactionOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

fn artifact_arg() -> Arg {
    Arg::new("artifact")
        .short('a')
        .long("artifact")
        .value_name("FILE")
        .required(true)
        .help("Compiler output JSON with 'interface' (ABI) and 'bytecode'")
}

fn args_arg() -> Arg {
    Arg::new("args")
        .long("args")
        .value_name("JSON")
        .help("Named arguments as a JSON object, e.g. '{\"to\": \"0x..\", \"amount\": 5}'")
}

fn method_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(artifact_arg())
        .arg(
            Arg::new("address")
                .long("address")
                .value_name("ADDRESS")
                .required(true)
                .help("Address of the deployed contract"),
        )
        .arg(
            Arg::new("method")
                .short('m')
                .long("method")
                .value_name("NAME")
                .required(true)
                .help("Contract method to invoke"),
        )
        .arg(args_arg())
}

fn parse_arguments(matches: &ArgMatches) -> Result<ArgumentMap> {
    match matches.get_one::<String>("args") {
        None => Ok(ArgumentMap::new()),
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(args) => Ok(args),
            other => Err(anyhow!(
                "Arguments must be a JSON object keyed by parameter name, got: {}",
                other
            )),
        },
    }
}

async fn load_definition(matches: &ArgMatches) -> Result<ContractDefinition> {
    let path = matches
        .get_one::<String>("artifact")
        .ok_or_else(|| anyhow!("Missing --artifact"))?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("Failed to read artifact {}: {}", path, e))?;

    Ok(ContractDefinition::from_artifact_json(&content)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("eth-contracts")
        .version("0.1.0")
        .about("Deploy and call Ethereum smart contracts from compiler output")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .global(true)
                .help("Network to use (see configuration)"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .global(true)
                .help("RPC endpoint URL"),
        )
        .arg(
            Arg::new("account")
                .long("account")
                .value_name("ADDRESS")
                .global(true)
                .help("Account to send transactions from"),
        )
        .arg(
            Arg::new("gas")
                .long("gas")
                .value_name("AMOUNT")
                .global(true)
                .value_parser(clap::value_parser!(u64))
                .help("Gas limit for transactions"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("deploy")
                .about("Deploy a contract and print its address")
                .arg(artifact_arg())
                .arg(args_arg()),
        )
        .subcommand(method_command(
            "call",
            "Call a read-only method and print its result",
        ))
        .subcommand(method_command(
            "send",
            "Send a transaction to a method and print the receipt",
        ))
        .get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let (command, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("No command given. Use one of: deploy, call, send"))?;

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    if let Some(network) = matches.get_one::<String>("network") {
        config.default_network = network.clone();
    }

    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        if let Some(network_config) = config.networks.get_mut(&config.default_network) {
            network_config.rpc_url = rpc_url.clone();
        }
    }

    if let Some(account) = matches.get_one::<String>("account") {
        config.account.default_account = Some(account.clone());
    }

    let account = config.account.default_account.clone().ok_or_else(|| {
        anyhow!("No sending account configured. Use --account or set account.default_account")
    })?;
    utils::validate_address(&account).map_err(|e| anyhow!("Invalid sending account: {}", e))?;

    let gas = match matches.get_one::<u64>("gas") {
        Some(gas) => *gas,
        None => config.default_gas_limit(None)?,
    };

    let provider = AlloyProvider::new(&config, None)?;
    info!("Using network: {}", provider.network());
    provider.validate_connection().await?;

    let factory = ContractFactory::new(Arc::new(provider), account, gas)
        .with_poll_interval(config.transactions.receipt_poll_interval())
        .with_logger(Arc::new(TracingLogger));

    let contract = factory.make(load_definition(sub_matches).await?);
    let args = parse_arguments(sub_matches)?;

    let output = match command {
        "deploy" => {
            let instance = contract.deploy(&args, TransactionOptions::default()).await?;
            json!({ "address": instance.address() })
        }
        "call" | "send" => {
            let address = sub_matches
                .get_one::<String>("address")
                .ok_or_else(|| anyhow!("Missing --address"))?;
            let method = sub_matches
                .get_one::<String>("method")
                .ok_or_else(|| anyhow!("Missing --method"))?;
            utils::validate_address(address)
                .map_err(|e| anyhow!("Invalid contract address: {}", e))?;
            utils::validate_function_name(method)?;

            let instance = contract.at(address.clone());
            if command == "call" {
                instance.local_call(method, &args).await?
            } else {
                instance
                    .send_call(method, &args, TransactionOptions::default())
                    .await?
            }
        }
        other => return Err(anyhow!("Unknown command: {}", other)),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
