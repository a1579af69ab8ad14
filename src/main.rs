use clap::{Parser, ValueEnum};
use comfypay::application::input::BatchInput;
use comfypay::application::orchestrator::BatchOrchestrator;
use comfypay::config::{BASE_SEPOLIA_CHAIN_ID, DEFAULT_TOKEN_DECIMALS, NetworkConfig};
use comfypay::domain::amount::DecimalsSource;
use comfypay::domain::ports::{EncryptionClientBox, TokenClientBox, WalletBox};
use comfypay::infrastructure::in_memory::{InMemoryEncryption, InMemoryTokenLedger, InMemoryWallet};
use comfypay::interfaces::csv::status_writer::{StatusWriter, write_json};
use miette::{IntoDiagnostic, Result};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Send confidential token payments to a batch of recipients.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recipient addresses (comma or newline separated)
    #[arg(long, conflicts_with = "recipients_file")]
    recipients: Option<String>,

    /// File containing recipient addresses
    #[arg(long)]
    recipients_file: Option<PathBuf>,

    /// Amounts in tokens, one per recipient (comma or newline separated)
    #[arg(long, conflicts_with = "amounts_file")]
    amounts: Option<String>,

    /// File containing amounts
    #[arg(long)]
    amounts_file: Option<PathBuf>,

    /// Token contract address. Defaults to the network's confidential USDC.
    #[arg(long, env = "TOKEN_ADDRESS")]
    token: Option<String>,

    /// Network chain id.
    #[arg(long, env = "CHAIN_ID", default_value_t = BASE_SEPOLIA_CHAIN_ID)]
    chain_id: u64,

    /// Sending account. Without it the wallet counts as disconnected.
    #[arg(long, env = "WALLET_ACCOUNT")]
    account: Option<String>,

    /// Token decimal places.
    #[arg(long, default_value_t = DEFAULT_TOKEN_DECIMALS, conflicts_with = "fetch_decimals")]
    decimals: u32,

    /// Read decimals from the token contract instead of using --decimals.
    #[arg(long)]
    fetch_decimals: bool,

    /// Output format for the payment status table.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

fn read_field(inline: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(path).into_diagnostic(),
        (None, None) => Ok(String::new()),
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let wallet: WalletBox = match cli.account.as_deref() {
        Some(account) => Box::new(InMemoryWallet::connected(account, cli.chain_id)),
        None => Box::new(InMemoryWallet::disconnected(cli.chain_id)),
    };
    let ledger: TokenClientBox = Box::new(InMemoryTokenLedger::new());
    let encryption: EncryptionClientBox = Box::new(InMemoryEncryption::new());

    let decimals = if cli.fetch_decimals {
        DecimalsSource::FromContract
    } else {
        DecimalsSource::Fixed(cli.decimals)
    };
    let orchestrator = BatchOrchestrator::new(wallet, ledger, encryption, NetworkConfig::default())
        .with_decimals(decimals);

    orchestrator.initialize_encryption().await.into_diagnostic()?;
    if let Err(e) = orchestrator.executor_fee().await {
        warn!("Failed to fetch executor fee: {}", e);
    }
    match orchestrator.refresh_balance_handle(cli.token.as_deref()).await {
        Ok(Some(_)) => info!("Your current encrypted balance: Encrypted (handle only)"),
        Ok(None) => {}
        Err(e) => warn!("Failed to check balance: {}", e),
    }

    let mut input = BatchInput::new(
        read_field(cli.recipients, cli.recipients_file)?,
        read_field(cli.amounts, cli.amounts_file)?,
    );
    if let Some(token) = cli.token {
        input = input.with_token(token);
    }

    let summary = input.summary();
    info!(
        "Number of recipients: {}, total amount: {:.2} tokens",
        summary.recipient_count, summary.total_amount
    );

    let report = orchestrator.submit(&input).await.into_diagnostic()?;

    let stdout = io::stdout();
    match cli.format {
        OutputFormat::Csv => StatusWriter::new(stdout.lock())
            .write_statuses(&report.statuses)
            .into_diagnostic()?,
        OutputFormat::Json => write_json(stdout.lock(), &report.statuses).into_diagnostic()?,
    }

    Ok(())
}
