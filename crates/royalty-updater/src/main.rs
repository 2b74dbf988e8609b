use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use royalty_updater::{
    input::RoyaltyOverride, load_mints, report::print_network, CreatorSpec, RoyaltyUpdater,
    RpcLedger, UpdateRequest, UpdaterConfig,
};

#[derive(Parser, Debug)]
#[command(name = "royalty-updater")]
#[command(about = "Batch-update royalties and creators of mutable Metaplex NFTs")]
#[command(version)]
struct Args {
    /// JSON file containing an array of mint addresses
    input: PathBuf,

    /// New royalty in basis points; omit, or pass "" or "-", to keep each token's royalty
    royalty: Option<RoyaltyOverride>,

    /// New creator as "<address>;<share>", split from the 100% creator
    creator: Option<CreatorSpec>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// RPC URL for Solana cluster
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Update authority keypair file path
    #[arg(short, long)]
    keypair: Option<String>,

    /// Maximum number of updates per transaction
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Delay between retries of a failed batch in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Give up on a batch after this many retries (retries forever by default)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Dry run mode - build instructions but don't submit them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(UpdaterConfig, PathBuf, UpdateRequest)> {
        let mut config = match &self.config {
            Some(path) => UpdaterConfig::from_file(path)?,
            None => UpdaterConfig::default(),
        };

        if let Some(rpc_url) = self.rpc_url {
            config.endpoint = rpc_url;
        }
        if let Some(keypair) = self.keypair {
            config.wallet_path = keypair;
        }
        if let Some(batch_size) = self.batch_size {
            config.max_batch_size = batch_size;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry.base_delay_ms = delay;
            config.retry.max_delay_ms = config.retry.max_delay_ms.max(delay);
        }
        if self.max_retries.is_some() {
            config.retry.max_retries = self.max_retries;
        }
        config.dry_run |= self.dry_run;
        config.validate()?;

        let request = UpdateRequest {
            royalty: self.royalty.and_then(|royalty| royalty.0),
            new_creator: self.creator,
        };

        Ok((config, self.input, request))
    }
}

async fn run(config: UpdaterConfig, input: PathBuf, request: UpdateRequest) -> anyhow::Result<()> {
    let mints = load_mints(&input)?;
    log::info!("Loaded {} mints from {}", mints.len(), input.display());

    let ledger = RpcLedger::connect(&config)?;
    let updater = RoyaltyUpdater::new(Arc::new(ledger), config);

    let report = updater.run(&mints, &request).await?;
    log::info!(
        "Updated {} of {} mints in {} batches ({} retries)",
        report.updated,
        report.requested,
        report.batch_sizes.len(),
        report.retries
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let (config, input, request) = match args.into_config() {
        Ok(parts) => parts,
        Err(e) => {
            log::error!("Error {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.dry_run {
        log::warn!("Running in DRY RUN mode - no updates will be submitted");
    }

    let endpoint = config.endpoint.clone();
    let result = run(config, input, request).await;

    if let Err(e) = &result {
        log::error!("Error {}", e);
    }
    print_network(&endpoint);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
