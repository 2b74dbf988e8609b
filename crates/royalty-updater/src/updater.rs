use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::batch::BatchExecutor;
use crate::config::UpdaterConfig;
use crate::error::UpdaterResult;
use crate::fetcher::fetch_metadata;
use crate::filter::{partition, Partition};
use crate::input::UpdateRequest;
use crate::ledger::Ledger;
use crate::report::RunReport;
use crate::verify::verify_royalties;

/// Runs the fetch, filter, update and verify workflow over a mint list
pub struct RoyaltyUpdater {
    /// Ledger used for reads and transaction submission
    ledger: Arc<dyn Ledger>,

    /// Run configuration
    config: UpdaterConfig,
}

impl RoyaltyUpdater {
    pub fn new(ledger: Arc<dyn Ledger>, config: UpdaterConfig) -> Self {
        Self { ledger, config }
    }

    /// Apply `request` to every mutable token in `mints`
    pub async fn run(&self, mints: &[Pubkey], request: &UpdateRequest) -> UpdaterResult<RunReport> {
        self.config.validate()?;
        let mut report = RunReport::new(self.ledger.endpoint(), mints.len());

        log::info!("Update authority: {}", self.ledger.authority());
        if let Some(royalty) = request.royalty {
            log::info!("New royalty: {} bps", royalty);
        }
        if let Some(creator) = &request.new_creator {
            log::info!("New creator: {}", creator);
        }

        let fetched = fetch_metadata(self.ledger.as_ref(), mints).await?;
        let partition = partition(fetched);
        report.record_partition(&partition);

        if !partition.immutable.is_empty() {
            log::info!(
                "Found {} immutable NFTs, will skip these",
                partition.immutable.len()
            );
        }

        // Skipped mints are printed whether or not the batches go through
        let result = self.execute(&partition, request, &mut report).await;
        report.print_skipped();
        result.map(|()| report)
    }

    async fn execute(
        &self,
        partition: &Partition,
        request: &UpdateRequest,
        report: &mut RunReport,
    ) -> UpdaterResult<()> {
        let executor = BatchExecutor::new(
            self.ledger.as_ref(),
            self.config.max_batch_size,
            self.config.retry.clone(),
        )
        .with_inter_batch_delay(self.config.inter_batch_delay())
        .with_dry_run(self.config.dry_run);

        let summary = executor.execute(&partition.eligible, request).await?;
        report.record_execution(summary);

        if self.config.dry_run {
            log::info!("DRY RUN: Skipping verification");
        } else {
            let processed: Vec<Pubkey> = partition.eligible.iter().map(|t| t.mint).collect();
            let verification =
                verify_royalties(self.ledger.as_ref(), &processed, request.royalty).await?;
            report.verification = Some(verification);
        }

        Ok(())
    }
}
