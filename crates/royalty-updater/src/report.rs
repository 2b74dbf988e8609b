//! Run summary and operator-facing output

use solana_sdk::pubkey::Pubkey;

use crate::batch::ExecutionSummary;
use crate::filter::Partition;
use crate::update::CreatorSkip;
use crate::verify::VerificationReport;

/// Summary of one update run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub endpoint: String,
    pub requested: usize,
    pub updated: usize,
    pub batch_sizes: Vec<usize>,
    pub retries: u32,
    pub immutable: Vec<Pubkey>,
    pub missing: Vec<Pubkey>,
    pub undecodable: Vec<(Pubkey, String)>,
    pub creator_skips: Vec<(Pubkey, CreatorSkip)>,
    pub verification: Option<VerificationReport>,
}

impl RunReport {
    pub fn new(endpoint: String, requested: usize) -> Self {
        Self {
            endpoint,
            requested,
            ..Self::default()
        }
    }

    /// Record tokens the filter excluded
    pub fn record_partition(&mut self, partition: &Partition) {
        self.immutable = partition.immutable.clone();
        self.missing = partition.missing.clone();
        self.undecodable = partition.undecodable.clone();
    }

    /// Record submitted batches
    pub fn record_execution(&mut self, summary: ExecutionSummary) {
        self.updated = summary.batches.iter().map(|b| b.size).sum();
        self.batch_sizes = summary.batches.iter().map(|b| b.size).collect();
        self.retries = summary.batches.iter().map(|b| b.retries()).sum();
        self.creator_skips = summary.creator_skips;
    }

    /// Log skipped tokens
    pub fn print_skipped(&self) {
        if !self.immutable.is_empty() {
            log::info!("Skipped mints:");
            for mint in &self.immutable {
                log::info!("{}", mint);
            }
        }

        if !self.missing.is_empty() {
            log::warn!("Mints without a metadata account:");
            for mint in &self.missing {
                log::warn!("{}", mint);
            }
        }

        for (mint, reason) in &self.undecodable {
            log::warn!("Could not decode metadata for {}: {}", mint, reason);
        }

        if !self.creator_skips.is_empty() {
            log::warn!(
                "Creators left unchanged on {} mints (royalty still updated)",
                self.creator_skips.len()
            );
        }
    }
}

/// Print the network used, regardless of the run outcome
pub fn print_network(endpoint: &str) {
    log::info!("Solana network {}", endpoint);
}
