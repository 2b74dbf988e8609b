//! Sequential batch submission with retries

use std::time::Duration;

use solana_sdk::{
    instruction::Instruction, message::Message, pubkey::Pubkey, signature::Signature,
};
use tokio::time;

use crate::config::RetryConfig;
use crate::error::{UpdaterError, UpdaterResult};
use crate::fetcher::trim_padding;
use crate::filter::EligibleToken;
use crate::input::UpdateRequest;
use crate::ledger::Ledger;
use crate::update::{build_update_instruction, plan_update, CreatorChange, CreatorSkip};

/// Result of submitting one batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Zero-based batch index
    pub index: usize,
    /// Number of update instructions in the batch
    pub size: usize,
    /// Confirmed signature, `None` in dry-run mode
    pub signature: Option<Signature>,
    /// Submission attempts including the successful one
    pub attempts: u32,
}

impl BatchOutcome {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Everything the executor did across all batches
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    pub batches: Vec<BatchOutcome>,
    pub creator_skips: Vec<(Pubkey, CreatorSkip)>,
}

/// Number of batches needed for `items` tokens at `batch_size` per batch
pub fn batch_count(items: usize, batch_size: usize) -> usize {
    items.div_ceil(batch_size)
}

/// Largest serialized transaction the cluster accepts (IPv6 MTU minus headers)
pub const MAX_TRANSACTION_SIZE: usize = 1280 - 40 - 8;

/// Wire size of a signed legacy transaction carrying `instructions`
pub fn transaction_size(instructions: &[Instruction], payer: &Pubkey) -> usize {
    let message = Message::new(instructions, Some(payer));
    let signatures = message.header.num_required_signatures as usize;
    // Signature count fits the one-byte compact-u16 form
    1 + signatures * 64 + message.serialize().len()
}

/// Submits update batches one after another
pub struct BatchExecutor<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    batch_size: usize,
    retry: RetryConfig,
    inter_batch_delay: Duration,
    dry_run: bool,
}

impl<'a, L: Ledger + ?Sized> BatchExecutor<'a, L> {
    pub fn new(ledger: &'a L, batch_size: usize, retry: RetryConfig) -> Self {
        Self {
            ledger,
            batch_size,
            retry,
            inter_batch_delay: Duration::from_millis(1),
            dry_run: false,
        }
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Plan, build and submit updates for every eligible token
    pub async fn execute(
        &self,
        tokens: &[EligibleToken],
        request: &UpdateRequest,
    ) -> UpdaterResult<ExecutionSummary> {
        if self.batch_size == 0 {
            return Err(UpdaterError::InvalidConfig(
                "max_batch_size must be greater than 0".into(),
            ));
        }

        let chunks: Vec<&[EligibleToken]> = tokens.chunks(self.batch_size).collect();
        log::info!("Found {} chunks to process", chunks.len());

        let mut summary = ExecutionSummary::default();
        for (index, chunk) in chunks.iter().enumerate() {
            log::info!(
                "Processing chunk {} of {} with {} items",
                index + 1,
                chunks.len(),
                chunk.len()
            );

            let instructions = self.build_batch(chunk, request, &mut summary.creator_skips);

            // The cluster rejects a transaction over the packet size on every attempt
            let size = transaction_size(&instructions, &self.ledger.authority());
            if size > MAX_TRANSACTION_SIZE {
                return Err(UpdaterError::TransactionTooLarge {
                    batch: index + 1,
                    size,
                    limit: MAX_TRANSACTION_SIZE,
                });
            }

            let outcome = if self.dry_run {
                log::info!("DRY RUN: Would submit {} instructions", instructions.len());
                BatchOutcome {
                    index,
                    size: chunk.len(),
                    signature: None,
                    attempts: 0,
                }
            } else {
                let (signature, attempts) = self.submit_with_retry(index, &instructions).await?;
                BatchOutcome {
                    index,
                    size: chunk.len(),
                    signature: Some(signature),
                    attempts,
                }
            };
            summary.batches.push(outcome);

            time::sleep(self.inter_batch_delay).await;
        }

        Ok(summary)
    }

    fn build_batch(
        &self,
        chunk: &[EligibleToken],
        request: &UpdateRequest,
        creator_skips: &mut Vec<(Pubkey, CreatorSkip)>,
    ) -> Vec<Instruction> {
        let authority = self.ledger.authority();

        chunk
            .iter()
            .map(|token| {
                let name = trim_padding(&token.metadata.name);
                log::info!("Creating instruction for {}", name);

                let plan = plan_update(&token.metadata, request);
                if let CreatorChange::Skipped(reason) = &plan.creators {
                    log::warn!("Could not update creators for {} ({}): {}", name, token.mint, reason);
                    creator_skips.push((token.mint, *reason));
                }

                build_update_instruction(token, &authority, &plan)
            })
            .collect()
    }

    /// Submit one batch until it confirms or the retry policy gives up
    async fn submit_with_retry(
        &self,
        index: usize,
        instructions: &[Instruction],
    ) -> UpdaterResult<(Signature, u32)> {
        let mut failures = 0u32;

        loop {
            match self.ledger.submit(instructions).await {
                Ok(signature) => {
                    log::info!("txId {}", signature);
                    log::info!("Success");
                    return Ok((signature, failures + 1));
                }
                Err(e) => {
                    failures += 1;
                    log::warn!("Batch {} attempt {} failed: {}", index + 1, failures, e);

                    if !self.retry.allows_retry(failures) {
                        return Err(UpdaterError::RetriesExhausted {
                            batch: index + 1,
                            attempts: failures,
                            last_error: e.to_string(),
                        });
                    }

                    let delay_ms = self.retry.delay_for_attempt(failures - 1);
                    log::info!("Retrying");
                    time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}
