//! Post-update verification

use solana_sdk::pubkey::Pubkey;

use crate::error::{UpdaterError, UpdaterResult};
use crate::fetcher::{fetch_metadata, MetadataLookup};
use crate::ledger::Ledger;
use crate::update::creator_share_total;

/// Outcome of a successful verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Tokens re-fetched
    pub checked: usize,
    /// Tokens whose royalty was compared against the override
    pub royalty_checked: usize,
    /// Tokens whose creator shares no longer sum to 100
    pub unbalanced_creators: Vec<Pubkey>,
}

/// Re-fetch `mints` and check every royalty equals `expected_royalty` when given.
///
/// The first mismatch or unreadable record aborts with an error.
pub async fn verify_royalties<L: Ledger + ?Sized>(
    ledger: &L,
    mints: &[Pubkey],
    expected_royalty: Option<u16>,
) -> UpdaterResult<VerificationReport> {
    let fetched = fetch_metadata(ledger, mints).await?;

    let mut report = VerificationReport::default();
    for entry in fetched {
        let metadata = match entry.lookup {
            MetadataLookup::Found(metadata) => metadata,
            MetadataLookup::Missing => {
                return Err(UpdaterError::MissingAfterUpdate {
                    mint: entry.mint,
                    reason: "account not found".to_string(),
                })
            }
            MetadataLookup::Undecodable { reason } => {
                return Err(UpdaterError::MissingAfterUpdate {
                    mint: entry.mint,
                    reason,
                })
            }
        };
        report.checked += 1;

        if let Some(expected) = expected_royalty {
            if metadata.seller_fee_basis_points != expected {
                log::error!("Found problem with {}", entry.mint);
                return Err(UpdaterError::VerificationFailed {
                    mint: entry.mint,
                    expected,
                    found: metadata.seller_fee_basis_points,
                });
            }
            report.royalty_checked += 1;
        }

        if metadata.creators.as_ref().is_some_and(|c| !c.is_empty())
            && creator_share_total(metadata.creators.as_ref()) != 100
        {
            log::warn!("Creator shares for {} do not sum to 100", entry.mint);
            report.unbalanced_creators.push(entry.mint);
        }
    }

    log::info!(
        "Verified {} tokens ({} royalty checks)",
        report.checked,
        report.royalty_checked
    );
    Ok(report)
}
