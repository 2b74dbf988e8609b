//! Split fetched records into tokens to update and tokens to report

use mpl_token_metadata::accounts::Metadata;
use solana_sdk::pubkey::Pubkey;

use crate::fetcher::{FetchedMetadata, MetadataLookup};

/// A mutable token that will receive an update instruction
#[derive(Debug, Clone)]
pub struct EligibleToken {
    pub mint: Pubkey,
    pub address: Pubkey,
    pub metadata: Metadata,
}

/// Fetched records grouped by what happens to them
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub eligible: Vec<EligibleToken>,
    pub immutable: Vec<Pubkey>,
    pub missing: Vec<Pubkey>,
    pub undecodable: Vec<(Pubkey, String)>,
}

impl Partition {
    pub fn skipped_count(&self) -> usize {
        self.immutable.len() + self.missing.len() + self.undecodable.len()
    }
}

/// Partition lookups by account state and mutability flag
pub fn partition(fetched: Vec<FetchedMetadata>) -> Partition {
    let mut partition = Partition::default();

    for entry in fetched {
        match entry.lookup {
            MetadataLookup::Found(metadata) if metadata.is_mutable => {
                partition.eligible.push(EligibleToken {
                    mint: entry.mint,
                    address: entry.address,
                    metadata: *metadata,
                });
            }
            MetadataLookup::Found(_) => partition.immutable.push(entry.mint),
            MetadataLookup::Missing => partition.missing.push(entry.mint),
            MetadataLookup::Undecodable { reason } => {
                partition.undecodable.push((entry.mint, reason))
            }
        }
    }

    partition
}
