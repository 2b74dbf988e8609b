//! Bulk metadata lookup

use mpl_token_metadata::accounts::Metadata;
use solana_sdk::{account::Account, pubkey::Pubkey};

use crate::error::UpdaterResult;
use crate::ledger::Ledger;
use crate::pda::metadata_address;

/// Largest address list accepted by `getMultipleAccounts`
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// Outcome of looking up one metadata account
#[derive(Debug, Clone)]
pub enum MetadataLookup {
    Found(Box<Metadata>),
    Missing,
    Undecodable { reason: String },
}

/// A mint together with its metadata address and lookup outcome
#[derive(Debug, Clone)]
pub struct FetchedMetadata {
    pub mint: Pubkey,
    pub address: Pubkey,
    pub lookup: MetadataLookup,
}

impl MetadataLookup {
    /// Decode a raw account, `None` meaning the account does not exist
    pub fn from_account(account: Option<&Account>) -> Self {
        let Some(account) = account else {
            return MetadataLookup::Missing;
        };

        if account.owner != mpl_token_metadata::ID {
            return MetadataLookup::Undecodable {
                reason: format!("account is owned by {}", account.owner),
            };
        }

        match Metadata::from_bytes(&account.data) {
            Ok(metadata) => MetadataLookup::Found(Box::new(metadata)),
            Err(e) => MetadataLookup::Undecodable {
                reason: e.to_string(),
            },
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            MetadataLookup::Found(metadata) => Some(metadata),
            _ => None,
        }
    }
}

/// Resolve metadata addresses for `mints` and fetch them in bulk.
///
/// Output order matches input order.
pub async fn fetch_metadata<L: Ledger + ?Sized>(
    ledger: &L,
    mints: &[Pubkey],
) -> UpdaterResult<Vec<FetchedMetadata>> {
    let addresses: Vec<Pubkey> = mints.iter().map(metadata_address).collect();

    let mut fetched = Vec::with_capacity(mints.len());
    for (page_mints, page_addresses) in mints
        .chunks(MAX_MULTIPLE_ACCOUNTS)
        .zip(addresses.chunks(MAX_MULTIPLE_ACCOUNTS))
    {
        let accounts = ledger.get_multiple_accounts(page_addresses).await?;
        log::debug!("Fetched {} metadata accounts", accounts.len());

        for (i, (mint, address)) in page_mints.iter().zip(page_addresses).enumerate() {
            fetched.push(FetchedMetadata {
                mint: *mint,
                address: *address,
                lookup: MetadataLookup::from_account(accounts.get(i).and_then(Option::as_ref)),
            });
        }
    }

    Ok(fetched)
}

/// Strip the NUL padding Metaplex stores after names, symbols and URIs
pub fn trim_padding(value: &str) -> &str {
    value.trim_end_matches('\0')
}
