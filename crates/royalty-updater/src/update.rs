//! Per-token update planning and instruction building

use mpl_token_metadata::{
    accounts::Metadata,
    instructions::UpdateMetadataAccountV2Builder,
    types::{Creator, DataV2},
};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::fetcher::trim_padding;
use crate::filter::EligibleToken;
use crate::input::{CreatorSpec, UpdateRequest, MAX_CREATOR_SHARE};

/// What happens to a token's creator list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorChange {
    /// No new creator requested, the list is left as is
    Unchanged,
    /// The 100% creator was split with the new creator
    Split(Vec<Creator>),
    /// The record had no creators and the new creator takes the full share
    Assigned(Vec<Creator>),
    /// A new creator was requested but could not be applied
    Skipped(CreatorSkip),
}

/// Why a requested creator change was not applied to a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorSkip {
    NoFullShareCreator,
    PartialShareWithoutCreators,
    AlreadyCreator,
}

impl std::fmt::Display for CreatorSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreatorSkip::NoFullShareCreator => write!(f, "no creator holds a 100% share"),
            CreatorSkip::PartialShareWithoutCreators => {
                write!(f, "record has no creators and the new share is below 100")
            }
            CreatorSkip::AlreadyCreator => write!(f, "new creator already holds the full share"),
        }
    }
}

/// The new royalty and creator list for one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub royalty: u16,
    pub creators: CreatorChange,
}

impl PlannedUpdate {
    /// Creator list to write, `existing` when nothing changes
    pub fn creators_to_write(&self, existing: Option<&Vec<Creator>>) -> Option<Vec<Creator>> {
        match &self.creators {
            CreatorChange::Split(creators) | CreatorChange::Assigned(creators) => {
                Some(creators.clone())
            }
            CreatorChange::Unchanged | CreatorChange::Skipped(_) => existing.cloned(),
        }
    }
}

/// Apply the single-full-share replacement rule
pub fn plan_creators(existing: Option<&[Creator]>, new_creator: &CreatorSpec) -> CreatorChange {
    let incoming = Creator {
        address: new_creator.address,
        verified: false,
        share: new_creator.share,
    };

    let existing = match existing {
        Some(creators) if !creators.is_empty() => creators,
        _ if new_creator.share == MAX_CREATOR_SHARE => {
            return CreatorChange::Assigned(vec![incoming]);
        }
        _ => return CreatorChange::Skipped(CreatorSkip::PartialShareWithoutCreators),
    };

    let Some(full_share) = existing.iter().find(|c| c.share == MAX_CREATOR_SHARE) else {
        return CreatorChange::Skipped(CreatorSkip::NoFullShareCreator);
    };

    if full_share.address == new_creator.address {
        return CreatorChange::Skipped(CreatorSkip::AlreadyCreator);
    }

    CreatorChange::Split(vec![
        Creator {
            share: full_share.share - new_creator.share,
            ..full_share.clone()
        },
        incoming,
    ])
}

/// Plan the update of one token's metadata
pub fn plan_update(metadata: &Metadata, request: &UpdateRequest) -> PlannedUpdate {
    let royalty = request.royalty.unwrap_or(metadata.seller_fee_basis_points);

    let creators = match &request.new_creator {
        Some(spec) => plan_creators(metadata.creators.as_deref(), spec),
        None => CreatorChange::Unchanged,
    };

    PlannedUpdate { royalty, creators }
}

/// Build the `UpdateMetadataAccountV2` instruction for one token.
///
/// Name, symbol, URI, collection and uses are written back unchanged;
/// update authority, primary sale and mutability are left untouched.
pub fn build_update_instruction(
    token: &EligibleToken,
    update_authority: &Pubkey,
    plan: &PlannedUpdate,
) -> Instruction {
    let metadata = &token.metadata;

    let data = DataV2 {
        name: trim_padding(&metadata.name).to_string(),
        symbol: trim_padding(&metadata.symbol).to_string(),
        uri: trim_padding(&metadata.uri).to_string(),
        seller_fee_basis_points: plan.royalty,
        creators: plan.creators_to_write(metadata.creators.as_ref()),
        collection: metadata.collection.clone(),
        uses: metadata.uses.clone(),
    };

    UpdateMetadataAccountV2Builder::new()
        .metadata(token.address)
        .update_authority(*update_authority)
        .data(data)
        .instruction()
}

/// Sum of creator shares, used to sanity-check records after an update
pub fn creator_share_total(creators: Option<&Vec<Creator>>) -> u32 {
    creators
        .map(|list| list.iter().map(|c| c.share as u32).sum())
        .unwrap_or(0)
}
