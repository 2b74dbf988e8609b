//! Input loading: mint list file, royalty override and creator spec

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::error::{UpdaterError, UpdaterResult};

/// Royalty ceiling in basis points (100%)
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Creator share ceiling in percent
pub const MAX_CREATOR_SHARE: u8 = 100;

/// New creator requested on the command line as `"<address>;<share>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatorSpec {
    pub address: Pubkey,
    pub share: u8,
}

/// Positional royalty argument; empty or `-` keeps each token's own royalty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoyaltyOverride(pub Option<u16>);

/// What the operator asked to change on every eligible token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub royalty: Option<u16>,
    pub new_creator: Option<CreatorSpec>,
}

impl FromStr for CreatorSpec {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, share) = s.split_once(';').ok_or_else(|| {
            UpdaterError::InvalidInput(format!(
                "creator must be formatted as \"<address>;<share>\", got {:?}",
                s
            ))
        })?;

        let address = parse_pubkey(address.trim())?;
        let share: u8 = share
            .trim()
            .parse()
            .map_err(|e| UpdaterError::InvalidInput(format!("invalid creator share {:?}: {}", share, e)))?;

        if share > MAX_CREATOR_SHARE {
            return Err(UpdaterError::InvalidInput(format!(
                "creator share {} exceeds {}",
                share, MAX_CREATOR_SHARE
            )));
        }

        Ok(Self { address, share })
    }
}

impl fmt::Display for CreatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.address, self.share)
    }
}

/// Parse a royalty override in basis points
pub fn parse_royalty(s: &str) -> UpdaterResult<u16> {
    let royalty: u16 = s
        .trim()
        .parse()
        .map_err(|e| UpdaterError::InvalidInput(format!("invalid royalty {:?}: {}", s, e)))?;

    if royalty > MAX_BASIS_POINTS {
        return Err(UpdaterError::InvalidInput(format!(
            "royalty {} exceeds {} basis points",
            royalty, MAX_BASIS_POINTS
        )));
    }

    Ok(royalty)
}

impl FromStr for RoyaltyOverride {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "-" => Ok(Self(None)),
            value => parse_royalty(value).map(|royalty| Self(Some(royalty))),
        }
    }
}

/// Parse a pubkey from string
pub fn parse_pubkey(s: &str) -> UpdaterResult<Pubkey> {
    Pubkey::from_str(s).map_err(|e| UpdaterError::InvalidInput(format!("invalid address {:?}: {}", s, e)))
}

/// Read a JSON array of mint addresses
pub fn load_mints(path: impl AsRef<Path>) -> UpdaterResult<Vec<Pubkey>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        UpdaterError::InvalidInput(format!("Failed to read mint list {}: {}", path.display(), e))
    })?;

    let raw: Vec<String> = serde_json::from_str(&content)?;
    raw.iter().map(|mint| parse_pubkey(mint)).collect()
}
