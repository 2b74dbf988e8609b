use solana_sdk::pubkey::Pubkey;

/// Seed prefix of Metaplex metadata accounts
pub const METADATA_SEED: &[u8] = b"metadata";

/// Derive metadata PDA for a mint
pub fn derive_metadata(mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            mpl_token_metadata::ID.as_ref(),
            mint.as_ref(),
        ],
        &mpl_token_metadata::ID,
    )
}

/// Metadata account address for a mint
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    derive_metadata(mint).0
}
