//! Connection to the cluster and the signing identity

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::config::UpdaterConfig;
use crate::error::{UpdaterError, UpdaterResult};

/// The ledger operations the update workflow relies on
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Update authority that signs and pays for every transaction
    fn authority(&self) -> Pubkey;

    /// Endpoint identifier, used for reporting
    fn endpoint(&self) -> String;

    /// Fetch raw accounts in one round trip, `None` where no account exists
    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> UpdaterResult<Vec<Option<Account>>>;

    /// Sign, submit and confirm one transaction made of `instructions`
    async fn submit(&self, instructions: &[Instruction]) -> UpdaterResult<Signature>;
}

/// Ledger backed by a Solana JSON-RPC node
pub struct RpcLedger {
    rpc: Arc<RpcClient>,
    payer: Arc<Keypair>,
    read_commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(rpc: Arc<RpcClient>, payer: Arc<Keypair>) -> Self {
        Self {
            rpc,
            payer,
            read_commitment: CommitmentConfig::processed(),
        }
    }

    /// Connect using the endpoint, timeouts and wallet from `config`
    pub fn connect(config: &UpdaterConfig) -> UpdaterResult<Self> {
        let payer = load_keypair(&config.wallet_path)?;
        let rpc = RpcClient::new_with_timeouts_and_commitment(
            config.endpoint.clone(),
            config.request_timeout(),
            CommitmentConfig::confirmed(),
            config.confirm_timeout(),
        );

        Ok(Self::new(Arc::new(rpc), Arc::new(payer)))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    fn authority(&self) -> Pubkey {
        self.payer.pubkey()
    }

    fn endpoint(&self) -> String {
        self.rpc.url()
    }

    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> UpdaterResult<Vec<Option<Account>>> {
        let response = self
            .rpc
            .get_multiple_accounts_with_commitment(addresses, self.read_commitment)
            .await?;
        Ok(response.value)
    }

    async fn submit(&self, instructions: &[Instruction]) -> UpdaterResult<Signature> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            &[&*self.payer],
            recent_blockhash,
        );

        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        Ok(signature)
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> UpdaterResult<String> {
    if let Some(rest) = path.strip_prefix('~') {
        let home = std::env::var("HOME")
            .map_err(|_| UpdaterError::Keypair("HOME environment variable not set".into()))?;
        Ok(format!("{}{}", home, rest))
    } else {
        Ok(path.to_string())
    }
}

/// Load a keypair from a file path, expanding ~ if needed
pub fn load_keypair(path: &str) -> UpdaterResult<Keypair> {
    let expanded_path = expand_home(path)?;

    read_keypair_file(&expanded_path).map_err(|e| {
        UpdaterError::Keypair(format!("Failed to load keypair from {}: {}", expanded_path, e))
    })
}
