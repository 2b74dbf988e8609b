//! Shared helpers: an in-memory ledger and Metaplex account encoding

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use royalty_updater::{metadata_address, Ledger, UpdaterConfig, UpdaterError, UpdaterResult};
use solana_sdk::{
    account::Account, instruction::Instruction, pubkey::Pubkey, signature::Signature,
};

/// `Key::MetadataV1`
const METADATA_V1_KEY: u8 = 4;
/// `UpdateMetadataAccountV2` instruction discriminator
const UPDATE_METADATA_V2: u8 = 15;

const MAX_NAME_LENGTH: usize = 32;
const MAX_SYMBOL_LENGTH: usize = 10;
const MAX_URI_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCreator {
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

/// Metadata record as the ledger stores it
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub royalty: u16,
    pub creators: Option<Vec<TestCreator>>,
    pub is_mutable: bool,
}

impl TestRecord {
    pub fn new(mint: Pubkey, update_authority: Pubkey, index: usize, royalty: u16) -> Self {
        Self {
            update_authority,
            mint,
            name: format!("Token #{}", index),
            symbol: "TOK".to_string(),
            uri: format!("https://example.com/{}.json", index),
            royalty,
            creators: Some(vec![TestCreator {
                address: update_authority,
                verified: true,
                share: 100,
            }]),
            is_mutable: true,
        }
    }

    /// Borsh layout of a `Metadata` account, strings NUL-padded like on chain
    pub fn encode(&self) -> Vec<u8> {
        let mut data = vec![METADATA_V1_KEY];
        data.extend_from_slice(self.update_authority.as_ref());
        data.extend_from_slice(self.mint.as_ref());
        write_string(&mut data, &pad(&self.name, MAX_NAME_LENGTH));
        write_string(&mut data, &pad(&self.symbol, MAX_SYMBOL_LENGTH));
        write_string(&mut data, &pad(&self.uri, MAX_URI_LENGTH));
        data.extend_from_slice(&self.royalty.to_le_bytes());
        match &self.creators {
            Some(creators) => {
                data.push(1);
                data.extend_from_slice(&(creators.len() as u32).to_le_bytes());
                for creator in creators {
                    data.extend_from_slice(creator.address.as_ref());
                    data.push(creator.verified as u8);
                    data.push(creator.share);
                }
            }
            None => data.push(0),
        }
        data.push(0); // primary_sale_happened
        data.push(self.is_mutable as u8);
        // edition_nonce, token_standard, collection, uses, collection_details, programmable_config
        data.extend_from_slice(&[0; 6]);
        data
    }

    pub fn account(&self) -> Account {
        Account {
            lamports: 5_616_720,
            data: self.encode(),
            owner: mpl_token_metadata::ID,
            executable: false,
            rent_epoch: 0,
        }
    }
}

fn pad(value: &str, len: usize) -> String {
    let mut padded = value.to_string();
    while padded.len() < len {
        padded.push('\0');
    }
    padded
}

fn write_string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

/// Fields of an `UpdateMetadataAccountV2` instruction the tests inspect
#[derive(Debug, Clone)]
pub struct DecodedUpdate {
    pub metadata: Pubkey,
    pub name: String,
    pub royalty: u16,
    pub creators: Option<Vec<TestCreator>>,
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> &'a [u8] {
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        head
    }

    fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn string(&mut self) -> String {
        let len = self.u32() as usize;
        String::from_utf8(self.take(len).to_vec()).unwrap()
    }

    fn pubkey(&mut self) -> Pubkey {
        Pubkey::try_from(self.take(32)).unwrap()
    }
}

pub fn decode_update(ix: &Instruction) -> DecodedUpdate {
    assert_eq!(ix.program_id, mpl_token_metadata::ID);
    let mut reader = Reader { data: &ix.data };
    assert_eq!(reader.u8(), UPDATE_METADATA_V2);
    assert_eq!(reader.u8(), 1, "update must carry data");

    let name = reader.string();
    let _symbol = reader.string();
    let _uri = reader.string();
    let royalty = reader.u16();
    let creators = match reader.u8() {
        0 => None,
        _ => {
            let len = reader.u32();
            Some(
                (0..len)
                    .map(|_| TestCreator {
                        address: reader.pubkey(),
                        verified: reader.u8() != 0,
                        share: reader.u8(),
                    })
                    .collect(),
            )
        }
    };

    DecodedUpdate {
        metadata: ix.accounts[0].pubkey,
        name,
        royalty,
        creators,
    }
}

/// In-memory ledger holding metadata records keyed by metadata address
pub struct MemoryLedger {
    authority: Pubkey,
    records: Mutex<HashMap<Pubkey, TestRecord>>,
    raw_accounts: Mutex<HashMap<Pubkey, Account>>,
    failures_remaining: AtomicU32,
    ignore_royalty: bool,
    drop_records: bool,
    pub attempts: AtomicU32,
    pub confirmed: Mutex<Vec<Vec<DecodedUpdate>>>,
    pub fetch_sizes: Mutex<Vec<usize>>,
}

impl MemoryLedger {
    pub fn new(authority: Pubkey) -> Self {
        Self {
            authority,
            records: Mutex::new(HashMap::new()),
            raw_accounts: Mutex::new(HashMap::new()),
            failures_remaining: AtomicU32::new(0),
            ignore_royalty: false,
            drop_records: false,
            attempts: AtomicU32::new(0),
            confirmed: Mutex::new(Vec::new()),
            fetch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Reject the next `count` submissions
    pub fn failing(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Confirm transactions without applying royalty changes
    pub fn ignoring_royalty(mut self) -> Self {
        self.ignore_royalty = true;
        self
    }

    /// Confirm transactions, then close the updated metadata accounts
    pub fn dropping_records(mut self) -> Self {
        self.drop_records = true;
        self
    }

    pub fn authority_key(&self) -> Pubkey {
        self.authority
    }

    pub fn insert(&self, record: TestRecord) {
        let address = metadata_address(&record.mint);
        self.records.lock().unwrap().insert(address, record);
    }

    pub fn insert_raw(&self, mint: &Pubkey, account: Account) {
        self.raw_accounts
            .lock()
            .unwrap()
            .insert(metadata_address(mint), account);
    }

    pub fn record(&self, mint: &Pubkey) -> TestRecord {
        self.records.lock().unwrap()[&metadata_address(mint)].clone()
    }

    pub fn confirmed_batch_sizes(&self) -> Vec<usize> {
        self.confirmed.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn submitted_metadata(&self) -> Vec<Pubkey> {
        self.confirmed
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|u| u.metadata)
            .collect()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn authority(&self) -> Pubkey {
        self.authority
    }

    fn endpoint(&self) -> String {
        "memory://ledger".to_string()
    }

    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> UpdaterResult<Vec<Option<Account>>> {
        self.fetch_sizes.lock().unwrap().push(addresses.len());
        let records = self.records.lock().unwrap();
        let raw = self.raw_accounts.lock().unwrap();

        Ok(addresses
            .iter()
            .map(|address| {
                records
                    .get(address)
                    .map(TestRecord::account)
                    .or_else(|| raw.get(address).cloned())
            })
            .collect())
    }

    async fn submit(&self, instructions: &[Instruction]) -> UpdaterResult<Signature> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(UpdaterError::Rpc("Blockhash not found".to_string()));
        }

        let updates: Vec<DecodedUpdate> = instructions.iter().map(decode_update).collect();
        let mut records = self.records.lock().unwrap();
        for update in &updates {
            let record = records
                .get_mut(&update.metadata)
                .ok_or_else(|| UpdaterError::Rpc("account not found".to_string()))?;
            if !record.is_mutable {
                return Err(UpdaterError::Rpc("Data is immutable".to_string()));
            }
            if !self.ignore_royalty {
                record.royalty = update.royalty;
            }
            record.creators = update.creators.clone();
        }
        if self.drop_records {
            for update in &updates {
                records.remove(&update.metadata);
            }
        }

        self.confirmed.lock().unwrap().push(updates);
        Ok(Signature::new_unique())
    }
}

/// Configuration with delays shortened for tests
pub fn test_config() -> UpdaterConfig {
    let mut config = UpdaterConfig::default();
    config.endpoint = "memory://ledger".to_string();
    config.inter_batch_delay_ms = 0;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 1;
    config
}

/// Ledger seeded with `count` mutable tokens at `royalty`
pub fn seeded_ledger(count: usize, royalty: u16) -> (MemoryLedger, Vec<Pubkey>) {
    let authority = Pubkey::new_unique();
    let ledger = MemoryLedger::new(authority);
    let mints: Vec<Pubkey> = (0..count).map(|_| Pubkey::new_unique()).collect();
    for (index, mint) in mints.iter().enumerate() {
        ledger.insert(TestRecord::new(*mint, authority, index, royalty));
    }
    (ledger, mints)
}

/// Like `seeded_ledger`, but without creators so ten updates fit one transaction
pub fn compact_ledger(count: usize, royalty: u16) -> (MemoryLedger, Vec<Pubkey>) {
    let authority = Pubkey::new_unique();
    let ledger = MemoryLedger::new(authority);
    let mints: Vec<Pubkey> = (0..count).map(|_| Pubkey::new_unique()).collect();
    for (index, mint) in mints.iter().enumerate() {
        let mut record = TestRecord::new(*mint, authority, index, royalty);
        record.creators = None;
        ledger.insert(record);
    }
    (ledger, mints)
}
