pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod input;
pub mod ledger;
pub mod pda;
pub mod report;
pub mod update;
pub mod updater;
pub mod verify;

pub use batch::{batch_count, transaction_size, BatchExecutor, BatchOutcome, ExecutionSummary};
pub use config::{RetryConfig, UpdaterConfig};
pub use error::{UpdaterError, UpdaterResult};
pub use fetcher::{fetch_metadata, FetchedMetadata, MetadataLookup};
pub use filter::{partition, EligibleToken, Partition};
pub use input::{load_mints, parse_royalty, CreatorSpec, RoyaltyOverride, UpdateRequest};
pub use ledger::{Ledger, RpcLedger};
pub use pda::metadata_address;
pub use report::RunReport;
pub use update::{CreatorChange, CreatorSkip, PlannedUpdate};
pub use updater::RoyaltyUpdater;
pub use verify::{verify_royalties, VerificationReport};
