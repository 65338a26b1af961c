//! Error taxonomy for the Tessera node core.
//!
//! Four families, matching how the caller is expected to react:
//!
//! - structural/input errors ([`BlockError`], most of [`EvidenceError`]):
//!   the candidate block or evidence is rejected, consensus may try another;
//! - the app-hash mismatch, which additionally triggers a rollback before it
//!   is reported;
//! - fatal errors ([`FatalError`]): the process must halt rather than keep
//!   running with inconsistent state;
//! - operational conditions (`NotReady`, `Syncing`, `CommitTimeout`,
//!   unretained validator history): expected outcomes surfaced to the caller
//!   without retry.

use thiserror::Error;

use crate::tx::{TxHash, TxResult};

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors from validating a candidate block against the local chain state.
#[derive(Debug, Error)]
pub enum BlockError {
    /// The block failed internal cross-field consistency checks.
    #[error("malformed block: {0}")]
    Malformed(String),
    /// The block belongs to a different chain.
    #[error("wrong chain id. Expected {expected}, got {got}")]
    ChainIdMismatch { expected: String, got: String },
    /// The block does not extend the last committed height.
    #[error("wrong block height. Expected {expected}, got {got}")]
    HeightMismatch { expected: u64, got: u64 },
    /// The block does not reference the last committed block.
    #[error("wrong previous block id. Expected {expected}, got {got}")]
    PrevBlockMismatch { expected: String, got: String },
    /// The cumulative transaction count does not add up.
    #[error("wrong total tx count. Expected {expected}, got {got}")]
    TxCountMismatch { expected: u64, got: u64 },
    /// The block disagrees with the application about prior execution.
    ///
    /// The validator rolls the node back one height before returning this.
    #[error("wrong app hash. Expected {expected}, got {got}")]
    AppHashMismatch { expected: String, got: String },
    /// The block was built against different consensus parameters.
    #[error("wrong consensus params hash. Expected {expected}, got {got}")]
    ConsensusParamsMismatch { expected: String, got: String },
    /// The block disagrees about the results of the previous block.
    #[error("wrong last results hash. Expected {expected}, got {got}")]
    ResultsHashMismatch { expected: String, got: String },
    /// The block was built against a different validator set.
    #[error("wrong validators hash. Expected {expected}, got {got}")]
    ValidatorsHashMismatch { expected: String, got: String },
    /// The previous commit does not carry one entry per validator.
    #[error("invalid commit size. Expected {expected}, got {got}")]
    CommitSizeMismatch { expected: usize, got: usize },
    /// The previous commit failed threshold signature verification.
    #[error("commit verification failed: {0}")]
    CommitSignature(String),
    /// A piece of evidence carried by the block is invalid.
    #[error("invalid evidence from height {height}: {source}")]
    EvidenceInvalid {
        height: u64,
        #[source]
        source: EvidenceError,
    },
    /// The validator set needed to check a piece of evidence has been pruned.
    ///
    /// Distinct from invalid evidence: pruned history is an operational
    /// condition, not proof of misbehavior.
    #[error("validator set for height {0} is no longer retained")]
    UnretainedValidators(u64),
    /// A non-recoverable failure; the process must halt.
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl ErrorCode for BlockError {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "BLOCK_MALFORMED",
            Self::ChainIdMismatch { .. } => "BLOCK_CHAIN_ID_MISMATCH",
            Self::HeightMismatch { .. } => "BLOCK_HEIGHT_MISMATCH",
            Self::PrevBlockMismatch { .. } => "BLOCK_PREV_BLOCK_MISMATCH",
            Self::TxCountMismatch { .. } => "BLOCK_TX_COUNT_MISMATCH",
            Self::AppHashMismatch { .. } => "BLOCK_APP_HASH_MISMATCH",
            Self::ConsensusParamsMismatch { .. } => "BLOCK_CONSENSUS_PARAMS_MISMATCH",
            Self::ResultsHashMismatch { .. } => "BLOCK_RESULTS_HASH_MISMATCH",
            Self::ValidatorsHashMismatch { .. } => "BLOCK_VALIDATORS_HASH_MISMATCH",
            Self::CommitSizeMismatch { .. } => "BLOCK_COMMIT_SIZE_MISMATCH",
            Self::CommitSignature(_) => "BLOCK_COMMIT_SIGNATURE",
            Self::EvidenceInvalid { .. } => "BLOCK_EVIDENCE_INVALID",
            Self::UnretainedValidators(_) => "BLOCK_VALIDATORS_UNRETAINED",
            Self::Fatal(e) => e.code(),
        }
    }
}

/// Errors from verifying a single piece of misbehavior evidence.
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// The evidence is older than the configured maximum age.
    #[error("evidence from height {height} is too old. Minimum height is {min_height}")]
    TooOld { height: u64, min_height: u64 },
    /// The evidence payload failed cryptographic self-verification.
    #[error("evidence signature verification failed: {0}")]
    InvalidSignature(String),
    /// The accused address did not hold the claimed seat at the claimed
    /// height.
    #[error("address {address} was not validator {claimed_index} at height {height}: {detail}")]
    ValidatorMismatch {
        address: String,
        height: u64,
        claimed_index: u32,
        detail: String,
    },
    /// The validator set for the evidence height has been pruned.
    #[error("validator set for height {0} is no longer retained")]
    UnretainedHeight(u64),
    /// The validator-set lookup hit corrupt storage.
    #[error(transparent)]
    Store(#[from] FatalError),
}

impl ErrorCode for EvidenceError {
    fn code(&self) -> &'static str {
        match self {
            Self::TooOld { .. } => "EVIDENCE_TOO_OLD",
            Self::InvalidSignature(_) => "EVIDENCE_INVALID_SIGNATURE",
            Self::ValidatorMismatch { .. } => "EVIDENCE_VALIDATOR_MISMATCH",
            Self::UnretainedHeight(_) => "EVIDENCE_HEIGHT_UNRETAINED",
            Self::Store(e) => e.code(),
        }
    }
}

/// Non-recoverable failures.
///
/// Any of these means the node can no longer trust its own bookkeeping; the
/// consensus engine is expected to halt the process instead of continuing.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The application refused or failed to roll back one height.
    #[error("application rollback failed with code {code}: {log}")]
    AppRollback { code: u32, log: String },
    /// The application connection itself failed mid-rollback.
    #[error("application connection failed: {0}")]
    App(String),
    /// The storage backend failed.
    #[error("store failure: {0}")]
    Store(String),
    /// Persisted state exists but cannot be decoded.
    #[error("corrupt persisted state: {0}")]
    Corrupt(String),
    /// No chain-state snapshot exists to roll back to.
    #[error("no chain state snapshot to roll back to")]
    MissingSnapshot,
    /// A second app-hash mismatch was detected before the node recovered
    /// from the previous one.
    #[error("repeated app hash mismatch at height {height}; refusing to roll back again")]
    RepeatedAppHashMismatch { height: u64 },
}

impl ErrorCode for FatalError {
    fn code(&self) -> &'static str {
        match self {
            Self::AppRollback { .. } => "FATAL_APP_ROLLBACK",
            Self::App(_) => "FATAL_APP_CONNECTION",
            Self::Store(_) => "FATAL_STORE",
            Self::Corrupt(_) => "FATAL_CORRUPT_STATE",
            Self::MissingSnapshot => "FATAL_MISSING_SNAPSHOT",
            Self::RepeatedAppHashMismatch { .. } => "FATAL_REPEATED_APP_HASH_MISMATCH",
        }
    }
}

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend itself failed.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A stored value could not be decoded.
    #[error("storage decode error: {0}")]
    Decode(String),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORE_BACKEND_ERROR",
            Self::Decode(_) => "STORE_DECODE_ERROR",
        }
    }
}

impl From<StoreError> for FatalError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Backend(s) => FatalError::Store(s),
            StoreError::Decode(s) => FatalError::Corrupt(s),
        }
    }
}

/// Errors from the application connection.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request never produced a response.
    #[error("application connection error: {0}")]
    Connection(String),
}

impl ErrorCode for AppError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "APP_CONNECTION_ERROR",
        }
    }
}

/// Errors from the transaction submission pipeline.
#[derive(Debug, Error)]
pub enum MempoolError {
    /// The node has not finished starting up.
    #[error("node is not ready to accept transactions")]
    NotReady,
    /// The node is catching up on historical blocks.
    #[error("fast sync in progress, no tx accepted")]
    Syncing,
    /// The transaction is already being tracked.
    #[error("transaction {0} is already pending")]
    Duplicate(TxHash),
    /// The admission check could not be dispatched or never resolved.
    #[error("admission check failed: {0}")]
    Admission(String),
    /// The commit event stream closed before a result was observed.
    #[error("commit event stream closed before transaction {0} was observed")]
    SubscriptionClosed(TxHash),
    /// The transaction was admitted but not committed within the timeout.
    ///
    /// Carries the (successful) admission result so the caller still learns
    /// the outcome of the check.
    #[error("timed out waiting for transaction {hash} to be included in a block")]
    CommitTimeout { hash: TxHash, check: TxResult },
}

impl ErrorCode for MempoolError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotReady => "MEMPOOL_NOT_READY",
            Self::Syncing => "MEMPOOL_SYNCING",
            Self::Duplicate(_) => "MEMPOOL_DUPLICATE_TX",
            Self::Admission(_) => "MEMPOOL_ADMISSION_FAILED",
            Self::SubscriptionClosed(_) => "MEMPOOL_SUBSCRIPTION_CLOSED",
            Self::CommitTimeout { .. } => "MEMPOOL_COMMIT_TIMEOUT",
        }
    }
}
