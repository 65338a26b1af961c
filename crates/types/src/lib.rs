//! Core data structures for the Tessera node core.
//!
//! Everything that is hashed, signed, or persisted by the consensus-critical
//! paths lives here: blocks and their headers, commits, votes, misbehavior
//! evidence, validator sets, consensus parameters, and the error taxonomy
//! shared by the other crates. All consensus-critical encoding goes through
//! the canonical codec in [`codec`].

pub mod block;
pub mod codec;
pub mod error;
pub mod evidence;
pub mod hash;
pub mod params;
pub mod tx;
pub mod validator;
pub mod vote;

pub use block::{Block, BlockHeader, BlockId};
pub use error::{
    AppError, BlockError, ErrorCode, EvidenceError, FatalError, MempoolError, StoreError,
};
pub use evidence::{DuplicateVoteEvidence, Evidence};
pub use hash::Hash;
pub use params::ConsensusParams;
pub use tx::{AppAck, Tx, TxHash, TxResult, CODE_OK};
pub use validator::{Address, Validator, ValidatorSet};
pub use vote::{Commit, CommitSig, Vote};
