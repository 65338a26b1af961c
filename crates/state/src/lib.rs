//! The safety core: chain state, block validation, evidence verification,
//! and the rollback protocol.
//!
//! The consensus engine calls [`BlockValidator::validate_block`] once per
//! candidate block and guarantees only one block is in flight at a time.
//! Validation is a pure read of [`ChainState`] with a single exception: an
//! app-hash mismatch triggers the [`RollbackCoordinator`] before the
//! mismatch is reported, so the application and the consensus layer agree
//! they are one block behind.

pub mod chain_state;
pub mod evidence;
pub mod rollback;
pub mod validation;

pub use chain_state::{ChainState, StateStore};
pub use evidence::verify_evidence;
pub use rollback::RollbackCoordinator;
pub use validation::BlockValidator;
