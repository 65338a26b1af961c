//! Candidate-block validation against the locally persisted chain state.

use std::sync::Arc;

use tessera_api::validators::ValidatorSetView;
use tessera_types::block::Block;
use tessera_types::error::{BlockError, EvidenceError};
use tessera_types::hash::hex_str;
use tracing::{debug, warn};

use crate::chain_state::ChainState;
use crate::evidence::verify_evidence;
use crate::rollback::RollbackCoordinator;

/// Validates candidate blocks for the consensus engine.
///
/// The engine guarantees only one block is validated or committed at a
/// time; under that discipline every check here is a pure read of `state`,
/// except the app-hash branch, which runs the rollback before reporting the
/// mismatch.
pub struct BlockValidator {
    validator_sets: Arc<dyn ValidatorSetView>,
    rollback: Arc<RollbackCoordinator>,
}

impl BlockValidator {
    pub fn new(validator_sets: Arc<dyn ValidatorSetView>, rollback: Arc<RollbackCoordinator>) -> Self {
        Self {
            validator_sets,
            rollback,
        }
    }

    /// Checks a candidate block, short-circuiting on the first failure.
    pub async fn validate_block(
        &self,
        block: &Block,
        state: &ChainState,
    ) -> Result<(), BlockError> {
        block.validate_basic()?;

        let header = &block.header;
        if header.chain_id != state.chain_id {
            return Err(BlockError::ChainIdMismatch {
                expected: state.chain_id.clone(),
                got: header.chain_id.clone(),
            });
        }
        if header.height != state.last_height + 1 {
            return Err(BlockError::HeightMismatch {
                expected: state.last_height + 1,
                got: header.height,
            });
        }
        if header.prev_block_id != state.last_block_id {
            return Err(BlockError::PrevBlockMismatch {
                expected: state.last_block_id.to_string(),
                got: header.prev_block_id.to_string(),
            });
        }
        let expected_total = state.last_total_txs + block.txs.len() as u64;
        if header.total_txs != expected_total {
            return Err(BlockError::TxCountMismatch {
                expected: expected_total,
                got: header.total_txs,
            });
        }

        if header.app_hash != state.last_app_hash {
            // The application and the consensus layer disagree about prior
            // execution; re-wind one height before reporting the mismatch.
            warn!(
                target: "state",
                height = header.height,
                expected = %hex_str(&state.last_app_hash),
                got = %hex_str(&header.app_hash),
                "app hash mismatch, rolling back"
            );
            self.rollback.rollback(state.last_height).await?;
            return Err(BlockError::AppHashMismatch {
                expected: hex_str(&state.last_app_hash),
                got: hex_str(&header.app_hash),
            });
        }

        let params_hash = state.consensus_params.hash();
        if header.consensus_params_hash != params_hash {
            return Err(BlockError::ConsensusParamsMismatch {
                expected: hex_str(&params_hash),
                got: hex_str(&header.consensus_params_hash),
            });
        }
        if header.last_results_hash != state.last_results_hash {
            return Err(BlockError::ResultsHashMismatch {
                expected: hex_str(&state.last_results_hash),
                got: hex_str(&header.last_results_hash),
            });
        }
        let validators_hash = state.validators.hash();
        if header.validators_hash != validators_hash {
            return Err(BlockError::ValidatorsHashMismatch {
                expected: hex_str(&validators_hash),
                got: hex_str(&header.validators_hash),
            });
        }

        if header.height == 1 {
            // The first block has nothing to commit over.
            if !block.last_commit.signatures.is_empty() {
                return Err(BlockError::CommitSizeMismatch {
                    expected: 0,
                    got: block.last_commit.signatures.len(),
                });
            }
        } else {
            state.last_validators.verify_commit(
                &state.chain_id,
                &state.last_block_id,
                header.height - 1,
                &block.last_commit,
            )?;
        }

        for evidence in &block.evidence {
            if let Err(e) = verify_evidence(evidence, state, self.validator_sets.as_ref()) {
                return Err(match e {
                    EvidenceError::UnretainedHeight(h) => BlockError::UnretainedValidators(h),
                    EvidenceError::Store(fatal) => BlockError::Fatal(fatal),
                    other => BlockError::EvidenceInvalid {
                        height: evidence.height(),
                        source: other,
                    },
                });
            }
        }

        debug!(target: "state", height = header.height, "block validated");
        self.rollback.note_validation_success().await;
        Ok(())
    }
}
