//! Evidence verification against chain state and validator history.

use tessera_api::validators::ValidatorSetView;
use tessera_types::error::EvidenceError;
use tessera_types::evidence::Evidence;

use crate::chain_state::ChainState;

/// Fully verifies one piece of evidence: sufficiently recent, internally
/// consistent, and naming a validator that actually held the claimed seat.
///
/// A pruned validator set surfaces as [`EvidenceError::UnretainedHeight`],
/// never as a validity failure; corrupt history is fatal and propagates via
/// [`EvidenceError::Store`].
pub fn verify_evidence(
    evidence: &Evidence,
    state: &ChainState,
    validator_sets: &dyn ValidatorSetView,
) -> Result<(), EvidenceError> {
    let height = evidence.height();
    let max_age = state.consensus_params.max_evidence_age;
    if state.last_height.saturating_sub(height) > max_age {
        return Err(EvidenceError::TooOld {
            height,
            min_height: state.last_height.saturating_sub(max_age),
        });
    }

    evidence.verify(&state.chain_id)?;

    let set = validator_sets
        .validators_at(height)?
        .ok_or(EvidenceError::UnretainedHeight(height))?;

    let address = evidence.address();
    match set.get_by_address(&address) {
        None => Err(EvidenceError::ValidatorMismatch {
            address: hex::encode(address),
            height,
            claimed_index: evidence.index(),
            detail: "not a validator at that height".into(),
        }),
        Some((actual_index, _)) if actual_index as u32 != evidence.index() => {
            Err(EvidenceError::ValidatorMismatch {
                address: hex::encode(address),
                height,
                claimed_index: evidence.index(),
                detail: format!("held index {actual_index}"),
            })
        }
        Some(_) => Ok(()),
    }
}
