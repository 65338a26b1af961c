//! Read-only historical validator-set lookup.

use tessera_types::error::FatalError;
use tessera_types::validator::ValidatorSet;

/// Lookup of the validator set effective at a given height.
///
/// `Ok(None)` means the height has been pruned by retention policy — an
/// operational condition the caller must treat as distinct from both
/// "invalid" and "corrupt". A decode failure on a retained record is
/// corruption and therefore fatal.
pub trait ValidatorSetView: Send + Sync {
    fn validators_at(&self, height: u64) -> Result<Option<ValidatorSet>, FatalError>;
}
