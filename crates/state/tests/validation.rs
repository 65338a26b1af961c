//! End-to-end validation and rollback behavior over an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use tessera_api::app::AppConnection;
use tessera_api::store::KvStore;
use tessera_api::validators::ValidatorSetView;
use tessera_state::{verify_evidence, BlockValidator, ChainState, RollbackCoordinator, StateStore};
use tessera_storage::keys::CHAIN_STATE_SNAPSHOT_KEY;
use tessera_storage::{BlockStoreState, MemStore, StoredValidatorSets};
use tessera_types::block::{txs_hash, Block, BlockHeader, BlockId};
use tessera_types::error::{AppError, BlockError, EvidenceError, FatalError};
use tessera_types::evidence::{DuplicateVoteEvidence, Evidence};
use tessera_types::tx::{AppAck, TxResult};
use tessera_types::validator::{address_from_pub_key, Validator, ValidatorSet};
use tessera_types::vote::{self, Commit, CommitSig, Vote};

struct ScriptedApp {
    rollback_calls: AtomicUsize,
    rollback_ack: AppAck,
}

impl ScriptedApp {
    fn accepting() -> Self {
        Self {
            rollback_calls: AtomicUsize::new(0),
            rollback_ack: AppAck {
                code: 0,
                log: String::new(),
            },
        }
    }

    fn refusing() -> Self {
        Self {
            rollback_calls: AtomicUsize::new(0),
            rollback_ack: AppAck {
                code: 1,
                log: "cannot rewind".into(),
            },
        }
    }
}

#[async_trait]
impl AppConnection for ScriptedApp {
    async fn check_admission(&self, _tx: &[u8]) -> Result<TxResult, AppError> {
        Ok(TxResult::default())
    }

    async fn rollback_one_height(&self) -> Result<AppAck, AppError> {
        self.rollback_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rollback_ack.clone())
    }

    async fn query_genesis(&self) -> Result<Vec<u8>, AppError> {
        Ok(vec![])
    }

    async fn query(&self, _path: &str) -> Result<Vec<u8>, AppError> {
        Ok(vec![])
    }
}

struct Fixture {
    app: Arc<ScriptedApp>,
    db: Arc<MemStore>,
    state_store: StateStore,
    validator_sets: Arc<StoredValidatorSets>,
    validator: BlockValidator,
    keys: Vec<SigningKey>,
    state: ChainState,
}

fn make_validators(n: usize) -> (Vec<SigningKey>, ValidatorSet) {
    let keys: Vec<SigningKey> = (0..n).map(|_| SigningKey::generate(&mut OsRng)).collect();
    let set = ValidatorSet::new(
        keys.iter()
            .map(|k| {
                let pub_key = k.verifying_key().to_bytes();
                Validator {
                    address: address_from_pub_key(&pub_key),
                    pub_key,
                    power: 10,
                }
            })
            .collect(),
    );
    (keys, set)
}

fn fixture(app: Arc<ScriptedApp>) -> Fixture {
    let (keys, set) = make_validators(4);
    let db = Arc::new(MemStore::new());
    let state_store = StateStore::new(db.clone());
    let validator_sets = Arc::new(StoredValidatorSets::new(db.clone()));
    let rollback = Arc::new(RollbackCoordinator::new(
        app.clone(),
        state_store.clone(),
        db.clone(),
    ));
    let validator = BlockValidator::new(validator_sets.clone(), rollback);

    let state = ChainState {
        chain_id: "test-chain".into(),
        last_height: 4,
        last_block_id: BlockId { hash: [9u8; 32] },
        last_total_txs: 10,
        last_app_hash: [7u8; 32],
        last_results_hash: [6u8; 32],
        consensus_params: Default::default(),
        validators: set.clone(),
        last_validators: set,
    };

    Fixture {
        app,
        db,
        state_store,
        validator_sets,
        validator,
        keys,
        state,
    }
}

fn signed_commit(fix: &Fixture, height: u64, block_id: &BlockId) -> Commit {
    let signatures = fix
        .state
        .last_validators
        .validators()
        .iter()
        .map(|v| {
            let key = fix
                .keys
                .iter()
                .find(|k| k.verifying_key().to_bytes() == v.pub_key)
                .unwrap();
            let msg = vote::sign_bytes(&fix.state.chain_id, height, 0, &block_id.hash);
            Some(CommitSig {
                validator_address: v.address,
                signature: key.sign(&msg).to_bytes().to_vec(),
            })
        })
        .collect();
    Commit {
        height,
        round: 0,
        block_id: block_id.clone(),
        signatures,
    }
}

/// A candidate that is valid against the fixture state in every respect.
fn valid_candidate(fix: &Fixture) -> Block {
    let txs = vec![b"tx-1".to_vec()];
    let header = BlockHeader {
        chain_id: fix.state.chain_id.clone(),
        height: fix.state.last_height + 1,
        prev_block_id: fix.state.last_block_id.clone(),
        total_txs: fix.state.last_total_txs + txs.len() as u64,
        data_hash: txs_hash(&txs),
        app_hash: fix.state.last_app_hash,
        consensus_params_hash: fix.state.consensus_params.hash(),
        last_results_hash: fix.state.last_results_hash,
        validators_hash: fix.state.validators.hash(),
    };
    Block {
        last_commit: signed_commit(fix, header.height - 1, &fix.state.last_block_id),
        header,
        txs,
        evidence: vec![],
    }
}

fn duplicate_vote(key: &SigningKey, chain_id: &str, height: u64, index: u32) -> Evidence {
    let pub_key = key.verifying_key().to_bytes();
    let address = address_from_pub_key(&pub_key);
    let make_vote = |hash: [u8; 32]| {
        let msg = vote::sign_bytes(chain_id, height, 0, &hash);
        Vote {
            height,
            round: 0,
            block_id: BlockId { hash },
            validator_address: address,
            validator_index: index,
            signature: key.sign(&msg).to_bytes().to_vec(),
        }
    };
    Evidence::DuplicateVote(DuplicateVoteEvidence {
        pub_key,
        vote_a: make_vote([1u8; 32]),
        vote_b: make_vote([2u8; 32]),
    })
}

#[tokio::test]
async fn valid_candidate_is_accepted() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    let block = valid_candidate(&fix);
    fix.validator
        .validate_block(&block, &fix.state)
        .await
        .unwrap();
    assert_eq!(fix.app.rollback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn each_header_field_mismatch_yields_its_own_error() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));

    let mut b = valid_candidate(&fix);
    b.header.chain_id = "other-chain".into();
    // Keep the commit linkage intact; only the chain id is wrong.
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::ChainIdMismatch { .. })
    ));

    let mut b = valid_candidate(&fix);
    b.header.height += 1;
    b.last_commit.height += 1;
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::HeightMismatch { expected: 5, got: 6 })
    ));

    let mut b = valid_candidate(&fix);
    b.header.prev_block_id = BlockId { hash: [8u8; 32] };
    b.last_commit.block_id = b.header.prev_block_id.clone();
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::PrevBlockMismatch { .. })
    ));

    let mut b = valid_candidate(&fix);
    b.header.total_txs += 3;
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::TxCountMismatch { .. })
    ));

    // A count below the block's own tx count is the same mismatch, not a
    // malformed block.
    let mut b = valid_candidate(&fix);
    b.header.total_txs = 0;
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::TxCountMismatch { expected: 11, got: 0 })
    ));

    let mut b = valid_candidate(&fix);
    b.header.consensus_params_hash = [0xaa; 32];
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::ConsensusParamsMismatch { .. })
    ));

    let mut b = valid_candidate(&fix);
    b.header.last_results_hash = [0xbb; 32];
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::ResultsHashMismatch { .. })
    ));

    let mut b = valid_candidate(&fix);
    b.header.validators_hash = [0xcc; 32];
    assert!(matches!(
        fix.validator.validate_block(&b, &fix.state).await,
        Err(BlockError::ValidatorsHashMismatch { .. })
    ));

    // None of the above may have triggered a rollback.
    assert_eq!(fix.app.rollback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn commit_size_is_checked_before_signatures() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    let mut block = valid_candidate(&fix);
    // One extra entry, everything else untouched. Garbage signatures in the
    // spurious slot must never be inspected.
    block.last_commit.signatures.push(None);
    assert!(matches!(
        fix.validator.validate_block(&block, &fix.state).await,
        Err(BlockError::CommitSizeMismatch { expected: 4, got: 5 })
    ));
}

#[tokio::test]
async fn app_hash_mismatch_rolls_back_and_reports() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));

    // Bookkeeping as it stands after the last successful commit.
    let snapshot = fix.state.clone();
    fix.state_store.save_snapshot(&snapshot).unwrap();
    fix.state_store.save_current(&fix.state).unwrap();
    BlockStoreState { height: 5 }.save(fix.db.as_ref()).unwrap();

    let mut block = valid_candidate(&fix);
    block.header.app_hash = [0xde; 32];

    let err = fix
        .validator
        .validate_block(&block, &fix.state)
        .await
        .unwrap_err();
    assert!(matches!(err, BlockError::AppHashMismatch { .. }));

    // The rollback ran exactly once and the marker lost exactly one height.
    assert_eq!(fix.app.rollback_calls.load(Ordering::SeqCst), 1);
    assert_eq!(BlockStoreState::load(fix.db.as_ref()).unwrap().height, 4);
    // The current state is the snapshot again, bit for bit.
    assert_eq!(fix.state_store.load_current().unwrap().unwrap(), snapshot);
}

#[tokio::test]
async fn second_mismatch_before_recovery_is_fatal() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    fix.state_store.save_snapshot(&fix.state).unwrap();
    BlockStoreState { height: 5 }.save(fix.db.as_ref()).unwrap();

    let mut block = valid_candidate(&fix);
    block.header.app_hash = [0xde; 32];

    let first = fix.validator.validate_block(&block, &fix.state).await;
    assert!(matches!(first, Err(BlockError::AppHashMismatch { .. })));

    let second = fix.validator.validate_block(&block, &fix.state).await;
    assert!(matches!(
        second,
        Err(BlockError::Fatal(FatalError::RepeatedAppHashMismatch { .. }))
    ));
    assert_eq!(fix.app.rollback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn app_refusing_rollback_is_fatal() {
    let fix = fixture(Arc::new(ScriptedApp::refusing()));
    fix.state_store.save_snapshot(&fix.state).unwrap();
    BlockStoreState { height: 5 }.save(fix.db.as_ref()).unwrap();

    let mut block = valid_candidate(&fix);
    block.header.app_hash = [0xde; 32];

    assert!(matches!(
        fix.validator.validate_block(&block, &fix.state).await,
        Err(BlockError::Fatal(FatalError::AppRollback { code: 1, .. }))
    ));
}

#[tokio::test]
async fn rollback_without_a_snapshot_is_fatal() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    // No snapshot was ever written; the app accepts the rewind, but there is
    // nothing to re-assert as current state.
    BlockStoreState { height: 5 }.save(fix.db.as_ref()).unwrap();

    let mut block = valid_candidate(&fix);
    block.header.app_hash = [0xde; 32];

    assert!(matches!(
        fix.validator.validate_block(&block, &fix.state).await,
        Err(BlockError::Fatal(FatalError::MissingSnapshot))
    ));
    assert_eq!(fix.app.rollback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rollback_over_a_corrupt_snapshot_is_fatal() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    fix.db.put(CHAIN_STATE_SNAPSHOT_KEY, b"\x01\x02").unwrap();
    BlockStoreState { height: 5 }.save(fix.db.as_ref()).unwrap();

    let mut block = valid_candidate(&fix);
    block.header.app_hash = [0xde; 32];

    assert!(matches!(
        fix.validator.validate_block(&block, &fix.state).await,
        Err(BlockError::Fatal(FatalError::Corrupt(_)))
    ));
}

#[tokio::test]
async fn evidence_from_retained_history_is_accepted() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));

    // The offender must hold the exact index the evidence claims.
    let set_at_3 = fix.state.validators.clone();
    fix.validator_sets.save(3, &set_at_3).unwrap();
    let (index, offender) = set_at_3
        .get_by_address(&fix.state.validators.validators()[0].address)
        .map(|(i, v)| (i, v.clone()))
        .unwrap();
    let key = fix
        .keys
        .iter()
        .find(|k| k.verifying_key().to_bytes() == offender.pub_key)
        .unwrap();

    let mut block = valid_candidate(&fix);
    block.evidence = vec![duplicate_vote(key, "test-chain", 3, index as u32)];
    fix.validator
        .validate_block(&block, &fix.state)
        .await
        .unwrap();
}

#[tokio::test]
async fn evidence_with_wrong_index_is_rejected() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    fix.validator_sets.save(3, &fix.state.validators).unwrap();
    let key = &fix.keys[0];

    let mut block = valid_candidate(&fix);
    block.evidence = vec![duplicate_vote(key, "test-chain", 3, 99)];
    assert!(matches!(
        fix.validator.validate_block(&block, &fix.state).await,
        Err(BlockError::EvidenceInvalid { .. })
    ));
}

#[tokio::test]
async fn pruned_history_is_not_invalid_evidence() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    // Height 3 was never stored (or was pruned).
    let key = &fix.keys[0];
    let mut block = valid_candidate(&fix);
    block.evidence = vec![duplicate_vote(key, "test-chain", 3, 0)];

    assert!(matches!(
        fix.validator.validate_block(&block, &fix.state).await,
        Err(BlockError::UnretainedValidators(3))
    ));
}

#[tokio::test]
async fn stale_evidence_fails_before_signature_checks() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    let mut state = fix.state.clone();
    state.consensus_params.max_evidence_age = 2;

    // Garbage signatures: the age gate must fire first.
    let ev = Evidence::DuplicateVote(DuplicateVoteEvidence {
        pub_key: [0u8; 32],
        vote_a: Vote {
            height: 1,
            round: 0,
            block_id: BlockId { hash: [1u8; 32] },
            validator_address: [0u8; 32],
            validator_index: 0,
            signature: vec![0u8; 64],
        },
        vote_b: Vote {
            height: 1,
            round: 0,
            block_id: BlockId { hash: [2u8; 32] },
            validator_address: [0u8; 32],
            validator_index: 0,
            signature: vec![0u8; 64],
        },
    });

    assert!(matches!(
        verify_evidence(&ev, &state, fix.validator_sets.as_ref()),
        Err(EvidenceError::TooOld { height: 1, .. })
    ));
}

#[tokio::test]
async fn height_one_block_with_empty_commit_validates() {
    let fix = fixture(Arc::new(ScriptedApp::accepting()));
    let genesis = ChainState::genesis("test-chain", fix.state.validators.clone());

    let header = BlockHeader {
        chain_id: "test-chain".into(),
        height: 1,
        prev_block_id: BlockId::default(),
        total_txs: 0,
        data_hash: txs_hash(&[]),
        app_hash: genesis.last_app_hash,
        consensus_params_hash: genesis.consensus_params.hash(),
        last_results_hash: genesis.last_results_hash,
        validators_hash: genesis.validators.hash(),
    };
    let mut block = Block {
        header,
        txs: vec![],
        evidence: vec![],
        last_commit: Commit::empty(),
    };

    fix.validator
        .validate_block(&block, &genesis)
        .await
        .unwrap();

    // The same block with one spurious commit entry must be rejected.
    block.last_commit.signatures.push(None);
    assert!(matches!(
        fix.validator.validate_block(&block, &genesis).await,
        Err(BlockError::CommitSizeMismatch { expected: 0, got: 1 })
    ));
}
