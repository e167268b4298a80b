//! Integration tests for fork bookkeeping and canonical chain selection.
//!
//! Each test builds its own ledger from a genesis block and drives it only
//! through the public API. The randomized tests use seeded RNGs so any
//! failure reproduces exactly.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use linkledger::{
    AppendOutcome, Block, BlockHash, HashAlgorithm, Ledger, LedgerConfig, LedgerError,
    RejectionKind, SharedLedger,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const H: HashAlgorithm = HashAlgorithm::Blake3;

/// Ledger seeded with genesis "TEST" at timestamp 1.
fn setup() -> (Ledger, Block) {
    let ledger = Ledger::bootstrap(LedgerConfig::default(), "TEST", 1).expect("genesis");
    let genesis = ledger.genesis().expect("genesis present").clone();
    (ledger, genesis)
}

fn payloads(chain: &[&Block]) -> Vec<String> {
    chain.iter().map(|b| b.payload().to_string()).collect()
}

/// Canonical chain invariants that must hold after every successful append.
fn assert_canonical_invariants(ledger: &Ledger, genesis: &Block) {
    let chain = ledger.canonical_chain();
    assert_eq!(chain.len(), ledger.canonical_len());
    assert_eq!(chain.last().copied(), Some(genesis));
    assert_eq!(Some(chain[0].index()), ledger.height());
    assert_eq!(chain.len() as u64, ledger.height().unwrap() + 1);
    for pair in chain.windows(2) {
        assert_eq!(pair[0].previous_hash(), Some(pair[1].hash()));
        assert_eq!(pair[0].index(), pair[1].index() + 1);
    }
}

// ---------------------------------------------------------------------------
// Fixed scenarios
// ---------------------------------------------------------------------------

#[test]
fn longer_branch_takes_over() {
    let (mut ledger, genesis) = setup();

    let foo = Block::successor(&H, &genesis, "FOO", 12_345);
    ledger.append(foo.clone()).unwrap();
    assert_eq!(ledger.canonical_len(), 2);
    assert_eq!(ledger.tip(), Some(&foo));

    let bar = Block::successor(&H, &genesis, "BAR", 12_346);
    ledger.append(bar.clone()).unwrap();
    assert_eq!(ledger.canonical_len(), 2);
    assert_eq!(ledger.tip(), Some(&foo));
    assert_eq!(ledger.blocks_at(1).len(), 2);

    let bar_1 = Block::successor(&H, &bar, "BAR-1", 12_347);
    ledger.append(bar_1).unwrap();
    assert_eq!(ledger.canonical_len(), 3);
    assert_eq!(payloads(&ledger.canonical_chain()), vec!["BAR-1", "BAR", "TEST"]);

    assert!(ledger.is_valid_chain(&genesis));
}

#[test]
fn branches_trade_the_lead() {
    let (mut ledger, genesis) = setup();

    let foo = Block::successor(&H, &genesis, "FOO", 12_345);
    let bar = Block::successor(&H, &genesis, "BAR", 12_346);
    let foo_1 = Block::successor(&H, &foo, "FOO-1", 12_347);
    let bar_1 = Block::successor(&H, &bar, "BAR-1", 12_348);
    let bar_2 = Block::successor(&H, &bar_1, "BAR-2", 12_349);

    let outcomes: Vec<AppendOutcome> = [foo, bar, foo_1, bar_1, bar_2]
        .into_iter()
        .map(|block| ledger.append_with_outcome(block).unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            AppendOutcome::Extended,
            AppendOutcome::Forked,
            AppendOutcome::Extended,
            AppendOutcome::Forked,
            AppendOutcome::Reorganized { depth: 2 },
        ]
    );
    assert_eq!(ledger.canonical_len(), 4);
    assert_eq!(
        payloads(&ledger.canonical_chain()),
        vec!["BAR-2", "BAR-1", "BAR", "TEST"]
    );
    assert_eq!(ledger.fork_indices(), vec![1, 2]);

    let stats = ledger.stats();
    assert_eq!(stats.accepted, 6);
    assert_eq!(stats.forks, 2);
    assert_eq!(stats.reorgs, 1);
    assert_eq!(stats.max_reorg_depth, 2);

    // Losing branch stays queryable.
    let losers: Vec<&str> = ledger.blocks_at(2).iter().map(|b| b.payload()).collect();
    assert_eq!(losers, vec!["FOO-1", "BAR-1"]);
    assert!(ledger.is_valid_chain(&genesis));
}

#[test]
fn skipped_index_is_invalid_linkage() {
    let (mut ledger, genesis) = setup();
    let skip = Block::mint(&H, 2, "BAR", 234_567_891, Some(genesis.hash().clone()));

    assert!(!ledger.is_valid_successor(&skip, &genesis));
    let err = ledger.append(skip).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidLinkage { index: 2, .. }));
    assert_eq!(err.kind(), RejectionKind::InvalidLinkage);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn unknown_parent_is_missing_predecessor_even_with_bad_hash() {
    let (mut ledger, genesis) = setup();
    let stranger = Block::genesis(&H, "STRANGER", 99);
    // Declared hash is genesis's, which can never match these contents.
    let orphan = Block::new(
        1,
        "ORPHAN",
        100,
        genesis.hash().clone(),
        Some(stranger.hash().clone()),
    );

    let err = ledger.append(orphan).unwrap_err();
    assert!(matches!(err, LedgerError::MissingPredecessor { .. }));
    assert_eq!(ledger.stats().rejected_of(RejectionKind::HashMismatch), 0);
    assert_eq!(ledger.stats().rejected_of(RejectionKind::MissingPredecessor), 1);
}

#[test]
fn tampered_payload_is_hash_mismatch() {
    let (mut ledger, genesis) = setup();
    let honest = Block::successor(&H, &genesis, "PAY 10", 2);
    let tampered = Block::new(
        honest.index(),
        "PAY 1000",
        honest.timestamp(),
        honest.hash().clone(),
        honest.previous_hash().cloned(),
    );

    let err = ledger.append(tampered).unwrap_err();
    match err {
        LedgerError::HashMismatch {
            index,
            declared,
            computed,
        } => {
            assert_eq!(index, 1);
            assert_eq!(&declared, honest.hash());
            assert_ne!(declared, computed);
        }
        other => panic!("unexpected error: {other}"),
    }
    ledger.append(honest).unwrap();
}

#[test]
fn json_blocks_feed_the_ledger() {
    let (mut ledger, genesis) = setup();
    let next = Block::successor(&H, &genesis, "FOO", 2);
    let decoded = Block::from_json(&next.to_json()).unwrap();
    ledger.append(decoded).unwrap();
    assert_eq!(ledger.tip(), Some(&next));

    let err = Block::from_json("{ not json").unwrap_err();
    assert_eq!(err.kind(), RejectionKind::MalformedBlock);
}

#[test]
fn payload_limit_comes_from_config() {
    let config = LedgerConfig {
        max_payload_bytes: 8,
        ..LedgerConfig::default()
    };
    let mut ledger = Ledger::bootstrap(config, "TEST", 1).unwrap();
    let genesis = ledger.genesis().unwrap().clone();

    let small = Block::successor(&H, &genesis, "12345678", 2);
    let large = Block::successor(&H, &genesis, "123456789", 3);
    ledger.append(small).unwrap();
    let err = ledger.append(large).unwrap_err();
    assert!(matches!(err, LedgerError::MalformedBlock { .. }));
}

#[test]
fn sha256_ledger_round_trip() {
    let config = LedgerConfig::default().with_hash_algorithm(HashAlgorithm::Sha256);
    let mut ledger = Ledger::bootstrap(config, "TEST", 1).unwrap();
    let genesis = ledger.genesis().unwrap().clone();
    assert!(genesis.hash_matches(&HashAlgorithm::Sha256));
    assert!(!genesis.hash_matches(&HashAlgorithm::Blake3));

    let next = Block::successor(&HashAlgorithm::Sha256, &genesis, "FOO", 2);
    ledger.append(next).unwrap();

    let blake_next = Block::successor(&HashAlgorithm::Blake3, &genesis, "BAR", 3);
    assert!(matches!(
        ledger.append(blake_next),
        Err(LedgerError::HashMismatch { .. })
    ));
    assert!(ledger.is_valid_chain(&genesis));
}

// ---------------------------------------------------------------------------
// Randomized forking
// ---------------------------------------------------------------------------

/// Grow a random tree: each new block extends a uniformly chosen accepted
/// block. Every append must succeed and leave the ledger auditable.
#[test]
fn random_fork_trees_stay_valid() {
    for seed in 0..16u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut ledger, genesis) = setup();
        let mut accepted = vec![genesis.clone()];
        let mut best = 1usize;

        for step in 0..120u64 {
            let parent = accepted[rng.gen_range(0..accepted.len())].clone();
            let block = Block::successor(&H, &parent, format!("s{}-{}", seed, step), step);
            let outcome = ledger.append_with_outcome(block.clone()).unwrap();

            let length = block.index() as usize + 1;
            if length > best {
                best = length;
                assert_eq!(ledger.tip(), Some(&block));
                assert_ne!(outcome, AppendOutcome::Forked);
            } else {
                assert_eq!(outcome, AppendOutcome::Forked);
            }
            assert_eq!(ledger.canonical_len(), best);
            assert_canonical_invariants(&ledger, &genesis);
            accepted.push(block);
        }

        assert_eq!(ledger.len(), accepted.len());
        assert!(ledger.is_valid_chain(&genesis), "seed {seed}");
    }
}

/// Mix valid appends with corrupted ones. Rejections must never change
/// what the ledger holds.
#[test]
fn random_rejections_leave_no_trace() {
    let mut rng = StdRng::seed_from_u64(0xF0_4C);
    let (mut ledger, genesis) = setup();
    let mut accepted = vec![genesis.clone()];
    let mut rejected = 0u64;

    for step in 0..200u64 {
        let parent = accepted[rng.gen_range(0..accepted.len())].clone();
        let honest = Block::successor(&H, &parent, format!("p{}", step), step);

        let candidate = match rng.gen_range(0..4) {
            0 => Block::new(
                honest.index(),
                "forged",
                honest.timestamp(),
                honest.hash().clone(),
                honest.previous_hash().cloned(),
            ),
            1 => Block::mint(
                &H,
                honest.index() + 1,
                honest.payload(),
                honest.timestamp(),
                honest.previous_hash().cloned(),
            ),
            2 => parent.clone(),
            _ => honest,
        };

        let before_len = ledger.len();
        let before_chain: Vec<BlockHash> = ledger.canonical_hashes().to_vec();
        match ledger.append(candidate.clone()) {
            Ok(()) => accepted.push(candidate),
            Err(_) => {
                rejected += 1;
                assert_eq!(ledger.len(), before_len);
                assert_eq!(ledger.canonical_hashes(), before_chain.as_slice());
            }
        }
    }

    assert_eq!(ledger.stats().total_rejected(), rejected);
    assert_eq!(ledger.stats().accepted as usize, accepted.len());
    let unique: HashSet<&BlockHash> = accepted.iter().map(Block::hash).collect();
    assert_eq!(unique.len(), accepted.len());
    assert!(ledger.is_valid_chain(&genesis));
}

#[test]
fn shared_ledger_matches_sequential_result() {
    let mut rng = StdRng::seed_from_u64(7);
    let (ledger, genesis) = setup();
    let shared = SharedLedger::from(ledger);
    let mut accepted = vec![genesis.clone()];

    for step in 0..50u64 {
        let parent = accepted[rng.gen_range(0..accepted.len())].clone();
        let block = Block::successor(&H, &parent, format!("x{}", step), step);
        shared.append(block.clone()).unwrap();
        accepted.push(block);
    }

    let deepest = accepted.iter().map(Block::index).max().unwrap();
    assert_eq!(shared.canonical_len() as u64, deepest + 1);
    assert!(shared.read(|l| l.is_valid_chain(&genesis)));
}
