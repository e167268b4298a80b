//! Two-branch fork scenario used by the `demo` subcommand.
//!
//! ```text
//! G ── FOO ── FOO-1
//!  └── BAR ── BAR-1 ── BAR-2     BAR-2 overtakes, FOO branch is abandoned
//! ```

use linkledger::{AppendOutcome, Block, BlockHasher, Ledger, LedgerResult};

use crate::metrics::LedgerMetrics;

/// Genesis payload and timestamp of the scenario.
const GENESIS_PAYLOAD: &str = "TEST";
const GENESIS_TIMESTAMP: u64 = 1;

/// Blocks of the scenario in append order, genesis first.
pub fn fork_scenario<H: BlockHasher + ?Sized>(hasher: &H) -> Vec<Block> {
    let genesis = Block::genesis(hasher, GENESIS_PAYLOAD, GENESIS_TIMESTAMP);
    let foo = Block::successor(hasher, &genesis, "FOO", 12_345);
    let bar = Block::successor(hasher, &genesis, "BAR", 12_346);
    let foo_1 = Block::successor(hasher, &foo, "FOO-1", 12_347);
    let bar_1 = Block::successor(hasher, &bar, "BAR-1", 12_348);
    let bar_2 = Block::successor(hasher, &bar_1, "BAR-2", 12_349);
    vec![genesis, foo, bar, foo_1, bar_1, bar_2]
}

/// One appended block and the state right after it.
#[derive(Debug, Clone)]
pub struct DemoStep {
    pub block: Block,
    pub outcome: AppendOutcome,
    pub canonical_len: usize,
}

/// Append the scenario to an empty ledger, recording each step in `metrics`
/// as it happens.
pub fn run(ledger: &mut Ledger, metrics: Option<&LedgerMetrics>) -> LedgerResult<Vec<DemoStep>> {
    let blocks = fork_scenario(ledger.hasher());
    let mut steps = Vec::with_capacity(blocks.len());
    for block in blocks {
        let result = ledger.append_with_outcome(block.clone());
        if let Some(metrics) = metrics {
            metrics.observe(&result);
            metrics.set_canonical_length(ledger.canonical_len());
        }
        steps.push(DemoStep {
            block,
            outcome: result?,
            canonical_len: ledger.canonical_len(),
        });
    }
    Ok(steps)
}
