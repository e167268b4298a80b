//! # Prometheus Metrics
//!
//! Counters for what the ledger did with each block it was offered. Printed
//! in the Prometheus text exposition format by `replay --metrics` and
//! `demo --metrics`.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use linkledger::{AppendOutcome, LedgerError, LedgerResult, RejectionKind};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Holds all Prometheus metric handles for one ledger.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Blocks accepted, genesis included.
    pub blocks_accepted_total: IntCounter,
    /// Blocks refused, labelled by rejection kind.
    pub blocks_rejected_total: IntCounterVec,
    /// Accepted blocks that landed off the canonical chain.
    pub forks_total: IntCounter,
    /// Canonical tip switches onto another branch.
    pub reorgs_total: IntCounter,
    /// Abandoned canonical blocks per reorganization.
    pub reorg_depth: Histogram,
    /// Current length of the canonical chain.
    pub canonical_length: IntGauge,
}

impl LedgerMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("linkledger".into()), None)?;

        let blocks_accepted_total =
            IntCounter::new("blocks_accepted_total", "Total number of blocks accepted")?;
        registry.register(Box::new(blocks_accepted_total.clone()))?;

        let blocks_rejected_total = IntCounterVec::new(
            Opts::new("blocks_rejected_total", "Total number of blocks rejected"),
            &["kind"],
        )?;
        registry.register(Box::new(blocks_rejected_total.clone()))?;
        // Expose every kind from the start, even at zero.
        for kind in RejectionKind::ALL {
            blocks_rejected_total.with_label_values(&[kind.as_str()]);
        }

        let forks_total = IntCounter::new(
            "forks_total",
            "Accepted blocks recorded off the canonical chain",
        )?;
        registry.register(Box::new(forks_total.clone()))?;

        let reorgs_total = IntCounter::new(
            "reorgs_total",
            "Times the canonical tip moved onto another branch",
        )?;
        registry.register(Box::new(reorgs_total.clone()))?;

        let reorg_depth = Histogram::with_opts(
            HistogramOpts::new(
                "reorg_depth",
                "Canonical blocks abandoned per reorganization",
            )
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
        )?;
        registry.register(Box::new(reorg_depth.clone()))?;

        let canonical_length =
            IntGauge::new("canonical_length", "Blocks on the canonical chain")?;
        registry.register(Box::new(canonical_length.clone()))?;

        Ok(Self {
            registry,
            blocks_accepted_total,
            blocks_rejected_total,
            forks_total,
            reorgs_total,
            reorg_depth,
            canonical_length,
        })
    }

    /// Count the result of one append attempt.
    pub fn observe(&self, result: &LedgerResult<AppendOutcome>) {
        match result {
            Ok(outcome) => self.observe_accepted(*outcome),
            Err(err) => self.observe_rejected(err),
        }
    }

    pub fn observe_accepted(&self, outcome: AppendOutcome) {
        self.blocks_accepted_total.inc();
        match outcome {
            AppendOutcome::Forked => self.forks_total.inc(),
            AppendOutcome::Reorganized { depth } => {
                self.reorgs_total.inc();
                self.reorg_depth.observe(depth as f64);
            }
            AppendOutcome::Genesis | AppendOutcome::Extended => {}
        }
    }

    pub fn observe_rejected(&self, err: &LedgerError) {
        self.blocks_rejected_total
            .with_label_values(&[err.kind().as_str()])
            .inc();
    }

    pub fn set_canonical_length(&self, len: usize) {
        self.canonical_length.set(len as i64);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
