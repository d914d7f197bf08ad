use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Tracks the one-way transitions of the merge.
///
/// Both flags only ever move from `false` to `true`. Once the terminal total
/// difficulty is reached the pre-merge sealing loop is inhibited; once a
/// proof-of-stake fork-choice update carries a finalized block, legacy sync
/// is abandoned for good.
///
/// Reads use acquire loads and the latching stores release ordering, so a
/// reader that observes a latched flag also observes the chain state written
/// before the transition.
#[derive(Debug, Default)]
pub struct MergeLatch {
    ttd_reached: AtomicBool,
    pos_finalized: AtomicBool,
}

impl MergeLatch {
    /// True once a post-terminal block was validated or accepted.
    pub fn ttd_reached(&self) -> bool {
        self.ttd_reached.load(Ordering::Acquire)
    }

    /// Latches the terminal-total-difficulty transition.
    pub fn latch_ttd_reached(&self) {
        if !self.ttd_reached.swap(true, Ordering::AcqRel) {
            info!(target: "consensus::engine", "terminal total difficulty reached, block production is inhibited");
        }
    }

    /// True once the chain finalized under proof of stake.
    pub fn pos_finalized(&self) -> bool {
        self.pos_finalized.load(Ordering::Acquire)
    }

    /// Latches the proof-of-stake finalization transition.
    pub fn latch_pos_finalized(&self) {
        // finalization implies the terminal difficulty was crossed
        self.latch_ttd_reached();
        if !self.pos_finalized.swap(true, Ordering::AcqRel) {
            info!(target: "consensus::engine", "chain finalized under proof of stake");
        }
    }
}
