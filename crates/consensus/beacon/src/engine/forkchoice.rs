use ember_primitives::B256;
use ember_rpc_types::{ForkchoiceState, PayloadStatusEnum};

/// The struct that keeps track of the received forkchoice states and their
/// status.
#[derive(Debug, Clone, Default)]
pub(crate) struct ForkchoiceStateTracker {
    /// The latest forkchoice state that we received.
    ///
    /// Caution: this can be invalid.
    latest: Option<ReceivedForkchoiceState>,
    /// Tracks the latest forkchoice state that we received to which we need
    /// to sync.
    last_syncing: Option<ForkchoiceState>,
    /// The latest forkchoice state that we received and processed as valid.
    last_valid: Option<ForkchoiceState>,
}

impl ForkchoiceStateTracker {
    /// Sets the latest forkchoice state that we received.
    ///
    /// If the status is valid, we also update the last valid forkchoice
    /// state.
    pub(crate) fn set_latest(&mut self, state: ForkchoiceState, status: ForkchoiceStatus) {
        if status.is_valid() {
            self.set_valid(state);
        } else if status.is_syncing() {
            self.last_syncing = Some(state);
        }
        self.latest = Some(ReceivedForkchoiceState { state, status });
    }

    fn set_valid(&mut self, state: ForkchoiceState) {
        // we no longer need to sync to this state.
        self.last_syncing = None;
        self.last_valid = Some(state);
    }

    /// Returns the head hash of the latest received FCU to which we need to
    /// sync.
    pub(crate) fn sync_target(&self) -> Option<B256> {
        self.last_syncing.as_ref().map(|state| state.head_block_hash)
    }

    /// Returns the last valid head hash.
    pub(crate) fn last_valid_head(&self) -> Option<B256> {
        self.last_valid.as_ref().map(|state| state.head_block_hash)
    }

    /// Returns true if no forkchoice state has been received yet.
    pub(crate) fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}

/// Represents a forkchoice update and the status we assigned to it.
#[derive(Debug, Clone)]
#[allow(unused)]
struct ReceivedForkchoiceState {
    state: ForkchoiceState,
    status: ForkchoiceStatus,
}

/// A simplified representation of [`PayloadStatusEnum`] specifically for
/// fork-choice updates.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ForkchoiceStatus {
    /// The forkchoice state is valid.
    Valid,
    /// The forkchoice state is invalid.
    Invalid,
    /// The forkchoice state is unknown.
    Syncing,
}

impl ForkchoiceStatus {
    /// True if the status is [`ForkchoiceStatus::Valid`].
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// True if the status is [`ForkchoiceStatus::Syncing`].
    pub const fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }

    /// Converts the general purpose [`PayloadStatusEnum`] into a
    /// [`ForkchoiceStatus`].
    pub(crate) const fn from_payload_status(status: &PayloadStatusEnum) -> Self {
        match status {
            PayloadStatusEnum::Valid | PayloadStatusEnum::Accepted => Self::Valid,
            PayloadStatusEnum::Invalid { .. } | PayloadStatusEnum::InvalidBlockHash { .. } => {
                Self::Invalid
            }
            PayloadStatusEnum::Syncing => Self::Syncing,
        }
    }
}

impl From<PayloadStatusEnum> for ForkchoiceStatus {
    fn from(status: PayloadStatusEnum) -> Self {
        Self::from_payload_status(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_clears_sync_target_on_valid_update() {
        let mut tracker = ForkchoiceStateTracker::default();
        assert!(tracker.is_empty());

        let state = ForkchoiceState {
            head_block_hash: B256::with_last_byte(1),
            ..Default::default()
        };
        tracker.set_latest(state, ForkchoiceStatus::Syncing);
        assert_eq!(tracker.sync_target(), Some(B256::with_last_byte(1)));

        tracker.set_latest(state, ForkchoiceStatus::Valid);
        assert_eq!(tracker.sync_target(), None);
        assert_eq!(tracker.last_valid_head(), Some(B256::with_last_byte(1)));
    }
}
