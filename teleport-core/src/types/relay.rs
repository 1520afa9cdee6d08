use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::H256;

/// Which relay contract a target domain exposes. Selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelayKind {
    /// `relay(guid, signatures, maxFeePercentage, gasFee, expiry, v, r, s)`
    #[default]
    Basic,
    /// Basic plus an arbitrary `(to, data)` call after the mint
    Trusted,
}

impl RelayKind {
    /// Fixed gas estimate for one `relay()` call
    pub const fn default_gas_limit(&self) -> u64 {
        match self {
            Self::Basic => 420_000,
            Self::Trusted => 480_000,
        }
    }

    /// Canonical signature of the `relay()` function
    pub const fn relay_signature(&self) -> &'static str {
        match self {
            Self::Basic => "relay((bytes32,bytes32,bytes32,bytes32,uint128,uint80,uint48),bytes,uint256,uint256,uint256,uint8,bytes32,bytes32)",
            Self::Trusted => "relay((bytes32,bytes32,bytes32,bytes32,uint128,uint80,uint48),bytes,uint256,uint256,uint256,uint8,bytes32,bytes32,address,bytes)",
        }
    }
}

/// Lifecycle of a relayed mint as far as the client knows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RelayTaskStatus {
    /// Accepted by the relay network
    Submitted,
    /// The relay network is executing it
    Pending,
    /// Mined on the target domain
    #[serde(rename_all = "camelCase")]
    Executed {
        /// Hash of the mint transaction
        tx_hash: H256,
    },
    /// The relay network gave up on it
    Failed {
        /// Relay network's explanation
        reason: String,
    },
}

impl RelayTaskStatus {
    fn rank(&self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::Pending => 1,
            Self::Executed { .. } | Self::Failed { .. } => 2,
        }
    }

    /// Whether this state is never left
    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }
}

impl fmt::Display for RelayTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => f.write_str("submitted"),
            Self::Pending => f.write_str("pending"),
            Self::Executed { tx_hash } => write!(f, "executed in {tx_hash:?}"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// A relay request handed to the relay network. The task id is the only
/// handle to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTask {
    /// Relay network task id
    pub task_id: String,
    /// GUID being relayed
    pub guid_hash: H256,
    status: RelayTaskStatus,
}

impl RelayTask {
    /// A freshly submitted task
    pub fn new(task_id: String, guid_hash: H256) -> Self {
        Self {
            task_id,
            guid_hash,
            status: RelayTaskStatus::Submitted,
        }
    }

    /// Current status
    pub fn status(&self) -> &RelayTaskStatus {
        &self.status
    }

    /// Move forward to `next`. Backwards moves and moves out of a terminal
    /// state are ignored. Returns whether the status changed.
    pub fn advance(&mut self, next: RelayTaskStatus) -> bool {
        if self.status.is_terminal() || next.rank() < self.status.rank() {
            if next != self.status {
                warn!(task_id = %self.task_id, current = %self.status, ignored = %next, "Ignoring backwards relay task transition");
            }
            return false;
        }
        if next == self.status {
            return false;
        }
        self.status = next;
        true
    }
}
