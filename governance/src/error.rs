//! Governance failure taxonomy.
//!
//! Every rejected object or vote falls into one of four buckets that
//! decide what happens to the sender: nothing, wait-and-see, retry-later,
//! or a misbehavior penalty.

use keel_network::MISBEHAVIOR_PENALTY;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// Nothing wrong and nothing to do: duplicates, obsolete votes.
    #[error("{0}")]
    Benign(String),

    /// Recoverable; the missing piece may still arrive (unknown parent,
    /// unknown masternode).
    #[error("{0}")]
    Warning(String),

    /// Transient local condition; the sender may retry later (vote update
    /// throttling).
    #[error("{0}")]
    Temporary(String),

    /// A bad signature. Always penalized and remembered in the
    /// invalid-vote cache.
    #[error("{0}")]
    InvalidSignature(String),

    /// Any other protocol violation; `penalty` misbehavior for the sender.
    #[error("{reason}")]
    Permanent { reason: String, penalty: u32 },
}

impl GovernanceError {
    /// Misbehavior score the originating peer earns.
    pub fn penalty(&self) -> u32 {
        match self {
            GovernanceError::InvalidSignature(_) => MISBEHAVIOR_PENALTY,
            GovernanceError::Permanent { penalty, .. } => *penalty,
            _ => 0,
        }
    }
}
