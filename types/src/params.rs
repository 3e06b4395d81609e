//! Protocol parameters for the masternode service layer.

use crate::amount::{Amount, COIN};
use serde::{Deserialize, Serialize};

/// Tunable parameters shared by the mixing coordinator and the governance
/// engine. Defaults match mainnet consensus; tests and regtest setups
/// override individual fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Minimum peer protocol version accepted by either engine.
    pub min_protocol_version: u32,

    /// Seconds a coordinator waits for entries before finalizing with
    /// however many it has (if at least `min_pool_inputs`).
    pub accept_timeout_secs: u64,

    /// Seconds all participants get to return their signed partials.
    pub signing_timeout_secs: u64,

    /// Blocks a queue advertisement stays valid.
    pub queue_ttl_blocks: u32,

    /// Maximum inputs in a single pool entry.
    pub entry_max_inputs: usize,

    /// Participants needed before a session is ready for entries.
    pub min_pool_inputs: usize,

    /// Participants after which a session stops admitting.
    pub max_pool_inputs: usize,

    /// Minimum seconds between vote updates from one masternode for the
    /// same (object, signal) pair.
    pub update_min_secs: u64,

    /// Lifetime of orphaned objects and votes awaiting their masternode
    /// or parent.
    pub orphan_ttl_secs: u64,

    /// Delay between an object's delete/expired latch and its eviction.
    pub deletion_delay_secs: u64,

    /// How far into the future a governance timestamp may reach.
    pub max_future_deviation_secs: u64,

    /// Time for an object to propagate reliably through the network.
    pub reliable_propagation_secs: u64,

    /// Bound on the vote LRU caches.
    pub max_cache_size: usize,

    /// Floor on quorum sizes regardless of masternode count.
    pub min_quorum: usize,

    /// Blocks between scheduled payment superblocks.
    pub superblock_cycle_blocks: u32,

    /// Target block spacing in seconds.
    pub block_spacing_secs: u64,

    /// Confirmations a proposal collateral needs before acceptance.
    pub collateral_confirmations: u32,

    /// Confirmations below which a young collateral is rejected outright
    /// instead of postponed.
    pub min_relay_confirmations: u32,

    /// Proof-of-burn fee a proposal collateral must pay.
    pub proposal_fee: Amount,

    /// Minimum acceptable fee on the finalized mixing transaction.
    pub min_relay_tx_fee: Amount,

    /// Maximum acceptable fee on the finalized mixing transaction.
    pub max_tx_fee: Amount,

    /// Element count for vote-sync bloom filters.
    pub governance_filter_elements: usize,
}

impl ProtocolParams {
    /// Seconds in one superblock cycle.
    pub fn superblock_cycle_secs(&self) -> u64 {
        self.superblock_cycle_blocks as u64 * self.block_spacing_secs
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            min_protocol_version: 70017,
            accept_timeout_secs: 60,
            signing_timeout_secs: 30,
            queue_ttl_blocks: 3,
            entry_max_inputs: 135,
            min_pool_inputs: 3,
            max_pool_inputs: 16,
            update_min_secs: 60 * 60,
            orphan_ttl_secs: 10 * 60,
            deletion_delay_secs: 10 * 60,
            max_future_deviation_secs: 60 * 60,
            reliable_propagation_secs: 60,
            max_cache_size: 1_000_000,
            min_quorum: 1,
            superblock_cycle_blocks: 16_616,
            block_spacing_secs: 150,
            collateral_confirmations: 6,
            min_relay_confirmations: 1,
            proposal_fee: Amount(5 * COIN),
            min_relay_tx_fee: Amount(1_000),
            max_tx_fee: Amount(COIN / 5),
            governance_filter_elements: 20_000,
        }
    }
}
