//! Governance engine for the Keel masternode service layer.
//!
//! A gossip-based object/vote store: masternodes submit funding proposals
//! and superblock triggers, every masternode votes on them, and derived
//! quorum flags (funding, valid, delete, endorsed) drive what the network
//! does with each object. The engine holds the canonical object map plus
//! the buffers that make gossip workable in an adversarial setting:
//! orphans, postponed collateral, tombstones, bounded vote caches, and a
//! per-masternode creation rate limiter.

pub mod cache_map;
pub mod cache_multimap;
pub mod error;
pub mod manager;
pub mod object;
pub mod rate_check;
pub mod sync;
pub mod triggers;

pub use cache_map::CacheMap;
pub use cache_multimap::CacheMultiMap;
pub use error::GovernanceError;
pub use manager::{GovernanceManager, GovernanceSnapshot};
pub use object::{LocalValidity, StoredObject, VoteInstance, VoteRecord};
pub use rate_check::{MasternodeRateRecord, RateCheckBuffer, RATE_BUFFER_SIZE};
pub use triggers::TriggerManager;
