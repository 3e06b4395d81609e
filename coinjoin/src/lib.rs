//! CoinJoin mixing coordinator for the Keel masternode service layer.
//!
//! A masternode runs one mixing session at a time: it advertises a signed
//! queue for a denomination, admits compatible peers, collects their
//! partial transactions, merges everything into one shuffled joint
//! transaction, gathers signatures, and commits the result to the
//! mempool. Peers never see each other (only the coordinator), and the
//! input-to-output mapping of the final transaction is not externally
//! attributable.

pub mod queues;
pub mod server;
pub mod session;

pub use queues::{QueueObservation, QueuePool};
pub use server::CoinJoinServer;
pub use session::MixSession;
