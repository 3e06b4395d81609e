//! Masternode identity and the host-node interfaces the engines consume.
//!
//! Every external dependency of the two protocol engines (the masternode
//! registry, the chain, the clock, the connection manager) sits behind a
//! trait here, bundled into [`HostServices`]. Production wires the real
//! node; tests wire the nullables. The engines cannot tell the difference,
//! which is the point.

pub mod active;
pub mod chain;
pub mod registry;
pub mod services;

pub use active::ActiveMasternode;
pub use chain::{Chain, Clock};
pub use registry::{MasternodeInfo, MasternodeRegistry};
pub use services::HostServices;
