//! Nullable host services for deterministic testing.
//!
//! Every external dependency of the engines (registry, chain, clock,
//! connection manager) is abstracted behind a trait in `keel_masternode` /
//! `keel_network`. This crate provides implementations that return
//! programmable values, record what the engines do to them, and never
//! touch the network or the filesystem. Tests drive time and chain height
//! by hand.

pub mod chain;
pub mod clock;
pub mod network;
pub mod registry;

pub use chain::NullChain;
pub use clock::NullClock;
pub use network::NullConnman;
pub use registry::NullRegistry;

use keel_masternode::HostServices;
use std::sync::Arc;

/// A full host bundle built from nullables, plus handles to drive them.
pub struct NullHosts {
    pub registry: Arc<NullRegistry>,
    pub chain: Arc<NullChain>,
    pub clock: Arc<NullClock>,
    pub connman: Arc<NullConnman>,
}

impl NullHosts {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(NullRegistry::new()),
            chain: Arc::new(NullChain::new()),
            clock: Arc::new(NullClock::new(1_700_000_000)),
            connman: Arc::new(NullConnman::new()),
        }
    }

    pub fn services(&self) -> HostServices {
        HostServices::new(
            self.registry.clone(),
            self.chain.clone(),
            self.clock.clone(),
            self.connman.clone(),
        )
    }
}

impl Default for NullHosts {
    fn default() -> Self {
        Self::new()
    }
}
