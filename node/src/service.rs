//! The masternode service layer, assembled.
//!
//! Owns the two engines behind their coarse per-engine locks and fans
//! inbound messages out by tag; each message goes to exactly one engine.
//! Lock order is always host state before engine lock; the engines only
//! reach back into the host through `HostServices` trait objects, never
//! through each other.

use crate::error::NodeError;
use keel_coinjoin::CoinJoinServer;
use keel_governance::{GovernanceManager, GovernanceSnapshot};
use keel_masternode::{ActiveMasternode, HostServices};
use keel_messages::{Inventory, NetMessage};
use keel_network::PeerInfo;
use keel_types::ProtocolParams;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// The two protocol engines plus dispatch.
pub struct MasternodeService {
    coinjoin: Mutex<CoinJoinServer>,
    governance: Mutex<GovernanceManager>,
}

impl MasternodeService {
    pub fn new(active: ActiveMasternode, params: ProtocolParams) -> Self {
        Self {
            coinjoin: Mutex::new(CoinJoinServer::new(active, params.clone())),
            governance: Mutex::new(GovernanceManager::new(params)),
        }
    }

    /// Route one inbound message to its engine.
    pub fn process_message(&self, peer: &PeerInfo, msg: NetMessage, services: &HostServices) {
        if msg.is_mixing() {
            self.coinjoin().handle_message(peer, msg, services);
        } else if msg.is_governance() {
            self.governance().handle_message(peer, msg, services);
        } else {
            debug!(command = msg.command(), "ignoring message with no engine");
        }
    }

    /// Inventory gate for the host's fetch logic.
    pub fn confirm_inventory_request(&self, inv: &Inventory) -> bool {
        self.governance().confirm_inventory_request(inv)
    }

    /// Chain-tip driving: timeouts, queue progress, postponed promotion.
    pub fn on_new_tip(&self, height: u32, services: &HostServices) {
        self.governance().updated_block_tip(height, services);
        self.coinjoin().on_new_tip(height, services);
    }

    /// The ~5-minute maintenance tick: orphan cleanup and retry, cache
    /// maintenance, and a round of vote solicitation.
    pub fn tick(&self, services: &HostServices) {
        let mut governance = self.governance();
        governance.tick(services);
        governance.request_votes(services);
    }

    pub fn coinjoin(&self) -> MutexGuard<'_, CoinJoinServer> {
        self.coinjoin.lock().expect("coinjoin lock poisoned")
    }

    pub fn governance(&self) -> MutexGuard<'_, GovernanceManager> {
        self.governance.lock().expect("governance lock poisoned")
    }

    // ── governance store persistence ───────────────────────────────────

    /// Write the governance snapshot to disk.
    pub fn save_governance(&self, path: &Path) -> Result<(), NodeError> {
        let snapshot = self.governance().snapshot();
        let bytes =
            bincode::serialize(&snapshot).map_err(|e| NodeError::Serialization(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "governance store saved");
        Ok(())
    }

    /// Load the governance snapshot if one exists. Returns `false` when
    /// there was nothing to load or the version did not match (the store
    /// then starts empty and rebuilds from the network).
    pub fn load_governance(&self, path: &Path, services: &HostServices) -> Result<bool, NodeError> {
        if !path.exists() {
            return Ok(false);
        }
        let bytes = std::fs::read(path)?;
        let snapshot: GovernanceSnapshot =
            bincode::deserialize(&bytes).map_err(|e| NodeError::Serialization(e.to_string()))?;
        let loaded = self.governance().restore(snapshot, services);
        info!(path = %path.display(), loaded, "governance store loaded");
        Ok(loaded)
    }
}
