//! The host-services bundle handed to every engine entry point.

use crate::chain::{Chain, Clock};
use crate::registry::MasternodeRegistry;
use keel_network::ConnectionManager;
use std::sync::Arc;

/// Everything the engines need from the surrounding node, in one bundle.
///
/// Cloning is cheap (all fields are `Arc`s), so the node layer clones one
/// bundle into each scheduled task.
#[derive(Clone)]
pub struct HostServices {
    pub registry: Arc<dyn MasternodeRegistry>,
    pub chain: Arc<dyn Chain>,
    pub clock: Arc<dyn Clock>,
    pub connman: Arc<dyn ConnectionManager>,
}

impl HostServices {
    pub fn new(
        registry: Arc<dyn MasternodeRegistry>,
        chain: Arc<dyn Chain>,
        clock: Arc<dyn Clock>,
        connman: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            registry,
            chain,
            clock,
            connman,
        }
    }
}
