//! Node-side wiring for the Keel masternode service layer.
//!
//! The two protocol engines are plain state machines; this crate gives
//! them a home: configuration loading, structured logging, the periodic
//! maintenance scheduler, message dispatch, and governance store
//! persistence. The host node owns one [`MasternodeService`] and feeds it
//! inbound messages, chain tips and clock ticks.

pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod service;

pub use config::{MasternodeEntry, NodeConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use scheduler::Scheduler;
pub use service::MasternodeService;
