//! Node configuration with TOML file support.

use crate::NodeError;
use keel_crypto::keypair_from_seed;
use keel_types::{KeyPair, Outpoint, ProtocolParams, TxHash};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the masternode service layer.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory; the governance store snapshot lives here.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The local masternode identity, when running in masternode mode.
    #[serde(default)]
    pub masternode: Option<MasternodeEntry>,

    /// Protocol parameters. Omit the table to run mainnet defaults.
    #[serde(default)]
    pub params: ProtocolParams,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// One masternode identity line, as operators configure it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MasternodeEntry {
    pub alias: String,
    pub ip: String,
    /// Hex-encoded 32-byte operator key seed.
    pub operator_key: String,
    /// Hex-encoded collateral transaction hash.
    pub collateral_txid: String,
    pub collateral_vout: u32,
}

impl MasternodeEntry {
    /// Resolve the configured identity into its outpoint and key pair.
    pub fn resolve(&self) -> Result<(Outpoint, KeyPair), NodeError> {
        let seed = parse_hex_32(&self.operator_key)
            .ok_or_else(|| NodeError::Config(format!("bad operator key for {}", self.alias)))?;
        let txid = parse_hex_32(&self.collateral_txid)
            .ok_or_else(|| NodeError::Config(format!("bad collateral txid for {}", self.alias)))?;
        Ok((
            Outpoint::new(TxHash::new(txid), self.collateral_vout),
            keypair_from_seed(&seed),
        ))
    }
}

fn parse_hex_32(s: &str) -> Option<[u8; 32]> {
    if s.len() != 64 {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).ok()?;
    }
    Some(out)
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./keel_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Where the governance store snapshot is persisted.
    pub fn governance_store_path(&self) -> PathBuf {
        self.data_dir.join("governance.dat")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            masternode: None,
            params: ProtocolParams::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.params.min_pool_inputs, config.params.min_pool_inputs);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(NodeConfig::from_toml_file("/nonexistent/keel.toml").is_err());
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let parsed = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(parsed.log_level, "info");
        assert!(parsed.masternode.is_none());
        assert_eq!(parsed.params.max_pool_inputs, 16);
    }

    #[test]
    fn masternode_entry_resolves() {
        let entry = MasternodeEntry {
            alias: "mn1".into(),
            ip: "10.0.0.1:9999".into(),
            operator_key: "aa".repeat(32),
            collateral_txid: "bb".repeat(32),
            collateral_vout: 1,
        };
        let (outpoint, keypair) = entry.resolve().unwrap();
        assert_eq!(outpoint.vout, 1);
        assert_eq!(outpoint.txid, TxHash::new([0xBB; 32]));
        assert_eq!(keypair.public, keypair_from_seed(&[0xAA; 32]).public);
    }

    #[test]
    fn bad_hex_is_rejected() {
        let entry = MasternodeEntry {
            alias: "mn1".into(),
            ip: "10.0.0.1:9999".into(),
            operator_key: "zz".repeat(32),
            collateral_txid: "bb".repeat(32),
            collateral_vout: 0,
        };
        assert!(entry.resolve().is_err());
    }

    #[test]
    fn governance_store_path_is_under_data_dir() {
        let config = NodeConfig::default();
        assert!(config
            .governance_store_path()
            .to_string_lossy()
            .ends_with("governance.dat"));
    }
}
