//! Bridge configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crowdcontrol_protocol::ACK_MESSAGE;
use serde::{Deserialize, Serialize};

/// Port the Crowd Control controller listens on.
pub const DEFAULT_CONTROLLER_PORT: u16 = 43384;

/// Configuration for one Crowd Control device.
///
/// Hosts that don't care can use `BridgeConfig::default()`; hosts that keep
/// settings in a file can deserialize it, and missing fields fall back to
/// the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Where the controller listens. Default: `127.0.0.1:43384`.
    pub controller_addr: SocketAddr,

    /// How long a connect attempt may block the emulation thread.
    pub connect_timeout: Duration,

    /// Largest inbound message accepted, in bytes. Longer messages are
    /// dropped and reported to the game as unknown.
    pub max_message_len: usize,

    /// Text sent in the `message` field of every acknowledgement.
    pub ack_message: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            controller_addr: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::LOCALHOST,
                DEFAULT_CONTROLLER_PORT,
            )),
            connect_timeout: Duration::from_secs(1),
            max_message_len: 4096,
            ack_message: ACK_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_controller() {
        let config = BridgeConfig::default();
        assert_eq!(config.controller_addr.to_string(), "127.0.0.1:43384");
        assert_eq!(config.ack_message, "Response sent from game");
        assert!(config.max_message_len >= 200);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"controller_addr":"127.0.0.1:5000"}"#).unwrap();
        assert_eq!(config.controller_addr.port(), 5000);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.max_message_len, 4096);
    }
}
