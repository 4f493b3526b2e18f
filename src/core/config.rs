use std::time::Duration;

/// Candidate ports tried in order until one binds.
pub const FALLBACK_PORTS: [u16; 6] = [10010, 10011, 10012, 10013, 10014, 10015];

pub const PORT_RETRY_DELAY_MS: u64 = 500;
pub const STATUS_PUSH_DELAY_MS: u64 = 100;
pub const STATUS_BROADCAST_THROTTLE_MS: u64 = 1000;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub ports: Vec<u16>,
    pub host: String,
    /// Application name reported to clients during the identify handshake.
    pub application: String,
    pub port_retry_delay: Duration,
    pub status_push_delay: Duration,
    pub broadcast_throttle: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            ports: FALLBACK_PORTS.to_vec(),
            host: "0.0.0.0".to_string(),
            application: "mpv".to_string(),
            port_retry_delay: Duration::from_millis(PORT_RETRY_DELAY_MS),
            status_push_delay: Duration::from_millis(STATUS_PUSH_DELAY_MS),
            broadcast_throttle: Duration::from_millis(STATUS_BROADCAST_THROTTLE_MS),
        }
    }
}
