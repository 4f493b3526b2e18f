use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::process::Command as Process;

use crate::{
    command,
    websocket::{
        session::ServerSession,
        types::{
            server_info_frame,
            ConnectionId,
        },
    },
};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const DEVICE_NAME_FALLBACK: &str = "Unknown Device";
pub const NETWORK_IP_UNAVAILABLE: &str = "unavailable";

/// Server identity sent once per identify handshake.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub application: String,
    pub device_name: String,
    pub name: String,
    pub version: String,
    pub port: u16,
    #[serde(rename = "networkIP")]
    pub network_ip: String,
    pub timestamp: i64,
    pub capabilities: Vec<&'static str>,
}

impl ServerInfo {
    /// Composes the handshake reply, substituting fallbacks for metadata
    /// that could not be resolved.
    pub fn compose(
        application: &str,
        device_name: Option<String>,
        network_ip: Option<String>,
        port: u16,
    ) -> Self {
        let device_name = device_name.unwrap_or_else(|| DEVICE_NAME_FALLBACK.to_string());
        Self {
            name: format!("{} Web Remote ({})", application, device_name),
            application: application.to_string(),
            device_name,
            version: PROTOCOL_VERSION.to_string(),
            port,
            network_ip: network_ip.unwrap_or_else(|| NETWORK_IP_UNAVAILABLE.to_string()),
            timestamp: Utc::now().timestamp_millis(),
            capabilities: command::TAGS.to_vec(),
        }
    }
}

/// Answers one identify request. Device name and network address resolve
/// concurrently; either failing independently still yields a reply.
pub async fn respond(session: Arc<ServerSession>, conn: ConnectionId) {
    let (device_name, network_ip) = tokio::join!(device_name(), local_network_ip());
    deliver(&session, conn, device_name, network_ip);
}

pub(crate) fn deliver(
    session: &ServerSession,
    conn: ConnectionId,
    device_name: Option<String>,
    network_ip: Option<String>,
) {
    if device_name.is_none() {
        log::warn!("[Identify] Device name unresolved, using fallback");
    }
    if network_ip.is_none() {
        log::warn!("[Identify] Network address unresolved, using fallback");
    }

    let info = ServerInfo::compose(
        &session.config().application,
        device_name,
        network_ip,
        session.bound_port().unwrap_or(0),
    );

    match server_info_frame(&info) {
        Ok(text) => {
            if session.send_text(conn, text) {
                log::debug!("[Identify] Sent server info to {}", conn);
            }
        }
        Err(e) => log::warn!("[Identify] Failed to serialize server info: {}", e),
    }
}

/// Resolves the machine's name, best-effort.
pub async fn device_name() -> Option<String> {
    #[cfg(target_os = "macos")]
    if let Some(name) = run_capture("scutil", &["--get", "ComputerName"]).await {
        return Some(name);
    }

    run_capture("hostname", &[]).await
}

/// Resolves a non-loopback local address, best-effort.
pub async fn local_network_ip() -> Option<String> {
    let pipeline = "ifconfig | grep 'inet ' | grep -v '127.0.0.1' | head -1 | awk '{print $2}'";
    if let Some(ip) = run_capture("sh", &["-c", pipeline]).await {
        return Some(ip);
    }

    run_capture("sh", &["-c", "hostname -I | awk '{print $1}'"]).await
}

async fn run_capture(program: &str, args: &[&str]) -> Option<String> {
    match Process::new(program).args(args).output().await {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                None
            } else {
                Some(stdout)
            }
        }
        Ok(output) => {
            log::debug!("[Identify] {} exited with {}", program, output.status);
            None
        }
        Err(e) => {
            log::debug!("[Identify] Failed to run {}: {}", program, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_with_resolved_metadata() {
        let info = ServerInfo::compose(
            "mpv",
            Some("Living Room".to_string()),
            Some("192.168.1.20".to_string()),
            10010,
        );

        assert_eq!(info.application, "mpv");
        assert_eq!(info.device_name, "Living Room");
        assert_eq!(info.name, "mpv Web Remote (Living Room)");
        assert_eq!(info.network_ip, "192.168.1.20");
        assert_eq!(info.port, 10010);
        assert_eq!(info.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_compose_substitutes_fallbacks() {
        let info = ServerInfo::compose("mpv", None, None, 10011);

        assert_eq!(info.device_name, DEVICE_NAME_FALLBACK);
        assert_eq!(info.network_ip, NETWORK_IP_UNAVAILABLE);
        assert!(!info.name.is_empty());
        assert!(info.timestamp > 0);
    }

    #[test]
    fn test_capabilities_match_command_tags() {
        let info = ServerInfo::compose("mpv", None, None, 0);

        assert_eq!(info.capabilities, command::TAGS.to_vec());
        assert!(info.capabilities.contains(&"toggle-pause"));
        assert!(!info.capabilities.contains(&"unknown"));
    }

    #[test]
    fn test_wire_field_names() {
        let info = ServerInfo::compose("mpv", None, None, 10010);
        let value = serde_json::to_value(&info).unwrap();

        for key in [
            "application",
            "deviceName",
            "name",
            "version",
            "port",
            "networkIP",
            "timestamp",
            "capabilities",
        ] {
            assert!(value.get(key).is_some(), "missing wire field {}", key);
        }
    }
}
