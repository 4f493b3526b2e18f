use serde::{
    Deserialize,
    Serialize,
};

use crate::player::PlayerEvent;

pub const IPC_SOCKET_TIMEOUT_MS: u64 = 800;
pub const IPC_BUFFER_SIZE: usize = 2048;
pub const EVENT_RECONNECT_DELAY_MS: u64 = 2000;

pub fn default_mpv_endpoint() -> &'static str {
    #[cfg(windows)]
    return r"\\.\pipe\tmp\mpv-socket";
    #[cfg(not(windows))]
    return "/tmp/mpv-socket";
}

#[derive(Debug, Serialize)]
pub struct IpcRequest {
    pub command: Vec<serde_json::Value>,
    pub request_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct IpcResponse {
    pub error: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub request_id: Option<u32>,
}

/// One line from mpv's asynchronous event stream.
#[derive(Debug, Deserialize)]
pub struct IpcEvent {
    pub event: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Properties observed for broadcast triggering, with their observer ids.
pub const OBSERVED_PROPERTIES: [(u32, &str); 6] = [
    (1, "pause"),
    (2, "time-pos"),
    (3, "duration"),
    (4, "fullscreen"),
    (5, "volume"),
    (6, "mute"),
];

/// Maps one mpv event onto the engine's trigger vocabulary. Events with
/// no broadcast relevance map to None.
pub fn translate_event(event: &IpcEvent) -> Option<PlayerEvent> {
    match event.event.as_str() {
        "file-loaded" => Some(PlayerEvent::FileLoaded),
        "seek" => Some(PlayerEvent::Seek),
        "property-change" => match event.name.as_deref() {
            Some("pause") => match event.data.as_ref().and_then(serde_json::Value::as_bool) {
                Some(true) => Some(PlayerEvent::Pause),
                Some(false) => Some(PlayerEvent::Unpause),
                None => None,
            },
            Some("time-pos") => Some(PlayerEvent::TimePos),
            Some("duration") => Some(PlayerEvent::Duration),
            Some("fullscreen") => Some(PlayerEvent::Fullscreen),
            Some("volume") => Some(PlayerEvent::Volume),
            Some("mute") => Some(PlayerEvent::Mute),
            _ => None,
        },
        _ => None,
    }
}
