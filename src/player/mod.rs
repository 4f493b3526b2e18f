#[cfg(test)]
pub mod fake;

use serde::Serialize;

use crate::core::errors::RemoteError;

/// Property names understood by mpv-family players.
pub mod props {
    pub const PAUSE: &str = "pause";
    pub const TIME_POS: &str = "time-pos";
    pub const DURATION: &str = "duration";
    pub const FILENAME: &str = "filename";
    pub const MEDIA_TITLE: &str = "media-title";
    pub const FILE_FORMAT: &str = "file-format";
    pub const VIDEO_CODEC: &str = "video-codec";
    pub const AUDIO_CODEC: &str = "audio-codec";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const VIDEO_BITRATE: &str = "video-bitrate";
    pub const AUDIO_BITRATE: &str = "audio-bitrate";
    pub const FPS: &str = "estimated-vf-fps";
    pub const FULLSCREEN: &str = "fullscreen";
    pub const VOLUME: &str = "volume";
    pub const MUTE: &str = "mute";
    pub const SPEED: &str = "speed";
}

/// Typed access to the host player's property store.
pub trait PlayerProperties: Send + Sync {
    fn get_flag(&self, prop: &str) -> Result<bool, RemoteError>;
    fn get_number(&self, prop: &str) -> Result<f64, RemoteError>;
    fn get_string(&self, prop: &str) -> Result<String, RemoteError>;
    fn set_flag(&self, prop: &str, value: bool) -> Result<(), RemoteError>;
    fn set_number(&self, prop: &str, value: f64) -> Result<(), RemoteError>;
}

/// Player-state change notifications that trigger a broadcast attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    Pause,
    Unpause,
    FileLoaded,
    Seek,
    TimePos,
    Duration,
    Fullscreen,
    Volume,
    Mute,
}

/// On-screen notice sink.
pub trait Osd: Send + Sync {
    fn show(&self, message: &str);
}

/// OSD for hosts without an on-screen display; notices go to the log.
pub struct LogOsd;

impl Osd for LogOsd {
    fn show(&self, message: &str) {
        log::info!("[OSD] {}", message);
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub port: u16,
    #[serde(rename = "networkIP")]
    pub network_ip: Option<String>,
    pub client_count: usize,
}

/// Optional sink for connection-info pushes (e.g. a host UI window).
pub trait ConnectionInfoSink: Send + Sync {
    fn push(&self, info: &ConnectionInfo);
}
