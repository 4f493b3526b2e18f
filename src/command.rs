use serde::Deserialize;
use thiserror::Error;

use crate::{
    core::errors::RemoteError,
    player::{
        props,
        Osd,
        PlayerProperties,
    },
};

pub const DEFAULT_SKIP_SECONDS: f64 = 10.0;

/// Every recognized command tag, in the order advertised to clients during
/// the identify handshake.
pub const TAGS: [&str; 11] = [
    "identify",
    "play",
    "pause",
    "toggle-pause",
    "seek",
    "skip-forward",
    "skip-backward",
    "toggle-fullscreen",
    "set-volume",
    "toggle-mute",
    "get-status",
];

fn default_skip_amount() -> f64 {
    DEFAULT_SKIP_SECONDS
}

/// One inbound command, decoded and validated from a JSON text frame.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    Identify,
    Play,
    Pause,
    TogglePause,
    Seek {
        position: f64,
    },
    SkipForward {
        #[serde(default = "default_skip_amount")]
        amount: f64,
    },
    SkipBackward {
        #[serde(default = "default_skip_amount")]
        amount: f64,
    },
    ToggleFullscreen,
    SetVolume {
        volume: f64,
    },
    ToggleMute,
    GetStatus,
    #[serde(skip)]
    Unknown {
        tag: String,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Parse(serde_json::Error),

    #[error("message has no \"type\" tag")]
    MissingTag,

    #[error("invalid \"{tag}\" command: {source}")]
    InvalidField {
        tag: String,
        source: serde_json::Error,
    },
}

impl Command {
    /// Decodes one text frame. Field types are validated here so handlers
    /// only ever see well-formed values; a recognized tag with bad fields
    /// is reported separately from unparseable JSON.
    pub fn decode(text: &str) -> Result<Command, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(DecodeError::Parse)?;

        let tag = match value.get("type").and_then(serde_json::Value::as_str) {
            Some(tag) => tag.to_string(),
            None => return Err(DecodeError::MissingTag),
        };

        if !TAGS.contains(&tag.as_str()) {
            return Ok(Command::Unknown { tag });
        }

        serde_json::from_value(value).map_err(|source| DecodeError::InvalidField { tag, source })
    }

    /// Short human label used in failure notices.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Identify => "Identify",
            Command::Play => "Play",
            Command::Pause => "Pause",
            Command::TogglePause => "Toggle pause",
            Command::Seek { .. } => "Seek",
            Command::SkipForward { .. } | Command::SkipBackward { .. } => "Skip",
            Command::ToggleFullscreen => "Toggle fullscreen",
            Command::SetVolume { .. } => "Set volume",
            Command::ToggleMute => "Toggle mute",
            Command::GetStatus => "Get status",
            Command::Unknown { .. } => "Unknown",
        }
    }
}

/// Executes one command against player state. Player failures are caught
/// here and surfaced as an OSD notice so a bad command can never take the
/// dispatcher down with it.
pub fn execute(command: Command, player: &dyn PlayerProperties, osd: &dyn Osd) {
    let label = command.label();

    let outcome = match command {
        Command::Play => set_pause(player, osd, false),
        Command::Pause => set_pause(player, osd, true),
        Command::TogglePause => toggle_pause(player, osd),
        Command::Seek { position } => seek(player, osd, position),
        Command::SkipForward { amount } => skip(player, osd, amount),
        Command::SkipBackward { amount } => skip(player, osd, -amount),
        Command::ToggleFullscreen => toggle_fullscreen(player, osd),
        Command::SetVolume { volume } => set_volume(player, osd, volume),
        Command::ToggleMute => toggle_mute(player, osd),
        Command::GetStatus => Ok(()),
        // Identify is answered by the identification responder, not here.
        Command::Identify => Ok(()),
        Command::Unknown { tag } => {
            log::warn!("[Command] Unknown command type: {}", tag);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        log::warn!("[Command] {} failed: {}", label, e);
        osd.show(&format!("⚠️ {} failed", label));
    }
}

fn set_pause(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
    paused: bool,
) -> Result<(), RemoteError> {
    player.set_flag(props::PAUSE, paused)?;
    osd.show(if paused { "⏸️ Pause" } else { "▶️ Play" });
    Ok(())
}

fn toggle_pause(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
) -> Result<(), RemoteError> {
    let paused = player.get_flag(props::PAUSE)?;
    set_pause(player, osd, !paused)
}

fn seek(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
    position: f64,
) -> Result<(), RemoteError> {
    let duration = player.get_number(props::DURATION).unwrap_or(0.0);
    if duration <= 0.0 {
        log::info!("[Command] Cannot seek: no media loaded or invalid duration");
        osd.show("⚠️ Cannot seek: no media loaded");
        return Ok(());
    }

    let clamped = position.clamp(0.0, duration);
    player.set_number(props::TIME_POS, clamped)?;

    let minutes = (clamped / 60.0).floor() as u64;
    let seconds = (clamped % 60.0).floor() as u64;
    osd.show(&format!("⏩ Seek to {}:{:02}", minutes, seconds));
    log::info!("[Command] Seeking to {:.2}s (requested {:.2}s)", clamped, position);
    Ok(())
}

fn skip(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
    amount: f64,
) -> Result<(), RemoteError> {
    let current = player.get_number(props::TIME_POS).unwrap_or(0.0);
    let duration = player.get_number(props::DURATION).unwrap_or(0.0);
    if duration <= 0.0 {
        log::info!("[Command] Cannot skip: no media loaded");
        osd.show("⚠️ Cannot skip: no media loaded");
        return Ok(());
    }

    let target = (current + amount).clamp(0.0, duration);
    player.set_number(props::TIME_POS, target)?;

    if amount > 0.0 {
        osd.show(&format!("⏩ Skip +{}s", amount));
    } else {
        osd.show(&format!("⏪ Skip {}s", amount));
    }
    log::info!("[Command] Skipping {}s from {:.2}s to {:.2}s", amount, current, target);
    Ok(())
}

fn toggle_fullscreen(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
) -> Result<(), RemoteError> {
    let fullscreen = player.get_flag(props::FULLSCREEN)?;
    player.set_flag(props::FULLSCREEN, !fullscreen)?;
    osd.show("⛶ Toggle Fullscreen");
    Ok(())
}

fn set_volume(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
    volume: f64,
) -> Result<(), RemoteError> {
    let clamped = volume.clamp(0.0, 100.0).round();
    player.set_number(props::VOLUME, clamped)?;
    osd.show(&format!("🔊 Volume: {}%", clamped as u32));
    log::info!("[Command] Volume set to {}%", clamped as u32);
    Ok(())
}

fn toggle_mute(
    player: &dyn PlayerProperties,
    osd: &dyn Osd,
) -> Result<(), RemoteError> {
    let muted = player.get_flag(props::MUTE)?;
    player.set_flag(props::MUTE, !muted)?;
    osd.show(if muted { "🔊 Unmuted" } else { "🔇 Muted" });
    Ok(())
}
