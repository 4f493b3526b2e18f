use chrono::Utc;
use serde::Serialize;

use crate::{
    core::errors::RemoteError,
    player::{
        props,
        PlayerProperties,
    },
};

pub const NO_MEDIA_LABEL: &str = "No media loaded";

/// Point-in-time view of playback state, built fresh for every send.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub paused: bool,
    pub time_pos: f64,
    pub duration: f64,
    pub progress: f64,
    pub has_media: bool,
    pub filename: String,
    pub title: String,
    pub file_format: String,
    pub video_codec: String,
    pub video_width: u32,
    pub video_height: u32,
    pub video_bitrate: u64,
    pub fps: f64,
    pub audio_codec: String,
    pub audio_bitrate: u64,
    pub fullscreen: bool,
    pub volume: u32,
    pub muted: bool,
    pub speed: f64,
    pub time_formatted: String,
    pub duration_formatted: String,
    pub timestamp: i64,
}

impl StatusSnapshot {
    /// Snapshot used when the player cannot be read at all.
    pub fn fallback() -> Self {
        Self {
            paused: true,
            time_pos: 0.0,
            duration: 0.0,
            progress: 0.0,
            has_media: false,
            filename: NO_MEDIA_LABEL.to_string(),
            title: NO_MEDIA_LABEL.to_string(),
            file_format: String::new(),
            video_codec: String::new(),
            video_width: 0,
            video_height: 0,
            video_bitrate: 0,
            fps: 0.0,
            audio_codec: String::new(),
            audio_bitrate: 0,
            fullscreen: false,
            volume: 100,
            muted: false,
            speed: 1.0,
            time_formatted: "0:00".to_string(),
            duration_formatted: "0:00".to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Reads current playback state into a snapshot. Individual properties that
/// cannot be read fall back to defaults; if even the pause flag is
/// unreadable the player is treated as gone and the fallback snapshot is
/// returned.
pub fn build_status(player: &dyn PlayerProperties) -> StatusSnapshot {
    let paused = match player.get_flag(props::PAUSE) {
        Ok(flag) => flag,
        Err(e) => {
            log::warn!("[Status] Failed to read player state: {}", e);
            return StatusSnapshot::fallback();
        }
    };

    let time_pos = player.get_number(props::TIME_POS).unwrap_or(0.0);
    let duration = player.get_number(props::DURATION).unwrap_or(0.0);
    let filename =
        non_empty(player.get_string(props::FILENAME)).unwrap_or_else(|| NO_MEDIA_LABEL.to_string());
    let title =
        non_empty(player.get_string(props::MEDIA_TITLE)).unwrap_or_else(|| filename.clone());

    let progress = if duration > 0.0 { (time_pos / duration) * 100.0 } else { 0.0 };

    StatusSnapshot {
        paused,
        time_pos: round2(time_pos),
        duration: round2(duration),
        progress: round2(progress),
        has_media: duration > 0.0,
        filename,
        title,
        file_format: player.get_string(props::FILE_FORMAT).unwrap_or_default(),
        video_codec: player.get_string(props::VIDEO_CODEC).unwrap_or_default(),
        video_width: player.get_number(props::WIDTH).unwrap_or(0.0) as u32,
        video_height: player.get_number(props::HEIGHT).unwrap_or(0.0) as u32,
        video_bitrate: player.get_number(props::VIDEO_BITRATE).unwrap_or(0.0) as u64,
        fps: round2(player.get_number(props::FPS).unwrap_or(0.0)),
        audio_codec: player.get_string(props::AUDIO_CODEC).unwrap_or_default(),
        audio_bitrate: player.get_number(props::AUDIO_BITRATE).unwrap_or(0.0) as u64,
        fullscreen: player.get_flag(props::FULLSCREEN).unwrap_or(false),
        volume: player.get_number(props::VOLUME).unwrap_or(100.0).round() as u32,
        muted: player.get_flag(props::MUTE).unwrap_or(false),
        speed: player.get_number(props::SPEED).unwrap_or(1.0),
        time_formatted: format_time(time_pos),
        duration_formatted: format_time(duration),
        timestamp: Utc::now().timestamp_millis(),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats seconds as "H:MM:SS" above an hour, "M:SS" below.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

fn non_empty(value: Result<String, RemoteError>) -> Option<String> {
    value.ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::fake::FakePlayer;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3661.0), "1:01:01");
        assert_eq!(format_time(7325.5), "2:02:05");
    }

    #[test]
    fn test_rounding_and_progress() {
        let player = FakePlayer::with_media(120.0, 30.0);
        player.put_number(props::FPS, 23.976);

        let status = build_status(&player);
        assert_eq!(status.time_pos, 30.0);
        assert_eq!(status.duration, 120.0);
        assert_eq!(status.progress, 25.0);
        assert_eq!(status.fps, 23.98);
        assert!(status.has_media);
    }

    #[test]
    fn test_two_decimal_rounding() {
        let player = FakePlayer::with_media(100.0, 10.5555);

        let status = build_status(&player);
        assert_eq!(status.time_pos, 10.56);
        assert_eq!(status.progress, 10.56);
    }

    #[test]
    fn test_no_media_snapshot() {
        let player = FakePlayer::new();

        let status = build_status(&player);
        assert!(!status.has_media);
        assert_eq!(status.progress, 0.0);
        assert_eq!(status.duration_formatted, "0:00");
        assert_eq!(status.filename, NO_MEDIA_LABEL);
        assert_eq!(status.title, NO_MEDIA_LABEL);
    }

    #[test]
    fn test_title_falls_back_to_filename() {
        let player = FakePlayer::with_media(60.0, 0.0);
        player.put_string(props::MEDIA_TITLE, "");

        let status = build_status(&player);
        assert_eq!(status.title, "clip.mkv");
    }

    #[test]
    fn test_fallback_when_player_unreachable() {
        let player = FakePlayer::new();
        player.go_offline();

        let status = build_status(&player);
        assert!(status.paused);
        assert!(!status.has_media);
        assert_eq!(status.volume, 100);
        assert_eq!(status.speed, 1.0);
        assert_eq!(status.title, NO_MEDIA_LABEL);
    }

    #[test]
    fn test_wire_field_names() {
        let status = build_status(&FakePlayer::with_media(10.0, 5.0));
        let value = serde_json::to_value(&status).unwrap();

        for key in [
            "paused",
            "timePos",
            "duration",
            "progress",
            "hasMedia",
            "filename",
            "title",
            "fileFormat",
            "videoCodec",
            "videoWidth",
            "videoHeight",
            "videoBitrate",
            "fps",
            "audioCodec",
            "audioBitrate",
            "fullscreen",
            "volume",
            "muted",
            "speed",
            "timeFormatted",
            "durationFormatted",
            "timestamp",
        ] {
            assert!(value.get(key).is_some(), "missing wire field {}", key);
        }
    }

    #[test]
    fn test_volume_rounds_to_integer() {
        let player = FakePlayer::new();
        player.put_number(props::VOLUME, 52.6);

        let status = build_status(&player);
        assert_eq!(status.volume, 53);
    }
}
