use std::{
    collections::HashMap,
    sync::Mutex,
};

use super::{
    props,
    Osd,
    PlayerProperties,
};
use crate::core::errors::RemoteError;

/// In-memory player for unit tests. Properties not present behave like
/// unavailable mpv properties and return an error on read.
pub struct FakePlayer {
    flags: Mutex<HashMap<String, bool>>,
    numbers: Mutex<HashMap<String, f64>>,
    strings: Mutex<HashMap<String, String>>,
    offline: Mutex<bool>,
}

impl FakePlayer {
    pub fn new() -> Self {
        let player = Self {
            flags: Mutex::new(HashMap::new()),
            numbers: Mutex::new(HashMap::new()),
            strings: Mutex::new(HashMap::new()),
            offline: Mutex::new(false),
        };
        player.put_flag(props::PAUSE, false);
        player.put_flag(props::MUTE, false);
        player.put_flag(props::FULLSCREEN, false);
        player.put_number(props::VOLUME, 100.0);
        player.put_number(props::SPEED, 1.0);
        player
    }

    pub fn with_media(duration: f64, time_pos: f64) -> Self {
        let player = Self::new();
        player.put_number(props::DURATION, duration);
        player.put_number(props::TIME_POS, time_pos);
        player.put_string(props::FILENAME, "clip.mkv");
        player.put_string(props::MEDIA_TITLE, "Test Clip");
        player
    }

    pub fn put_flag(&self, prop: &str, value: bool) {
        self.flags.lock().unwrap().insert(prop.to_string(), value);
    }

    pub fn put_number(&self, prop: &str, value: f64) {
        self.numbers.lock().unwrap().insert(prop.to_string(), value);
    }

    pub fn put_string(&self, prop: &str, value: &str) {
        self.strings.lock().unwrap().insert(prop.to_string(), value.to_string());
    }

    pub fn flag(&self, prop: &str) -> Option<bool> {
        self.flags.lock().unwrap().get(prop).copied()
    }

    pub fn number(&self, prop: &str) -> Option<f64> {
        self.numbers.lock().unwrap().get(prop).copied()
    }

    /// Makes every property access fail, as if the player went away.
    pub fn go_offline(&self) {
        *self.offline.lock().unwrap() = true;
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if *self.offline.lock().unwrap() {
            return Err(RemoteError::Player("fake player offline".to_string()));
        }
        Ok(())
    }

    fn unavailable(prop: &str) -> RemoteError {
        RemoteError::Player(format!("property unavailable: {}", prop))
    }
}

impl Default for FakePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerProperties for FakePlayer {
    fn get_flag(&self, prop: &str) -> Result<bool, RemoteError> {
        self.check_online()?;
        self.flag(prop).ok_or_else(|| Self::unavailable(prop))
    }

    fn get_number(&self, prop: &str) -> Result<f64, RemoteError> {
        self.check_online()?;
        self.number(prop).ok_or_else(|| Self::unavailable(prop))
    }

    fn get_string(&self, prop: &str) -> Result<String, RemoteError> {
        self.check_online()?;
        self.strings.lock().unwrap().get(prop).cloned().ok_or_else(|| Self::unavailable(prop))
    }

    fn set_flag(&self, prop: &str, value: bool) -> Result<(), RemoteError> {
        self.check_online()?;
        self.put_flag(prop, value);
        Ok(())
    }

    fn set_number(&self, prop: &str, value: f64) -> Result<(), RemoteError> {
        self.check_online()?;
        self.put_number(prop, value);
        Ok(())
    }
}

/// Collects OSD notices so tests can assert on them.
#[derive(Default)]
pub struct RecordingOsd {
    messages: Mutex<Vec<String>>,
}

impl RecordingOsd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl Osd for RecordingOsd {
    fn show(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
