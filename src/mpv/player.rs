#[cfg(windows)]
use std::fs::File;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::{
    io::{
        Read,
        Write,
    },
    sync::atomic::{
        AtomicU32,
        Ordering,
    },
    time::Duration,
};

use super::types::{
    IpcRequest,
    IpcResponse,
    IPC_BUFFER_SIZE,
    IPC_SOCKET_TIMEOUT_MS,
};
use crate::{
    core::errors::RemoteError,
    player::{
        Osd,
        PlayerProperties,
    },
};

/// Property store backed by mpv's JSON IPC socket. Each call opens a
/// short-lived connection, so a player restart never leaves a poisoned
/// session behind.
pub struct MpvPlayer {
    endpoint: String,
    request_counter: AtomicU32,
}

impl MpvPlayer {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint, request_counter: AtomicU32::new(1) }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True when the IPC endpoint accepts a connection.
    pub fn is_reachable(&self) -> bool {
        self.connect().is_ok()
    }

    pub(crate) fn connect(&self) -> Result<Box<dyn ReadWrite>, RemoteError> {
        #[cfg(unix)]
        {
            let stream = UnixStream::connect(&self.endpoint).map_err(|e| {
                RemoteError::Player(format!(
                    "failed to connect to mpv IPC {}: {}",
                    self.endpoint, e
                ))
            })?;

            let timeout = Duration::from_millis(IPC_SOCKET_TIMEOUT_MS);
            let _ = stream.set_read_timeout(Some(timeout));
            let _ = stream.set_write_timeout(Some(timeout));
            Ok(Box::new(stream))
        }

        #[cfg(windows)]
        {
            let pipe = std::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(&self.endpoint)
                .map_err(|e| {
                    RemoteError::Player(format!(
                        "failed to connect to mpv pipe {}: {}",
                        self.endpoint, e
                    ))
                })?;
            Ok(Box::new(pipe))
        }
    }

    /// Sends one command and waits for the matching response line.
    fn request(
        &self,
        command: Vec<serde_json::Value>,
    ) -> Result<Option<serde_json::Value>, RemoteError> {
        let request_id = self.request_counter.fetch_add(1, Ordering::SeqCst);
        let request = IpcRequest { command, request_id };
        let payload = format!("{}\n", serde_json::to_string(&request)?);

        let mut connection = self.connect()?;
        connection
            .write_all(payload.as_bytes())
            .map_err(|e| RemoteError::Player(format!("failed to write to mpv IPC: {}", e)))?;

        let mut buf = [0u8; IPC_BUFFER_SIZE];
        let n = connection
            .read(&mut buf)
            .map_err(|e| RemoteError::Player(format!("failed to read mpv response: {}", e)))?;
        if n == 0 {
            return Err(RemoteError::Player("mpv closed the IPC connection".to_string()));
        }

        let text = String::from_utf8_lossy(&buf[..n]);
        for line in text.lines() {
            if let Ok(response) = serde_json::from_str::<IpcResponse>(line) {
                if response.request_id == Some(request_id) {
                    if response.error == "success" {
                        return Ok(response.data);
                    }
                    return Err(RemoteError::Player(format!("mpv error: {}", response.error)));
                }
            }
        }

        Err(RemoteError::Player(format!("no response for request {}", request_id)))
    }

    fn get_property(&self, prop: &str) -> Result<serde_json::Value, RemoteError> {
        let data = self.request(vec!["get_property".into(), prop.into()])?;
        data.ok_or_else(|| RemoteError::Player(format!("empty value for property {}", prop)))
    }

    fn set_property(&self, prop: &str, value: serde_json::Value) -> Result<(), RemoteError> {
        self.request(vec!["set_property".into(), prop.into(), value])?;
        Ok(())
    }
}

impl PlayerProperties for MpvPlayer {
    fn get_flag(&self, prop: &str) -> Result<bool, RemoteError> {
        let value = self.get_property(prop)?;
        value
            .as_bool()
            .ok_or_else(|| RemoteError::Player(format!("property {} is not a flag", prop)))
    }

    fn get_number(&self, prop: &str) -> Result<f64, RemoteError> {
        let value = self.get_property(prop)?;
        value
            .as_f64()
            .ok_or_else(|| RemoteError::Player(format!("property {} is not a number", prop)))
    }

    fn get_string(&self, prop: &str) -> Result<String, RemoteError> {
        match self.get_property(prop)? {
            serde_json::Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    fn set_flag(&self, prop: &str, value: bool) -> Result<(), RemoteError> {
        self.set_property(prop, serde_json::Value::Bool(value))
    }

    fn set_number(&self, prop: &str, value: f64) -> Result<(), RemoteError> {
        let number = serde_json::Number::from_f64(value)
            .ok_or_else(|| RemoteError::Player(format!("invalid value for property {}", prop)))?;
        self.set_property(prop, serde_json::Value::Number(number))
    }
}

impl Osd for MpvPlayer {
    fn show(&self, message: &str) {
        if let Err(e) = self.request(vec!["show-text".into(), message.into()]) {
            log::debug!("[MPV] Failed to show OSD message: {}", e);
        }
    }
}

pub(crate) trait ReadWrite: Read + Write + Send {}

#[cfg(unix)]
impl ReadWrite for UnixStream {}

#[cfg(windows)]
impl ReadWrite for File {}
