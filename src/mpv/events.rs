use std::{
    io::{
        Read,
        Write,
    },
    sync::Arc,
    time::Duration,
};

use tokio::sync::mpsc::UnboundedSender;

use super::{
    player::MpvPlayer,
    types::{
        translate_event,
        IpcEvent,
        IpcRequest,
        EVENT_RECONNECT_DELAY_MS,
        IPC_BUFFER_SIZE,
        OBSERVED_PROPERTIES,
    },
};
use crate::{
    core::errors::RemoteError,
    player::PlayerEvent,
};

/// Watches mpv's event stream on a dedicated connection and forwards
/// broadcast triggers. Reconnects with a fixed delay whenever the player
/// goes away; stops once the receiving side is dropped.
pub fn spawn_event_listener(
    player: Arc<MpvPlayer>,
    tx: UnboundedSender<PlayerEvent>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            match player.connect() {
                Ok(connection) => {
                    if let Err(e) = pump_events(connection, &tx) {
                        log::warn!("[MPV] Event stream lost: {}", e);
                    }
                }
                Err(e) => log::debug!("[MPV] Event connection unavailable: {}", e),
            }

            if tx.is_closed() {
                break;
            }
            std::thread::sleep(Duration::from_millis(EVENT_RECONNECT_DELAY_MS));
        }
        log::info!("[MPV] Event listener stopped");
    })
}

fn pump_events(
    mut connection: Box<dyn super::player::ReadWrite>,
    tx: &UnboundedSender<PlayerEvent>,
) -> Result<(), RemoteError> {
    subscribe(&mut connection)?;

    let mut pending = String::new();
    let mut buf = [0u8; IPC_BUFFER_SIZE];

    loop {
        if tx.is_closed() {
            return Ok(());
        }

        let n = match connection.read(&mut buf) {
            Ok(0) => return Err(RemoteError::Player("event connection closed".to_string())),
            Ok(n) => n,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        pending.push_str(&String::from_utf8_lossy(&buf[..n]));

        while let Some(newline) = pending.find('\n') {
            let line = pending[..newline].trim().to_string();
            pending.drain(..=newline);
            if line.is_empty() {
                continue;
            }

            if let Ok(event) = serde_json::from_str::<IpcEvent>(&line) {
                if let Some(trigger) = translate_event(&event) {
                    if tx.send(trigger).is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn subscribe(connection: &mut Box<dyn super::player::ReadWrite>) -> Result<(), RemoteError> {
    for (id, prop) in OBSERVED_PROPERTIES {
        let request = IpcRequest {
            command: vec!["observe_property".into(), id.into(), prop.into()],
            request_id: id,
        };
        let payload = format!("{}\n", serde_json::to_string(&request)?);
        connection
            .write_all(payload.as_bytes())
            .map_err(|e| RemoteError::Player(format!("failed to observe {}: {}", prop, e)))?;
    }
    Ok(())
}
