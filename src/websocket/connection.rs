use std::{
    net::SocketAddr,
    sync::Arc,
};

use futures_util::{
    SinkExt,
    StreamExt,
};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use uuid::Uuid;

use super::{
    session::ServerSession,
    types::{
        ConnectionId,
        OUTBOUND_QUEUE_SIZE,
    },
};
use crate::{
    command::{
        self,
        Command,
        DecodeError,
    },
    core::errors::RemoteError,
    identify,
};

/// Owns one client socket: registers it, forwards queued frames out, and
/// feeds inbound text frames through the command dispatcher until the
/// client goes away.
pub async fn handle_connection(
    session: Arc<ServerSession>,
    stream: tokio::net::TcpStream,
    addr: SocketAddr,
) -> Result<(), RemoteError> {
    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| RemoteError::Custom(format!("Error during WebSocket handshake: {}", e)))?;

    log::info!("[WS] WebSocket connection established with: {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_SIZE);
    let conn_id: ConnectionId = Uuid::new_v4();
    Arc::clone(&session).register_connection(conn_id, tx);

    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::text(msg)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                process_message(&session, conn_id, &text).await;
            }
            Ok(Message::Close(_)) => {
                log::info!("[WS] Client {} closed the connection", addr);
                break;
            }
            Err(e) => {
                log::warn!("[WS] Error from client {}: {}", addr, e);
                break;
            }
            _ => {}
        }
    }

    forward_task.abort();
    session.close_connection(conn_id);

    Ok(())
}

/// Decodes and dispatches one inbound frame. Unparseable frames are
/// dropped; every decoded frame except identify is followed by a delayed
/// status push back to its sender.
pub(crate) async fn process_message(session: &Arc<ServerSession>, conn: ConnectionId, text: &str) {
    log::debug!("[WS] Received message from {}: {}", conn, text);

    match Command::decode(text) {
        Err(DecodeError::Parse(e)) => {
            log::warn!("[WS] Failed to parse message from {}: {}", conn, e);
            return;
        }
        Err(e) => {
            // Known frame shape, unusable content: no-op, but the client
            // still gets a status echo like any other command.
            log::warn!("[WS] Ignoring command from {}: {}", conn, e);
        }
        Ok(Command::Identify) => {
            log::info!("[WS] Identify request from {}", conn);
            tokio::spawn(identify::respond(Arc::clone(session), conn));
            return;
        }
        Ok(cmd) => {
            log::debug!("[WS] Dispatching command from {}: {:?}", conn, cmd);
            command::execute(cmd, session.player(), session.osd());
        }
    }

    Arc::clone(session).schedule_status_push(conn);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        core::config::RemoteConfig,
        player::{
            fake::{
                FakePlayer,
                RecordingOsd,
            },
            props,
        },
    };

    struct Harness {
        session: Arc<ServerSession>,
        player: Arc<FakePlayer>,
        osd: Arc<RecordingOsd>,
        conn: ConnectionId,
        rx: mpsc::Receiver<String>,
    }

    fn harness(player: FakePlayer) -> Harness {
        let config =
            RemoteConfig { status_push_delay: Duration::from_millis(5), ..Default::default() };
        let player = Arc::new(player);
        let osd = Arc::new(RecordingOsd::new());
        let session = ServerSession::new(config, player.clone(), osd.clone(), None);

        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let conn = Uuid::new_v4();
        session.registry().add(conn, tx);

        Harness { session, player, osd, conn, rx }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    fn frame_type(frame: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        value["type"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_seek_command_clamps_and_echoes_status() {
        let mut h = harness(FakePlayer::with_media(120.0, 10.0));

        process_message(&h.session, h.conn, r#"{"type":"seek","position":9999}"#).await;
        settle().await;

        assert_eq!(h.player.number(props::TIME_POS), Some(120.0));
        let frame = h.rx.try_recv().unwrap();
        assert_eq!(frame_type(&frame), "status");
    }

    #[tokio::test]
    async fn test_set_volume_clamps() {
        let mut h = harness(FakePlayer::new());

        process_message(&h.session, h.conn, r#"{"type":"set-volume","volume":150}"#).await;
        process_message(&h.session, h.conn, r#"{"type":"set-volume","volume":-5}"#).await;
        settle().await;

        assert_eq!(h.player.number(props::VOLUME), Some(0.0));
        assert!(h.rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_unparseable_frame_is_dropped_without_push() {
        let mut h = harness(FakePlayer::new());

        process_message(&h.session, h.conn, "not json at all").await;
        settle().await;

        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_field_is_noop_but_still_pushes() {
        let mut h = harness(FakePlayer::with_media(120.0, 10.0));

        process_message(&h.session, h.conn, r#"{"type":"seek","position":"ten"}"#).await;
        settle().await;

        assert_eq!(h.player.number(props::TIME_POS), Some(10.0));
        let frame = h.rx.try_recv().unwrap();
        assert_eq!(frame_type(&frame), "status");
    }

    #[tokio::test]
    async fn test_unknown_command_is_logged_and_pushes() {
        let mut h = harness(FakePlayer::new());

        process_message(&h.session, h.conn, r#"{"type":"dance"}"#).await;
        settle().await;

        let frame = h.rx.try_recv().unwrap();
        assert_eq!(frame_type(&frame), "status");
    }

    #[tokio::test]
    async fn test_skip_without_media_notices() {
        let mut h = harness(FakePlayer::new());

        process_message(&h.session, h.conn, r#"{"type":"skip-forward"}"#).await;
        settle().await;

        assert!(h.osd.contains("Cannot skip"));
        assert!(h.rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_identify_yields_one_server_info_reply() {
        let mut h = harness(FakePlayer::new());

        process_message(&h.session, h.conn, r#"{"type":"identify"}"#).await;

        let frame = tokio::time::timeout(Duration::from_secs(5), h.rx.recv())
            .await
            .expect("identify reply timed out")
            .expect("connection closed");
        assert_eq!(frame_type(&frame), "server-info");
    }

    #[tokio::test]
    async fn test_identify_reply_via_deliver_with_failed_resolution() {
        let mut h = harness(FakePlayer::new());

        identify::deliver(&h.session, h.conn, None, None);

        let frame = h.rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "server-info");
        assert_eq!(value["data"]["deviceName"], identify::DEVICE_NAME_FALLBACK);
        assert_eq!(value["data"]["networkIP"], identify::NETWORK_IP_UNAVAILABLE);
        assert!(h.rx.try_recv().is_err());
    }
}
