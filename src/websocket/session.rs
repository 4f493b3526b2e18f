use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
    time::Instant,
};

use tokio::sync::mpsc::{
    self,
    error::TrySendError,
};

use super::types::{
    status_frame,
    BootstrapState,
    ConnectionId,
};
use crate::{
    core::config::RemoteConfig,
    player::{
        ConnectionInfo,
        ConnectionInfoSink,
        Osd,
        PlayerEvent,
        PlayerProperties,
    },
    status::build_status,
};

/// Live client connections, keyed by connection id. Entries are added on
/// accept and removed on disconnect or send failure; both operations are
/// idempotent.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, mpsc::Sender<String>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self { connections: Mutex::new(HashMap::new()) }
    }

    pub fn add(&self, id: ConnectionId, sender: mpsc::Sender<String>) {
        if let Ok(mut connections) = self.connections.lock() {
            connections.insert(id, sender);
        }
    }

    pub fn remove(&self, id: ConnectionId) -> bool {
        match self.connections.lock() {
            Ok(mut connections) => connections.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    pub fn sender(&self, id: ConnectionId) -> Option<mpsc::Sender<String>> {
        self.connections.lock().ok()?.get(&id).cloned()
    }

    pub fn senders(&self) -> Vec<(ConnectionId, mpsc::Sender<String>)> {
        match self.connections.lock() {
            Ok(connections) => connections.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.connections.lock().map(|connections| connections.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// All mutable server state lives here: bootstrap state, the connection
/// registry and the broadcast throttle timestamp. Every handler works
/// through one shared instance so mutations stay serialized.
pub struct ServerSession {
    config: RemoteConfig,
    state: Mutex<BootstrapState>,
    registry: ConnectionRegistry,
    last_broadcast: Mutex<Option<Instant>>,
    resolved_ip: Mutex<Option<String>>,
    player: Arc<dyn PlayerProperties>,
    osd: Arc<dyn Osd>,
    info_sink: Option<Arc<dyn ConnectionInfoSink>>,
}

impl ServerSession {
    pub fn new(
        config: RemoteConfig,
        player: Arc<dyn PlayerProperties>,
        osd: Arc<dyn Osd>,
        info_sink: Option<Arc<dyn ConnectionInfoSink>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(BootstrapState::Idle),
            registry: ConnectionRegistry::new(),
            last_broadcast: Mutex::new(None),
            resolved_ip: Mutex::new(None),
            player,
            osd,
            info_sink,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn player(&self) -> &dyn PlayerProperties {
        self.player.as_ref()
    }

    pub fn osd(&self) -> &dyn Osd {
        self.osd.as_ref()
    }

    pub(crate) fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn bound_port(&self) -> Option<u16> {
        self.state.lock().ok().and_then(|state| state.port())
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn state_try_port(&self, port: u16, attempt: usize) -> bool {
        self.state.lock().map(|mut state| state.try_port(port, attempt)).unwrap_or(false)
    }

    pub(crate) fn state_mark_ready(&self, port: u16) -> bool {
        self.state.lock().map(|mut state| state.mark_ready(port)).unwrap_or(false)
    }

    pub(crate) fn state_mark_failed(&self, attempt: usize) -> bool {
        self.state.lock().map(|mut state| state.mark_failed(attempt)).unwrap_or(false)
    }

    pub(crate) fn state_exhaust(&self) -> bool {
        self.state.lock().map(|mut state| state.exhaust()).unwrap_or(false)
    }

    /// Registers a freshly accepted connection and schedules the one-time
    /// status unicast once the transport has settled.
    pub fn register_connection(self: Arc<Self>, id: ConnectionId, sender: mpsc::Sender<String>) {
        self.registry.add(id, sender);
        log::info!("[WS] New connection: {} ({} active)", id, self.registry.len());
        self.osd.show("Web Remote: Device connected");
        self.schedule_status_push(id);
    }

    /// Removes a connection that closed or failed. Safe to call twice; the
    /// notice is only shown when the entry was still present.
    pub fn close_connection(&self, id: ConnectionId) {
        if self.registry.remove(id) {
            log::info!("[WS] Connection {} disconnected ({} active)", id, self.registry.len());
            self.osd.show("Web Remote: Device disconnected");
        }
    }

    /// Queues one text frame to one connection. A connection whose queue is
    /// gone or full is dropped from the registry on the spot.
    pub fn send_text(&self, id: ConnectionId, text: String) -> bool {
        let sender = match self.registry.sender(id) {
            Some(sender) => sender,
            None => {
                log::debug!("[WS] No such connection: {}", id);
                return false;
            }
        };

        match sender.try_send(text) {
            Ok(()) => true,
            Err(e) => {
                log::info!("[WS] Dropping connection {}: {}", id, describe_send_error(&e));
                self.registry.remove(id);
                false
            }
        }
    }

    /// Builds and sends a fresh status snapshot to one connection.
    pub fn unicast_status(&self, id: ConnectionId) {
        let snapshot = build_status(self.player.as_ref());
        match status_frame(&snapshot) {
            Ok(text) => {
                self.send_text(id, text);
            }
            Err(e) => log::warn!("[WS] Failed to serialize status: {}", e),
        }
    }

    /// Fires a delayed status unicast; used after connect and after each
    /// command so the client sees the result of its own action.
    pub fn schedule_status_push(self: Arc<Self>, id: ConnectionId) {
        let delay = self.config.status_push_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            self.unicast_status(id);
        });
    }

    /// Sends the current status to every registered connection, at most
    /// once per throttle interval. A call inside the cooldown window is
    /// dropped, not deferred.
    pub fn broadcast_status(&self) {
        {
            let mut last = match self.last_broadcast.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            if let Some(previous) = *last {
                if previous.elapsed() < self.config.broadcast_throttle {
                    return;
                }
            }
            *last = Some(Instant::now());
        }

        if self.registry.is_empty() {
            return;
        }

        let snapshot = build_status(self.player.as_ref());
        let text = match status_frame(&snapshot) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("[WS] Failed to serialize status broadcast: {}", e);
                return;
            }
        };

        for (id, sender) in self.registry.senders() {
            if let Err(e) = sender.try_send(text.clone()) {
                log::info!(
                    "[WS] Dropping connection {} during broadcast: {}",
                    id,
                    describe_send_error(&e)
                );
                self.registry.remove(id);
            }
        }
    }

    /// Drains player-state events into throttled broadcasts. Runs until
    /// the event channel closes.
    pub async fn pump_player_events(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<PlayerEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                PlayerEvent::FileLoaded => {
                    let snapshot = build_status(self.player.as_ref());
                    self.osd.show(&format!("Now playing: {}", snapshot.title));
                    log::info!("[Broadcast] File loaded: {}", snapshot.title);
                }
                PlayerEvent::TimePos => {}
                other => log::debug!("[Broadcast] Player event: {:?}", other),
            }
            self.broadcast_status();
        }
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            port: self.bound_port().unwrap_or(0),
            network_ip: self.resolved_ip.lock().ok().and_then(|ip| ip.clone()),
            client_count: self.registry.len(),
        }
    }

    pub(crate) fn set_resolved_ip(&self, ip: String) {
        if let Ok(mut resolved) = self.resolved_ip.lock() {
            *resolved = Some(ip);
        }
    }

    /// Pushes current connection info to the host sink, if one is wired.
    pub fn push_connection_info(&self) {
        if let Some(sink) = &self.info_sink {
            sink.push(&self.connection_info());
        }
    }
}

fn describe_send_error(error: &TrySendError<String>) -> &'static str {
    match error {
        TrySendError::Full(_) => "outbound queue full",
        TrySendError::Closed(_) => "connection not found",
    }
}
