use std::sync::Arc;

use tokio::net::TcpListener;

use super::{
    connection,
    session::ServerSession,
};
use crate::{
    core::errors::RemoteError,
    identify,
};

/// Brings the listener up on the first available candidate port, then
/// accepts connections until the task is dropped. Only bootstrap
/// exhaustion is returned as an error.
pub async fn run(session: Arc<ServerSession>) -> Result<(), RemoteError> {
    let listener = bind_with_fallback(&session).await?;
    accept_loop(session, listener).await;
    Ok(())
}

/// Walks the candidate port list in order, waiting the configured backoff
/// between attempts. The first successful bind wins and is final for the
/// life of the session.
pub(crate) async fn bind_with_fallback(
    session: &Arc<ServerSession>,
) -> Result<TcpListener, RemoteError> {
    let ports = session.config().ports.clone();
    let host = session.config().host.clone();
    let mut attempted = Vec::new();

    for (attempt, port) in ports.iter().copied().enumerate() {
        if !session.state_try_port(port, attempt) {
            break;
        }
        attempted.push(port);
        log::info!("[Server] Trying to start server on port {}...", port);

        match TcpListener::bind((host.as_str(), port)).await {
            Ok(listener) => {
                if session.state_mark_ready(port) {
                    log::info!("[Server] Server ready on port {}", port);
                    session.osd().show(&format!("Web Remote: Server ready on port {}", port));
                    session.push_connection_info();
                    spawn_address_resolution(Arc::clone(session));
                    return Ok(listener);
                }
                // The state left Trying behind our back; stand down.
                break;
            }
            Err(e) => {
                log::warn!("[Server] Failed to bind port {}: {}", port, e);
                session.state_mark_failed(attempt);
                if attempt + 1 < ports.len() {
                    session
                        .osd()
                        .show(&format!("Web Remote: Port {} unavailable, trying next...", port));
                    tokio::time::sleep(session.config().port_retry_delay).await;
                }
            }
        }
    }

    session.state_exhaust();
    let listing = attempted.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
    log::error!("[Server] No available ports (tried {})", listing);
    session.osd().show(&format!("Web Remote: Server failed (tried ports {})", listing));
    Err(RemoteError::PortsExhausted(attempted))
}

async fn accept_loop(session: Arc<ServerSession>, listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                log::info!("[Server] New connection from: {}", addr);
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    if let Err(e) = connection::handle_connection(session, stream, addr).await {
                        log::warn!("[Server] Error handling connection from {}: {}", addr, e);
                    }
                });
            }
            Err(e) => log::warn!("[Server] Failed to accept connection: {}", e),
        }
    }
}

/// Resolves the local network address for display purposes. Best-effort;
/// the server is already up when this runs.
fn spawn_address_resolution(session: Arc<ServerSession>) {
    tokio::spawn(async move {
        match identify::local_network_ip().await {
            Some(ip) => {
                log::info!("[Server] Local network address: {}", ip);
                session.set_resolved_ip(ip);
                session.push_connection_info();
            }
            None => log::warn!("[Server] Failed to resolve local network address"),
        }
    });
}
