use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use mpv_remote::{
    core::config::RemoteConfig,
    identify,
    mpv::{
        default_mpv_endpoint,
        spawn_event_listener,
        MpvPlayer,
    },
    player::Osd,
    websocket::{
        server,
        ServerSession,
    },
};

#[derive(Parser, Debug)]
#[command(name = "mpv-remote", version, about = "WebSocket remote control server for mpv")]
struct Args {
    /// Candidate ports, tried in order until one binds
    #[arg(long, value_delimiter = ',')]
    ports: Option<Vec<u16>>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Path to the mpv JSON IPC socket
    #[arg(long, env = "MPV_REMOTE_SOCKET")]
    socket: Option<String>,

    /// Application name reported to clients
    #[arg(long, default_value = "mpv")]
    application: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = RemoteConfig::default();
    if let Some(ports) = args.ports {
        config.ports = ports;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    config.application = args.application;

    let endpoint = args.socket.unwrap_or_else(|| default_mpv_endpoint().to_string());
    let player = Arc::new(MpvPlayer::new(endpoint));
    if !player.is_reachable() {
        log::warn!(
            "[Main] mpv IPC socket {} is not reachable yet; will keep retrying",
            player.endpoint()
        );
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    spawn_event_listener(player.clone(), events_tx);

    let osd: Arc<dyn Osd> = player.clone();
    osd.show("Web Remote: Loaded");

    let session = ServerSession::new(config, player.clone(), osd, None);
    tokio::spawn(ServerSession::pump_player_events(session.clone(), events_rx));

    tokio::spawn(async {
        match identify::device_name().await {
            Some(name) => log::info!("[Main] Device name: {}", name),
            None => log::warn!("[Main] Failed to resolve device name"),
        }
    });

    tokio::select! {
        result = server::run(session.clone()) => {
            if let Err(e) = result {
                log::error!("[Main] Server did not start: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("[Main] Shutting down");
        }
    }
}
