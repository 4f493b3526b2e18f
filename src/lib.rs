pub mod command;
pub mod core;
pub mod identify;
pub mod mpv;
pub mod player;
pub mod status;
pub mod websocket;

pub use crate::{
    command::Command,
    core::{
        config::RemoteConfig,
        errors::RemoteError,
    },
    identify::ServerInfo,
    status::StatusSnapshot,
    websocket::{
        server,
        ServerSession,
    },
};
