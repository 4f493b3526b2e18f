pub mod connection;
pub mod server;
pub mod session;
pub mod types;

pub use session::{
    ConnectionRegistry,
    ServerSession,
};
pub use types::{
    BootstrapState,
    ConnectionId,
};
