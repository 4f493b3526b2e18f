use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("WebSocket send error: {0}")]
    WebSocketSend(String),

    #[error("no available ports (tried {0:?})")]
    PortsExhausted(Vec<u16>),

    #[error("player error: {0}")]
    Player(String),

    #[error("RemoteError: {0}")]
    Custom(String),
}

impl<T> From<SendError<T>> for RemoteError {
    fn from(error: SendError<T>) -> Self {
        RemoteError::WebSocketSend(error.to_string())
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(error: std::io::Error) -> Self {
        RemoteError::Io(Box::new(error))
    }
}

impl From<tungstenite::Error> for RemoteError {
    fn from(error: tungstenite::Error) -> Self {
        RemoteError::WebSocket(Box::new(error))
    }
}
