use serde::Serialize;
use uuid::Uuid;

use crate::{
    identify::ServerInfo,
    status::StatusSnapshot,
};

pub type ConnectionId = Uuid;

/// Outbound queue depth per connection; a client that falls this far
/// behind is treated as gone.
pub const OUTBOUND_QUEUE_SIZE: usize = 32;

/// Startup state of the listening socket. Moves forward only, except
/// Trying advances through the candidate list; Ready and Exhausted are
/// terminal until an explicit restart.
#[derive(Clone, Debug, PartialEq)]
pub enum BootstrapState {
    Idle,
    Trying { port: u16, attempt: usize },
    Ready { port: u16 },
    Exhausted,
}

impl BootstrapState {
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapState::Ready { .. })
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            BootstrapState::Ready { port } => Some(*port),
            _ => None,
        }
    }

    /// Records the start of a bind attempt. Refused once Ready or
    /// Exhausted.
    pub fn try_port(&mut self, port: u16, attempt: usize) -> bool {
        match self {
            BootstrapState::Idle | BootstrapState::Trying { .. } => {
                *self = BootstrapState::Trying { port, attempt };
                true
            }
            _ => false,
        }
    }

    /// Marks the current attempt successful. Success reported after the
    /// state already left Trying is ignored.
    pub fn mark_ready(&mut self, port: u16) -> bool {
        match self {
            BootstrapState::Trying { .. } => {
                *self = BootstrapState::Ready { port };
                true
            }
            _ => false,
        }
    }

    /// Records a failure for `attempt`. A stale failure signal arriving
    /// after the server came up must not tear the state down.
    pub fn mark_failed(&mut self, attempt: usize) -> bool {
        match self {
            BootstrapState::Trying { attempt: current, .. } => *current == attempt,
            _ => false,
        }
    }

    /// Gives up after the candidate list ran out.
    pub fn exhaust(&mut self) -> bool {
        match self {
            BootstrapState::Idle | BootstrapState::Trying { .. } => {
                *self = BootstrapState::Exhausted;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a StatusSnapshot,
}

#[derive(Debug, Serialize)]
struct ServerInfoFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a ServerInfo,
}

pub fn status_frame(snapshot: &StatusSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StatusFrame { kind: "status", data: snapshot })
}

pub fn server_info_frame(info: &ServerInfo) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ServerInfoFrame { kind: "server-info", data: info })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_happy_path() {
        let mut state = BootstrapState::Idle;

        assert!(state.try_port(10010, 0));
        assert!(state.mark_failed(0));
        assert!(state.try_port(10011, 1));
        assert!(state.mark_ready(10011));
        assert_eq!(state, BootstrapState::Ready { port: 10011 });
        assert_eq!(state.port(), Some(10011));
    }

    #[test]
    fn test_stale_failure_after_ready_is_ignored() {
        let mut state = BootstrapState::Idle;
        state.try_port(10010, 0);
        state.mark_ready(10010);

        assert!(!state.mark_failed(0));
        assert!(state.is_ready());
        assert!(!state.try_port(10011, 1));
        assert!(!state.exhaust());
        assert_eq!(state, BootstrapState::Ready { port: 10010 });
    }

    #[test]
    fn test_stale_failure_for_old_attempt_is_ignored() {
        let mut state = BootstrapState::Idle;
        state.try_port(10010, 0);
        state.try_port(10011, 1);

        assert!(!state.mark_failed(0));
        assert!(state.mark_failed(1));
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let mut state = BootstrapState::Idle;
        state.try_port(10010, 0);
        assert!(state.exhaust());

        assert!(!state.try_port(10011, 1));
        assert!(!state.mark_ready(10011));
        assert_eq!(state, BootstrapState::Exhausted);
    }

    #[test]
    fn test_status_frame_shape() {
        let snapshot = StatusSnapshot::fallback();
        let text = status_frame(&snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "status");
        assert_eq!(value["data"]["hasMedia"], false);
    }

    #[test]
    fn test_server_info_frame_shape() {
        let info = ServerInfo::compose("mpv", None, None, 10010);
        let text = server_info_frame(&info).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "server-info");
        assert_eq!(value["data"]["port"], 10010);
    }
}
