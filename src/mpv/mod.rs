pub mod events;
pub mod player;
pub mod types;

pub use events::spawn_event_listener;
pub use player::MpvPlayer;
pub use types::default_mpv_endpoint;
