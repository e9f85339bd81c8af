//! WebSocket chat hub.
//!
//! Provides the broadcast hub, heartbeat pings, and the HTTP upgrade
//! handler mounted on the WebSocket listener.

mod handler;
mod heartbeat;
pub mod hub;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use hub::ChatHub;
