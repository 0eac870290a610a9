pub mod catalog;
pub mod error;
pub mod manager;
pub mod observability;
pub mod room;

pub use catalog::PollCatalog;
pub use error::CoreError;
pub use manager::{Outcome, PollStateManager, Rejection};
pub use room::{Membership, Room, RoomRegistry, DEFAULT_ROOM_IDLE_TTL};

use observability::GatewayMetrics;
use std::sync::Arc;

/// Gateway settings resolved from the config file and CLI.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// The public URL of this server (e.g., https://polls.example.com).
    /// Allowed as a websocket origin.
    pub public_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub max_message_size: usize,
    pub commands_per_second: u32,
    pub command_burst: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_url: None,
            allowed_origins: Vec::new(),
            max_message_size: 32 * 1024,
            commands_per_second: 20,
            command_burst: 40,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomRegistry>,
    pub config: AppConfig,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(rooms: RoomRegistry, config: AppConfig) -> Self {
        Self {
            rooms: Arc::new(rooms),
            config,
            metrics: Arc::new(GatewayMetrics::new()),
        }
    }
}
