use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "duet-server", about = "Signaling relay for two-party calls")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "DUET_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Empty rooms older than this are destroyed.
    #[arg(long, env = "DUET_ROOM_IDLE_TIMEOUT_SECS", default_value_t = 300)]
    pub room_idle_timeout_secs: u64,

    #[arg(long, env = "DUET_ROOM_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub room_sweep_interval_secs: u64,
}

impl ServerConfig {
    pub fn room_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.room_idle_timeout_secs)
    }

    pub fn room_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.room_sweep_interval_secs.max(1))
    }
}
