//! Runtime configuration (§10 "Ambient stack — configuration").
//!
//! Two small plain structs rather than one monolithic config type, since the
//! bus gateway and the command server are wired up independently and have
//! no fields in common.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// Where to dial the serial-to-TCP bridge that carries the physical bus.
#[derive(Debug, Clone, Parser)]
pub struct GatewayConfig {
    /// Address of the serial bridge (e.g. ser2net) that carries bus telegrams.
    #[arg(long, env = "EMSBUS_BRIDGE_ADDR")]
    pub bridge_addr: SocketAddr,
}

/// Where the command server listens, and how long it waits for a bus reply
/// before giving up on an in-flight command (§4.F, default resolved in the
/// design doc's open-questions section: 2 seconds).
#[derive(Debug, Clone, Parser)]
pub struct CommandServerConfig {
    /// Address the command server binds and listens on.
    #[arg(long, env = "EMSBUS_LISTEN_ADDR", default_value = "0.0.0.0:9092")]
    pub listen_addr: SocketAddr,

    /// Seconds to wait for a bus reply before a query command fails with
    /// `ERR:TIMEOUT`.
    #[arg(long, env = "EMSBUS_REPLY_TIMEOUT_SECS", default_value_t = 2)]
    pub reply_timeout_secs: u64,
}

impl CommandServerConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Collector and control gateway for an EMS-style residential heating bus")]
pub struct Args {
    #[command(flatten)]
    pub gateway: GatewayConfig,
    #[command(flatten)]
    pub command_server: CommandServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reply_timeout_is_two_seconds() {
        let cfg = CommandServerConfig { listen_addr: "0.0.0.0:9092".parse().unwrap(), reply_timeout_secs: 2 };
        assert_eq!(cfg.reply_timeout(), Duration::from_secs(2));
    }
}
