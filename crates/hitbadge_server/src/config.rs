//! Command-line and environment configuration.

use clap::Parser;
use hitbadge_core::{default_log_level, DEFAULT_POOL_SIZE};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Start the hit-counter badge server.
#[derive(Debug, Clone, Parser)]
#[command(name = "hitbadge", version)]
pub struct ServerArgs {
    /// The SQLite DB file to use
    #[arg(long, env = "HITBADGE_DB", value_name = "DB_FILE", default_value = "./gh-hits-badge.db")]
    pub db: PathBuf,

    /// The HTTP port to use
    #[arg(long, env = "HITBADGE_PORT", value_name = "NUMBER", default_value_t = 8080)]
    pub port: u16,

    /// Address to listen on
    #[arg(long, env = "HITBADGE_BIND", value_name = "ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "HITBADGE_LOG_LEVEL", value_name = "LEVEL", default_value = default_log_level())]
    pub log_level: String,

    /// Absolute directory for rotating log files; logs go to stderr when unset
    #[arg(long, env = "HITBADGE_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Number of pooled SQLite connections
    #[arg(long, env = "HITBADGE_POOL_SIZE", value_name = "N", default_value_t = DEFAULT_POOL_SIZE, value_parser = parse_pool_size)]
    pub pool_size: usize,
}

impl ServerArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_pool_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .trim()
        .parse()
        .map_err(|err| format!("`{value}` is not a valid pool size: {err}"))?;
    if size == 0 {
        return Err("pool size must be at least 1".to_string());
    }
    Ok(size)
}
