//! Server configuration from command-line flags and environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Default upload body limit: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Upload an image, get back its edge map and contour overlay.
///
/// Host, port, and debug mode can also be set through the environment
/// variables shown in the help text. Log verbosity follows `RUST_LOG`
/// when set.
#[derive(Debug, Clone, Parser)]
#[command(name = "outline-server", version)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "OUTLINE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "OUTLINE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Include error source chains in 500 responses and log at debug level.
    #[arg(long, env = "OUTLINE_DEBUG")]
    pub debug: bool,

    /// Largest accepted request body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Log directive used when `RUST_LOG` is unset.
    #[must_use]
    pub const fn default_log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Log filter: `RUST_LOG` if set and valid, else [`Self::default_log_level`].
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_log_level()))
    }
}
