//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for a relay server instance.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,
    /// Root directory for static assets.
    pub static_dir: PathBuf,
    /// File served when an asset path resolves to a directory.
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 6378)),
            static_dir: PathBuf::from("static"),
            index_file: "index.html".to_owned(),
        }
    }
}
