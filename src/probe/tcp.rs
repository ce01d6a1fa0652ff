//! TCP readiness probe.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use super::Probe;
use crate::error::ProbeError;

/// Maximum number of banner bytes captured.
pub const BANNER_LIMIT: usize = 4096;

/// How long to wait for a banner after connecting. Services that wait for
/// the client to speak first (HTTP, databases) yield an empty banner.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(2);

/// Connects to a host and port and captures whatever the server sends first.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    host: String,
    port: u16,
    banner_timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            banner_timeout: BANNER_TIMEOUT,
        }
    }

    /// Overrides how long to wait for a banner.
    pub fn with_banner_timeout(mut self, banner_timeout: Duration) -> Self {
        self.banner_timeout = banner_timeout;
        self
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn connect_error(&self, source: std::io::Error) -> ProbeError {
        ProbeError::Connect {
            target: self.target(),
            source,
        }
    }
}

#[async_trait]
impl Probe for ReadinessProbe {
    async fn attempt(&self) -> Result<String, ProbeError> {
        // platform default connect timeout
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| self.connect_error(e))?;

        let mut buf = vec![0u8; BANNER_LIMIT];
        let read = match timeout(self.banner_timeout, stream.read(&mut buf)).await {
            Ok(read) => read.map_err(|e| self.connect_error(e))?,
            Err(_elapsed) => 0,
        };

        trace!(target = %self.target(), bytes = read, "Connected");
        Ok(String::from_utf8_lossy(&buf[..read]).into_owned())
    }
}
