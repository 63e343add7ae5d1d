//! Dependency checks.
//!
//! # Responsibilities
//! - Define the seam every backing-service check plugs into
//! - Provide a TCP reachability probe built from a connection URL
//!
//! # Design Decisions
//! - A probe proves the port answers, nothing more; the service holds no
//!   database or cache client
//! - Time bounds are applied by the caller, not by each check

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpStream;
use url::{Host, Url};

/// Why a dependency check did not pass.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{name} unreachable at {target}: {source}")]
    Unreachable {
        name: String,
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} check timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("{name} has an invalid URL: {reason}")]
    InvalidUrl { name: String, reason: String },

    #[error("{name} check failed: {reason}")]
    Failed { name: String, reason: String },
}

/// Port for a connection URL, falling back to the scheme's well-known port.
///
/// `url` only knows defaults for web schemes; database and cache URLs such
/// as `postgres://app@db/app` routinely omit theirs.
pub fn connection_port(url: &Url) -> Option<u16> {
    url.port_or_known_default().or(match url.scheme() {
        "postgres" | "postgresql" => Some(5432),
        "mysql" => Some(3306),
        "redis" => Some(6379),
        "rediss" => Some(6380),
        _ => None,
    })
}

/// A single backing-service check.
#[async_trait]
pub trait DependencyCheck: Send + Sync + std::fmt::Debug {
    /// Name used in logs and error messages (e.g. "database").
    fn name(&self) -> &str;

    /// Run the check once.
    async fn check(&self) -> Result<(), CheckError>;
}

/// Checks that a TCP connection to the URL's host and port can be opened.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    name: String,
    host: String,
    port: u16,
}

impl TcpProbe {
    /// Build a probe from a connection URL such as `postgres://db:5432/app`.
    pub fn from_url(name: impl Into<String>, raw: &str) -> Result<Self, CheckError> {
        let name = name.into();
        let invalid = |reason: String| CheckError::InvalidUrl {
            name: name.clone(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(invalid("missing host".into())),
        };
        let port = connection_port(&url)
            .ok_or_else(|| invalid("missing port".into()))?;

        Ok(Self { name, host, port })
    }

    /// `host:port` this probe connects to.
    pub fn target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

#[async_trait]
impl DependencyCheck for TcpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<(), CheckError> {
        TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map(drop)
            .map_err(|source| CheckError::Unreachable {
                name: self.name.clone(),
                target: self.target(),
                source,
            })
    }
}
