//! A concrete ring member: a gateway reachable at `host:port`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, bail};
use carousel_ring::Member;
use serde::{Deserialize, Serialize};

/// A gateway endpoint. Its ring identity is the full `id:host:port` string,
/// so two gateways with the same id on different addresses are distinct
/// members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayMember {
    /// Logical name of the gateway (e.g. `gateway-1`).
    pub id: String,
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl GatewayMember {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
        }
    }

    /// The network address, `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for GatewayMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.host, self.port)
    }
}

impl Member for GatewayMember {
    fn name(&self) -> String {
        self.to_string()
    }
}

impl FromStr for GatewayMember {
    type Err = anyhow::Error;

    /// Parse `id:host:port`, e.g. `gateway-1:192.168.1.1:8080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(id), Some(host), Some(port)) = (parts.next(), parts.next(), parts.next()) else {
            bail!("expected id:host:port, got {s:?}");
        };
        if parts.next().is_some() {
            bail!("expected id:host:port, got {s:?}");
        }
        if id.is_empty() || host.is_empty() {
            bail!("member id and host must be non-empty in {s:?}");
        }
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid port in {s:?}"))?;
        Ok(Self::new(id, host, port))
    }
}
