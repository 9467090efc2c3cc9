use core::fmt;
use rand::{Rng, rng};
use std::net::UdpSocket;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variables published by the container runtime. When both are
/// present the process is treated as containerized and the pair becomes its
/// network identity.
pub const CONTAINER_HOST_ENV: &str = "RINGUID_CONTAINER_HOST";
pub const CONTAINER_PORT_ENV: &str = "RINGUID_CONTAINER_PORT";

/// How the process is hosted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A plain host or VM process.
    Actual,
    /// A containerized process with runtime-provided host/port metadata.
    Container,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actual => f.write_str("ACTUAL"),
            Self::Container => f.write_str("CONTAINER"),
        }
    }
}

/// The identity record for one process instance.
///
/// Built once at startup, handed to the worker slot store to be persisted
/// and assigned a numeric worker id, and never mutated afterwards. Retention
/// of persisted records is the store's concern.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerNode {
    host: String,
    port: String,
    kind: NodeKind,
    /// Launch instant, milliseconds since 1970-01-01 UTC.
    launched_at_ms: u64,
}

impl WorkerNode {
    /// Builds the identity record for the current process.
    ///
    /// Containerized environments (detected via [`CONTAINER_HOST_ENV`] /
    /// [`CONTAINER_PORT_ENV`]) use the runtime-provided address. Everything
    /// else gets the local network address plus a `timestamp-random`
    /// synthetic port, which keeps the identity token distinct when several
    /// processes share one host.
    pub fn build() -> Self {
        let launched_at_ms = unix_millis();
        match (
            std::env::var(CONTAINER_HOST_ENV),
            std::env::var(CONTAINER_PORT_ENV),
        ) {
            (Ok(host), Ok(port)) if !host.is_empty() && !port.is_empty() => {
                tracing::debug!(%host, %port, "container runtime metadata detected");
                Self {
                    host,
                    port,
                    kind: NodeKind::Container,
                    launched_at_ms,
                }
            }
            _ => Self {
                host: local_address(),
                port: format!("{}-{}", launched_at_ms, rng().random_range(0..100_000_u32)),
                kind: NodeKind::Actual,
                launched_at_ms,
            },
        }
    }

    /// Builds a record from explicit parts. Intended for stores and tests
    /// that need deterministic identities.
    pub fn from_parts(
        host: impl Into<String>,
        port: impl Into<String>,
        kind: NodeKind,
        launched_at_ms: u64,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            kind,
            launched_at_ms,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn launched_at_ms(&self) -> u64 {
        self.launched_at_ms
    }

    /// The token that keys this node in the worker identity cache, derived
    /// from the port component of the identity.
    ///
    /// Two processes that report the same port token are indistinguishable to
    /// the cache; reuse then hands both the same worker id. The synthetic
    /// `timestamp-random` port keeps that probability low for `Actual` nodes,
    /// but container runtimes that recycle a fixed port share the fate of
    /// their token.
    pub fn identity_token(&self) -> String {
        self.port.replace(['/', '\\', ':'], "_")
    }
}

impl fmt::Display for WorkerNode {
    // Explicit field-by-field formatting; the diagnostic shape must not
    // depend on the struct definition order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkerNode{{host={}, port={}, kind={}, launchedAtMs={}}}",
            self.host, self.port, self.kind, self.launched_at_ms
        )
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System clock before UNIX_EPOCH")
        .as_millis() as u64
}

/// Best-effort local address discovery.
///
/// A connected UDP socket reveals the address the OS would route external
/// traffic through; no packet is sent. Falls back to loopback on hosts
/// without a route.
fn local_address() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("10.255.255.255:1")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}
