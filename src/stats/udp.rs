//! statsd gauge transport over UDP.
//!
//! Wire format is one datagram per gauge: `<namespace>.<name>:<value>|g`.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use super::{SinkError, StatsSink};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8125;
pub const DEFAULT_NAMESPACE: &str = "opcache";

/// Connection parameters for [`UdpStatsSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConnectionParams {
    pub host: String,
    pub port: u16,
    /// Socket write timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    /// Keep one socket for the sink's lifetime instead of one per gauge.
    pub persistent: bool,
    /// Prefix for every gauge name. Empty means no prefix.
    pub namespace: String,
}

impl Default for SinkConnectionParams {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: None,
            persistent: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl SinkConnectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// `host:port` as written, for logs and errors.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sends gauges to a statsd daemon.
#[derive(Debug)]
pub struct UdpStatsSink {
    target: SocketAddr,
    namespace: String,
    timeout: Option<Duration>,
    socket: Option<UdpSocket>,
}

impl UdpStatsSink {
    /// Resolve the daemon address and open a socket.
    ///
    /// Fails eagerly on unresolvable hosts or unusable sockets. In
    /// non-persistent mode the probe socket is dropped straight away.
    pub fn connect(params: &SinkConnectionParams) -> Result<Self, SinkError> {
        let target = (params.host.as_str(), params.port)
            .to_socket_addrs()
            .map_err(|e| SinkError::Resolve {
                addr: params.address(),
                source: e,
            })?
            .next()
            .ok_or_else(|| SinkError::NoAddress(params.address()))?;

        let timeout = params.timeout.filter(|t| !t.is_zero());
        let probe = open_socket(target, timeout)?;
        let socket = params.persistent.then_some(probe);

        tracing::debug!(
            target_addr = %target,
            namespace = %params.namespace,
            persistent = params.persistent,
            "statsd sink ready"
        );

        Ok(Self {
            target,
            namespace: params.namespace.clone(),
            timeout,
            socket,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_persistent(&self) -> bool {
        self.socket.is_some()
    }
}

fn open_socket(target: SocketAddr, timeout: Option<Duration>) -> Result<UdpSocket, SinkError> {
    let local: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local)?;
    socket.set_write_timeout(timeout)?;
    socket.connect(target)?;
    Ok(socket)
}

/// Render one statsd gauge line.
pub(crate) fn format_gauge(namespace: &str, name: &str, value: f64) -> String {
    if namespace.is_empty() {
        format!("{name}:{value}|g")
    } else {
        format!("{namespace}.{name}:{value}|g")
    }
}

impl StatsSink for UdpStatsSink {
    fn gauge(&self, name: &str, value: f64) -> Result<(), SinkError> {
        if !value.is_finite() {
            return Err(SinkError::InvalidValue {
                name: name.to_string(),
                value,
            });
        }

        let line = format_gauge(&self.namespace, name, value);
        let sent = match &self.socket {
            Some(socket) => socket.send(line.as_bytes()),
            None => open_socket(self.target, self.timeout)?.send(line.as_bytes()),
        };
        match sent {
            Ok(_) => {
                tracing::trace!(line = %line, "gauge sent");
                Ok(())
            }
            // A connected socket reports an earlier ICMP port-unreachable on
            // a later send. The datagram is lost either way.
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                tracing::debug!(
                    line = %line,
                    target_addr = %self.target,
                    "statsd unreachable, gauge dropped"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
