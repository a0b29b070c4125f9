//! Listener setup and shutdown wiring for `photogate serve`.

use anyhow::{Context, Result};
use listenfd::ListenFd;
use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use photogate_core::gateway::readiness::ReadinessTracker;
use photogate_types::models::GatewayConfig;

const LISTEN_BACKLOG: i32 = 1024;

/// Loopback unless LAN access is enabled.
pub fn listen_addr(config: &GatewayConfig) -> Result<SocketAddr> {
    let host = config.get_bind_address();
    let ip: IpAddr = host.parse().with_context(|| format!("Invalid bind address '{host}'"))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Socket handed over by the service manager, or a freshly bound one.
pub fn open_listener(config: &GatewayConfig) -> Result<TcpListener> {
    let listener = match ListenFd::from_env().take_tcp_listener(0)? {
        Some(inherited) => {
            info!("🔌 Serving on inherited socket {}", inherited.local_addr()?);
            inherited
        },
        None => {
            let addr = listen_addr(config)?;
            let bound = reusable_listener(addr).with_context(|| format!("Failed to bind {addr}"))?;
            info!("🔌 Bound {} (SO_REUSEPORT)", addr);
            bound
        },
    };
    listener.set_nonblocking(true)?;
    Ok(TcpListener::from_std(listener)?)
}

/// A replacement process can bind the same port before this one exits.
fn reusable_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "Ctrl+C"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("⚠️ Ctrl+C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminated() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        },
        Err(e) => {
            warn!("⚠️ SIGTERM handler unavailable: {}", e);
            std::future::pending::<()>().await;
        },
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}

/// Resolves on the first stop signal after stopping the readiness refresher.
pub async fn shutdown_signal(readiness: Arc<ReadinessTracker>) {
    let received = tokio::select! {
        () = interrupted() => StopSignal::Interrupt,
        () = terminated() => StopSignal::Terminate,
    };
    info!("🛑 {} received, draining in-flight requests", received);
    readiness.shutdown();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr_follows_lan_flag() {
        let local = GatewayConfig { port: 8080, ..GatewayConfig::default() };
        assert_eq!(listen_addr(&local).unwrap(), "127.0.0.1:8080".parse().unwrap());

        let lan = GatewayConfig { allow_lan_access: true, port: 8080, ..GatewayConfig::default() };
        assert_eq!(listen_addr(&lan).unwrap(), "0.0.0.0:8080".parse().unwrap());
    }

    #[tokio::test]
    async fn test_open_listener_on_ephemeral_port() {
        let config = GatewayConfig { port: 0, ..GatewayConfig::default() };
        let listener = open_listener(&config).unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_port_can_be_shared_during_handover() {
        let first = reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();
        let second = reusable_listener(addr).unwrap();
        assert_eq!(second.local_addr().unwrap(), addr);
    }

    #[test]
    fn test_stop_signal_names() {
        assert_eq!(StopSignal::Interrupt.to_string(), "Ctrl+C");
        assert_eq!(StopSignal::Terminate.to_string(), "SIGTERM");
    }
}
