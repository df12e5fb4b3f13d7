//! UDP reachability check
//!
//! Sends an empty datagram and waits for any reply. A silent port and a
//! refused one both count as unreachable; only local socket failures are
//! errors.

use colored::Colorize;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

pub const DEFAULT_PORT: u16 = 2456;
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
}

pub async fn handle(host: &str, port: u16, timeout_secs: u64) -> anyhow::Result<()> {
    let outcome = probe(host, port, Duration::from_secs(timeout_secs)).await?;
    match outcome {
        ProbeOutcome::Reachable => println!(
            "{}",
            format!("✓ UDP port {port} on {host} is reachable.").green()
        ),
        ProbeOutcome::Unreachable => println!(
            "{}",
            format!("✗ UDP port {port} on {host} is not reachable.").yellow()
        ),
    }
    Ok(())
}

pub async fn probe(host: &str, port: u16, timeout: Duration) -> io::Result<ProbeOutcome> {
    let target = tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no address for {host}")))?;

    let local: SocketAddr = if target.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    tracing::debug!("Probing {} from {}", target, socket.local_addr()?);

    socket.send(&[]).await?;

    let mut buf = [0u8; 1024];
    match tokio::time::timeout(timeout, socket.recv(&mut buf)).await {
        Ok(Ok(_)) => Ok(ProbeOutcome::Reachable),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
            tracing::debug!("Port refused: {}", e);
            Ok(ProbeOutcome::Unreachable)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(ProbeOutcome::Unreachable),
    }
}
