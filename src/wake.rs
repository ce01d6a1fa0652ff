//! Wake-on-LAN broadcast.
//!
//! A magic packet is six `0xFF` bytes followed by the target hardware
//! address repeated sixteen times. It is sent over UDP to the broadcast
//! address; there is no acknowledgement.

use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::destination::parse_hardware_address;
use crate::error::{Result, WakeWaitError};

/// Size of a magic packet in bytes.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Sends wake requests for a batch of hardware addresses.
#[async_trait]
pub trait WakeSender: Send + Sync {
    /// Sends one broadcast carrying every target. Fails only if the local
    /// send fails.
    async fn send(&self, targets: &[String]) -> Result<()>;
}

/// Builds the magic packet for a hardware address.
pub fn magic_packet(address: &str) -> Result<[u8; MAGIC_PACKET_LEN]> {
    let octets =
        parse_hardware_address(address).ok_or_else(|| WakeWaitError::InvalidHardwareAddress {
            address: address.to_string(),
        })?;

    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    Ok(packet)
}

/// Sends magic packets over UDP broadcast.
#[derive(Debug, Clone)]
pub struct MagicPacketSender {
    destination: SocketAddr,
}

impl MagicPacketSender {
    /// Creates a sender targeting the given broadcast address.
    pub fn new(destination: SocketAddr) -> Self {
        Self { destination }
    }
}

impl Default for MagicPacketSender {
    fn default() -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::BROADCAST, 9)))
    }
}

#[async_trait]
impl WakeSender for MagicPacketSender {
    async fn send(&self, targets: &[String]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }

        // build everything first so a bad address sends nothing
        let packets = targets
            .iter()
            .map(|t| magic_packet(t))
            .collect::<Result<Vec<_>>>()?;

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| WakeWaitError::transport_with_source("Failed to bind UDP socket", e))?;
        socket
            .set_broadcast(true)
            .map_err(|e| WakeWaitError::transport_with_source("Failed to enable broadcast", e))?;

        for (target, packet) in targets.iter().zip(&packets) {
            socket
                .send_to(packet, self.destination)
                .await
                .map_err(|e| {
                    WakeWaitError::transport_with_source(
                        format!("Failed to send magic packet to {}", target),
                        e,
                    )
                })?;
            debug!(target = %target, destination = %self.destination, "Sent magic packet");
        }

        info!(count = targets.len(), destination = %self.destination, "Wake broadcast sent");
        Ok(())
    }
}
