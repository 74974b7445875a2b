//! Provides the reusable packet record and the wire formats malt understands

use std::net::Ipv4Addr;

pub mod beacon;
pub mod datagram;

/// Capacity of the payload buffer, large enough for any IPv4 datagram
pub const BUFFER_SIZE: usize = 67584;

/// Outcome of a successful read from the capture socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reception {
    /// The packet matched the configured filters and was stored in the record
    Accepted,
    /// The packet was dropped, the record payload was left untouched
    Filtered,
}

/// Metadata and payload of the packet most recently captured
///
/// A single record is owned by the receiver and overwritten on every
/// accepted packet. Slices returned by [`PacketRecord::payload`] are only
/// meaningful until the next packet is received; callers that need the bytes
/// beyond that must copy them.
#[derive(Debug)]
pub struct PacketRecord {
    /// Sender address
    pub source: Ipv4Addr,
    /// Sender UDP port
    pub sport: u16,
    /// Multicast group the packet was addressed to
    pub group: Ipv4Addr,
    /// Destination UDP port
    pub dport: u16,
    /// Received TTL, -1 when the kernel did not report it
    pub ttl: i16,
    /// Capture time in nanoseconds since the epoch
    pub timestamp: u64,
    payload: Box<[u8]>,
    payload_len: usize,
}

impl PacketRecord {
    /// Returns an empty record for packets addressed to `group`
    pub fn new(group: Ipv4Addr) -> Self {
        Self {
            source: Ipv4Addr::UNSPECIFIED,
            sport: 0,
            group,
            dport: 0,
            ttl: -1,
            timestamp: 0,
            payload: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            payload_len: 0,
        }
    }

    /// UDP payload of the current packet
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len]
    }

    /// Number of payload bytes in use
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Fixed capacity of the payload buffer
    pub fn capacity(&self) -> usize {
        self.payload.len()
    }

    /// Copies `bytes` into the payload buffer, truncating to its capacity
    pub fn set_payload(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(self.payload.len());
        self.payload[..len].copy_from_slice(&bytes[..len]);
        self.payload_len = len;
    }

    // Full buffer for strategies that let the kernel write in place
    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }

    pub(crate) fn set_payload_len(&mut self, len: usize) {
        self.payload_len = len.min(self.payload.len());
    }
}

#[cfg(test)]
#[path = "./packet_tests.rs"]
mod tests;
