//! Parsing of raw IPv4/UDP datagrams read from a raw socket
//!
//! Everything here works on untrusted bytes: every offset is checked
//! against the received length before it is used.

use pnet::packet::{ipv4::Ipv4Packet, udp::UdpPacket};
use std::net::Ipv4Addr;
use thiserror::Error;

/// Size of an IPv4 header without options
pub const MIN_IP_HEADER_SIZE: usize = Ipv4Packet::minimum_packet_size();

/// Size of a UDP header
pub const UDP_HEADER_SIZE: usize = UdpPacket::minimum_packet_size();

/// Reasons a raw read does not yield a packet of interest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// The read returned no bytes
    #[error("no data received")]
    Empty,

    /// Not even an IP header fits into what was received
    #[error(
        "received packet size {received} is smaller than the minimal IP header size ({min})",
        min = MIN_IP_HEADER_SIZE
    )]
    ShortIpHeader {
        /// Bytes received
        received: usize,
    },

    /// Traffic for another group, expected on a raw socket
    #[error("packet destined for {destination}")]
    ForeignGroup {
        /// Destination found in the IP header
        destination: Ipv4Addr,
    },

    /// The IP header length field is below the IPv4 minimum
    #[error("invalid IP header length {header_len}")]
    BadIpHeaderLength {
        /// Header length in bytes
        header_len: usize,
    },

    /// The UDP header does not fit behind the IP header
    #[error(
        "UDP payload offset {offset} is outside of the received packet size {received} (IP header len = {header_len})"
    )]
    PayloadOffsetOutOfRange {
        /// Computed payload offset
        offset: usize,
        /// Bytes received
        received: usize,
        /// IP header length in bytes
        header_len: usize,
    },

    /// The UDP length field is smaller than the UDP header
    #[error("invalid UDP length {declared} from {sender}:{sport}")]
    BadUdpLength {
        /// Declared UDP length
        declared: u16,
        /// Sender address
        sender: Ipv4Addr,
        /// Sender port
        sport: u16,
    },
}

impl Anomaly {
    /// True for anomalies that are only noise and need no warning
    pub fn is_expected(&self) -> bool {
        matches!(self, Anomaly::ForeignGroup { .. })
    }
}

/// Disagreement between the UDP length field and the bytes received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMismatch {
    /// Fewer payload bytes arrived than declared, the payload was clamped
    Truncated {
        /// Payload bytes received
        received: usize,
        /// Payload bytes declared
        declared: usize,
    },
    /// Bytes trailing the declared payload were ignored
    Extraneous {
        /// Payload bytes received
        received: usize,
        /// Payload bytes declared
        declared: usize,
    },
}

/// Fields extracted from a datagram addressed to the configured group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Sender address
    pub source: Ipv4Addr,
    /// TTL from the IP header
    pub ttl: u8,
    /// Sender port
    pub sport: u16,
    /// Destination port
    pub dport: u16,
    /// Offset of the UDP payload in the buffer
    pub payload_offset: usize,
    /// Number of payload bytes to accept
    pub payload_len: usize,
    /// Set when the UDP length disagreed with the received size
    pub mismatch: Option<LengthMismatch>,
}

impl Datagram {
    /// Range of the accepted payload within the parsed buffer
    pub fn payload_range(&self) -> std::ops::Range<usize> {
        self.payload_offset..self.payload_offset + self.payload_len
    }
}

/// Parses a raw IPv4 datagram carrying UDP and filters it by destination
///
/// # Errors
///
/// Returns an [`Anomaly`] when the bytes are malformed or the datagram is
/// destined for a group other than `group`.
pub fn parse(buf: &[u8], group: Ipv4Addr) -> Result<Datagram, Anomaly> {
    let received = buf.len();

    if received == 0 {
        return Err(Anomaly::Empty);
    }

    let Some(ip) = Ipv4Packet::new(buf) else {
        return Err(Anomaly::ShortIpHeader { received });
    };

    let destination = ip.get_destination();
    if destination != group {
        return Err(Anomaly::ForeignGroup { destination });
    }

    let header_len = usize::from(ip.get_header_length()) << 2;
    if header_len < MIN_IP_HEADER_SIZE {
        return Err(Anomaly::BadIpHeaderLength { header_len });
    }

    let offset = header_len + UDP_HEADER_SIZE;
    if offset > received {
        return Err(Anomaly::PayloadOffsetOutOfRange {
            offset,
            received,
            header_len,
        });
    }

    let Some(udp) = UdpPacket::new(&buf[header_len..]) else {
        return Err(Anomaly::PayloadOffsetOutOfRange {
            offset,
            received,
            header_len,
        });
    };

    let source = ip.get_source();
    let sport = udp.get_source();
    let declared_len = udp.get_length();

    let Some(declared) =
        usize::from(declared_len).checked_sub(UDP_HEADER_SIZE)
    else {
        return Err(Anomaly::BadUdpLength {
            declared: declared_len,
            sender: source,
            sport,
        });
    };

    let available = received - offset;

    let (payload_len, mismatch) = if declared > available {
        (
            available,
            Some(LengthMismatch::Truncated {
                received: available,
                declared,
            }),
        )
    } else if declared < available {
        (
            declared,
            Some(LengthMismatch::Extraneous {
                received: available,
                declared,
            }),
        )
    } else {
        (declared, None)
    };

    Ok(Datagram {
        source,
        ttl: ip.get_ttl(),
        sport,
        dport: udp.get_destination(),
        payload_offset: offset,
        payload_len,
        mismatch,
    })
}

#[cfg(test)]
#[path = "./datagram_tests.rs"]
pub(crate) mod tests;
