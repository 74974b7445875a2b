use log::*;
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    io::{self, Read},
    net::Ipv4Addr,
};

use crate::{
    config::Config,
    error::{MaltError, Result},
    packet::{
        BUFFER_SIZE, PacketRecord, Reception,
        datagram::{self, LengthMismatch},
    },
};

use super::Acquisition;

/// Captures whole IPv4/UDP datagrams from a raw socket and filters them by
/// destination group in user space
pub struct RawAcquisition {
    scratch: Box<[u8]>,
}

impl RawAcquisition {
    /// Returns a strategy with its read buffer allocated
    pub fn new() -> Self {
        Self {
            scratch: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
        }
    }
}

impl Default for RawAcquisition {
    fn default() -> Self {
        Self::new()
    }
}

impl Acquisition for RawAcquisition {
    fn open_socket(&self) -> Result<Socket> {
        Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::UDP)).map_err(
            |e| match e.kind() {
                io::ErrorKind::PermissionDenied => MaltError::Capability(
                    format!("{e} (the CAP_NET_RAW capability is required)"),
                ),
                _ => MaltError::sys_call("failed to open raw socket", e),
            },
        )
    }

    fn configure_socket(&self, _socket: &Socket) -> Result<()> {
        Ok(())
    }

    fn receive_packet(
        &mut self,
        socket: &Socket,
        record: &mut PacketRecord,
        config: &Config,
        now: u64,
    ) -> Result<Reception> {
        let received = loop {
            match (&*socket).read(&mut self.scratch) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Reception::Filtered);
                }
                Err(e) => {
                    return Err(MaltError::sys_call(
                        "failed to read from raw socket",
                        e,
                    ));
                }
            }
        };

        Ok(accept(&self.scratch[..received], record, config.group(), now))
    }
}

// Copies the UDP payload of a raw datagram into the record if it is
// addressed to the group
fn accept(
    buf: &[u8],
    record: &mut PacketRecord,
    group: Ipv4Addr,
    now: u64,
) -> Reception {
    let datagram = match datagram::parse(buf, group) {
        Ok(datagram) => datagram,
        Err(anomaly) => {
            if !anomaly.is_expected() {
                warn!("{anomaly}");
            }
            return Reception::Filtered;
        }
    };

    match datagram.mismatch {
        Some(LengthMismatch::Truncated { received, declared }) => {
            warn!(
                "UDP payload from {}:{} is {received} bytes, {declared} declared",
                datagram.source, datagram.sport
            );
        }
        Some(LengthMismatch::Extraneous { received, declared }) => {
            warn!(
                "ignoring {} extraneous bytes from {}:{}",
                received - declared,
                datagram.source,
                datagram.sport
            );
        }
        None => {}
    }

    record.set_payload(&buf[datagram.payload_range()]);
    record.source = datagram.source;
    record.sport = datagram.sport;
    record.group = group;
    record.dport = datagram.dport;
    record.ttl = i16::from(datagram.ttl);
    record.timestamp = now;

    Reception::Accepted
}

#[cfg(test)]
#[path = "./raw_tests.rs"]
mod tests;
