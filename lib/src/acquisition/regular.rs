use nix::{
    cmsg_space,
    errno::Errno,
    libc,
    sys::socket::{
        ControlMessageOwned, MsgFlags, SockaddrIn, recvmsg, setsockopt,
        sockopt,
    },
};
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    io::IoSliceMut,
    net::SocketAddrV4,
    os::fd::AsRawFd,
};

use crate::{
    config::Config,
    error::{MaltError, Result},
    packet::{PacketRecord, Reception},
};

use super::Acquisition;

/// Receives UDP payloads on the configured port through the kernel's UDP
/// stack, retrieving the TTL as ancillary data
pub struct RegularAcquisition {
    cmsg: Vec<u8>,
}

impl RegularAcquisition {
    /// Returns a strategy with its ancillary data buffer allocated
    pub fn new() -> Self {
        Self {
            cmsg: cmsg_space!(libc::c_int),
        }
    }
}

impl Default for RegularAcquisition {
    fn default() -> Self {
        Self::new()
    }
}

impl Acquisition for RegularAcquisition {
    fn open_socket(&self) -> Result<Socket> {
        Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| MaltError::sys_call("failed to open UDP socket", e))
    }

    fn configure_socket(&self, socket: &Socket) -> Result<()> {
        setsockopt(socket, sockopt::Ipv4RecvTtl, &true).map_err(|e| {
            MaltError::from_errno("failed to enable IP_RECVTTL", e)
        })
    }

    fn receive_packet(
        &mut self,
        socket: &Socket,
        record: &mut PacketRecord,
        config: &Config,
        now: u64,
    ) -> Result<Reception> {
        let fd = socket.as_raw_fd();

        let (len, sender, ttl) = loop {
            let mut iov = [IoSliceMut::new(record.buffer_mut())];

            let msg = match recvmsg::<SockaddrIn>(
                fd,
                &mut iov,
                Some(&mut self.cmsg),
                MsgFlags::empty(),
            ) {
                Ok(msg) => msg,
                Err(Errno::EINTR) => continue,
                Err(Errno::EAGAIN) => return Ok(Reception::Filtered),
                Err(e) => {
                    return Err(MaltError::from_errno("recvmsg failed", e));
                }
            };

            let mut ttl = -1;

            if let Ok(cmsgs) = msg.cmsgs() {
                for cmsg in cmsgs {
                    if let ControlMessageOwned::Ipv4Ttl(value) = cmsg {
                        ttl = i16::try_from(value).unwrap_or(-1);
                    }
                }
            }

            break (msg.bytes, msg.address, ttl);
        };

        record.set_payload_len(len);

        if let Some(sender) = sender.map(SocketAddrV4::from) {
            record.source = *sender.ip();
            record.sport = sender.port();
        }

        record.group = config.group();
        record.dport = config.dport();
        record.ttl = ttl;
        record.timestamp = now;

        Ok(Reception::Accepted)
    }
}

#[cfg(test)]
#[path = "./regular_tests.rs"]
mod tests;
