//! Provides the engine that joins a group and reports received traffic

use log::*;
use nix::{
    errno::Errno,
    poll::{PollFd, PollFlags, PollTimeout, poll},
};
use socket2::Socket;
use std::{
    net::{Ipv4Addr, SocketAddrV4},
    os::fd::AsFd,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    acquisition::Acquisition,
    config::Config,
    error::{MaltError, Result},
    packet::{BUFFER_SIZE, PacketRecord, Reception},
    stats::{FlowKey, FlowTable},
};

use super::{Runner, Sink, now_nanos, timeout::TimeoutTracker};

/// Upper bound on a single wait for socket readiness, in milliseconds
pub const WAIT_SLICE_MS: u16 = 100;

/// Data structure representing the receive engine
pub struct Receiver {
    config: Config,
    acquisition: Box<dyn Acquisition>,
    sink: Box<dyn Sink>,
    stop: Arc<AtomicBool>,
}

impl Receiver {
    /// Returns a receiver reading packets through `acquisition`
    pub fn new(
        config: Config,
        acquisition: Box<dyn Acquisition>,
        sink: Box<dyn Sink>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            acquisition,
            sink,
            stop,
        }
    }

    fn open(&self) -> Result<Socket> {
        let socket = self.acquisition.open_socket()?;

        socket.set_nonblocking(true).map_err(|e| {
            MaltError::sys_call("failed to make socket non-blocking", e)
        })?;

        socket.set_reuse_address(true).map_err(|e| {
            MaltError::sys_call("failed to set SO_REUSEADDR", e)
        })?;

        if let Err(e) = socket.set_recv_buffer_size(BUFFER_SIZE) {
            warn!("failed to set receive buffer size to {BUFFER_SIZE}: {e}");
        }

        self.acquisition.configure_socket(&socket)?;

        let addr =
            SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.config.dport());

        socket.bind(&addr.into()).map_err(|e| {
            MaltError::sys_call(format!("failed to bind {addr}"), e)
        })?;

        info!("socket bound to {addr}");

        Ok(socket)
    }

    fn join(&self, socket: &Socket) -> Result<()> {
        let group = self.config.group();
        let interface = self.config.interface_addr();

        match self.config.source() {
            Some(source) => {
                socket
                    .join_ssm_v4(&source, &group, &interface)
                    .map_err(|e| {
                        let context = format!(
                            "failed to join ({source},{group}) on {interface}"
                        );
                        MaltError::sys_call(context, e)
                    })?;
                info!("joined ({source},{group}) on {interface}");
            }
            None => {
                socket.join_multicast_v4(&group, &interface).map_err(|e| {
                    MaltError::sys_call(
                        format!("failed to join (*,{group}) on {interface}"),
                        e,
                    )
                })?;
                info!("joined (*,{group}) on {interface}");
            }
        }

        Ok(())
    }

    // The session timer spans this call so the table duration covers the
    // listening phase only
    fn listen(&mut self, socket: &Socket, table: &mut FlowTable) -> Result<()> {
        let _timer = table.start_timer();

        let mut record = PacketRecord::new(self.config.group());
        let mut tracker =
            TimeoutTracker::new(self.config.timeout(), now_nanos());
        let count = self.config.count();
        let mut accepted = 0u64;

        loop {
            if self.stop.load(Ordering::Relaxed) {
                debug!("stop requested, leaving receive loop");
                return Ok(());
            }

            let mut fds = [PollFd::new(
                socket.as_fd(),
                PollFlags::POLLIN | PollFlags::POLLPRI,
            )];

            let ready = match poll(&mut fds, PollTimeout::from(WAIT_SLICE_MS)) {
                Ok(ready) => ready,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(MaltError::from_errno("poll failed", e)),
            };

            let revents = fds[0].revents().unwrap_or(PollFlags::empty());

            let now = now_nanos();
            tracker.timestamp(now);

            if ready == 0 {
                if tracker.expired() {
                    self.sink.on_timeout(now);
                    tracker.reset();
                }
                continue;
            }

            if revents.contains(PollFlags::POLLHUP) {
                return Err(MaltError::Socket("connection hung up".into()));
            }

            if revents.contains(PollFlags::POLLERR) {
                let message = match socket.take_error() {
                    Ok(Some(e)) => e.to_string(),
                    Ok(None) => "error flagged without pending SO_ERROR".into(),
                    Err(e) => {
                        return Err(MaltError::sys_call(
                            "failed to read SO_ERROR",
                            e,
                        ));
                    }
                };
                return Err(MaltError::Socket(message));
            }

            let reception = self.acquisition.receive_packet(
                socket,
                &mut record,
                &self.config,
                now,
            )?;

            if reception == Reception::Filtered {
                continue;
            }

            tracker.reset();
            self.sink.on_received_packet(&record);
            table.update(
                FlowKey::new(record.source, record.sport, record.dport),
                record.payload_len(),
            );

            accepted += 1;
            if count > 0 && accepted >= count {
                debug!("received {accepted} packets, leaving receive loop");
                return Ok(());
            }
        }
    }
}

impl Runner for Receiver {
    fn run(&mut self) -> Result<()> {
        let socket = self.open()?;
        let mut table = FlowTable::new();

        let res = match self.join(&socket) {
            Ok(()) => self.listen(&socket, &mut table),
            Err(e) => Err(e),
        };

        self.sink.on_receive_stats_final(&table);

        res
    }
}

#[cfg(test)]
#[path = "./receiver_tests.rs"]
mod tests;
