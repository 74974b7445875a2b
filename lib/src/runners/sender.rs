//! Provides the engine that periodically transmits beacons to a group

use log::*;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::{
    net::SocketAddrV4,
    os::unix::ffi::OsStrExt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use crate::{
    config::Config,
    error::{MaltError, Result},
    packet::beacon::BeaconRecord,
};

use super::{Runner, Sink, now_nanos};

/// Time between two beacons unless configured otherwise
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(1);

/// Data structure representing the send engine
pub struct Sender {
    config: Config,
    sink: Box<dyn Sink>,
    stop: Arc<AtomicBool>,
    interval: Duration,
}

impl Sender {
    /// Returns a sender transmitting every [`DEFAULT_SEND_INTERVAL`]
    pub fn new(
        config: Config,
        sink: Box<dyn Sink>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            sink,
            stop,
            interval: DEFAULT_SEND_INTERVAL,
        }
    }

    /// Sets the time between two beacons
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn open(&self) -> Result<(Socket, BeaconRecord)> {
        let host_name = nix::unistd::gethostname().map_err(|e| {
            MaltError::from_errno("failed to get host name", e)
        })?;
        let beacon = BeaconRecord::new(host_name.as_bytes());

        let socket =
            Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
                .map_err(|e| {
                    MaltError::sys_call("failed to open UDP socket", e)
                })?;

        socket.set_multicast_ttl_v4(self.config.ttl()).map_err(|e| {
            MaltError::sys_call("failed to set IP_MULTICAST_TTL", e)
        })?;

        socket.set_multicast_loop_v4(true).map_err(|e| {
            MaltError::sys_call("failed to set IP_MULTICAST_LOOP", e)
        })?;

        let interface = self.config.interface_addr();
        socket.set_multicast_if_v4(&interface).map_err(|e| {
            MaltError::sys_call(
                format!("failed to set IP_MULTICAST_IF to {interface}"),
                e,
            )
        })?;

        debug!(
            "sending as {} with TTL {} on {interface}",
            String::from_utf8_lossy(beacon.host_name()),
            self.config.ttl()
        );

        Ok((socket, beacon))
    }

    fn send(
        &mut self,
        socket: &Socket,
        beacon: &mut BeaconRecord,
    ) -> Result<()> {
        let target =
            SocketAddrV4::new(self.config.group(), self.config.dport());
        let address = SockAddr::from(target);
        let count = self.config.count();

        let mut raw = beacon.to_raw();

        info!("sending beacons to {target}");

        loop {
            if self.stop.load(Ordering::Relaxed) {
                debug!("stop requested, leaving send loop");
                return Ok(());
            }

            beacon.time_nanos = now_nanos();
            beacon.update_raw(&mut raw);

            socket.send_to(&raw, &address).map_err(|e| {
                MaltError::sys_call(format!("failed to send to {target}"), e)
            })?;

            self.sink.on_sent_beacon(beacon);

            beacon.sequence += 1;
            if count > 0 && beacon.sequence >= count {
                return Ok(());
            }

            thread::sleep(self.interval);
        }
    }
}

impl Runner for Sender {
    fn run(&mut self) -> Result<()> {
        let (socket, mut beacon) = self.open()?;

        let res = self.send(&socket, &mut beacon);

        self.sink.on_send_stats_final(beacon.sequence);

        res
    }
}

#[cfg(test)]
#[path = "./sender_tests.rs"]
mod tests;
