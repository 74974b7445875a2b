//! Acquisition strategies used by the receiver to pull packets off a socket
//!
//! - [`RawAcquisition`] reads whole IPv4 datagrams from a raw socket and is
//!   used when every destination port of the group is captured
//! - [`RegularAcquisition`] reads UDP payloads from a socket bound to the
//!   configured port and asks the kernel for the received TTL

#[cfg(test)]
use mockall::automock;

use socket2::Socket;

use crate::{
    config::Config,
    error::Result,
    packet::{PacketRecord, Reception},
};

mod raw;
mod regular;

pub use raw::RawAcquisition;
pub use regular::RegularAcquisition;

/// Trait describing how the receiver opens its socket and extracts packets
/// from it
#[cfg_attr(test, automock)]
pub trait Acquisition {
    /// Opens the socket packets will be read from
    fn open_socket(&self) -> Result<Socket>;

    /// Applies strategy specific socket options
    fn configure_socket(&self, socket: &Socket) -> Result<()>;

    /// Reads one packet from a readable socket into `record`
    ///
    /// On [`Reception::Accepted`] every field of `record` describes the new
    /// packet and its timestamp is set to `now`. On [`Reception::Filtered`]
    /// the payload is left untouched.
    fn receive_packet(
        &mut self,
        socket: &Socket,
        record: &mut PacketRecord,
        config: &Config,
        now: u64,
    ) -> Result<Reception>;
}

/// Returns the strategy matching the configuration. Capturing all ports
/// requires a raw socket.
pub fn for_config(config: &Config) -> Box<dyn Acquisition> {
    if config.wildcard() {
        Box::new(RawAcquisition::new())
    } else {
        Box::new(RegularAcquisition::new())
    }
}
