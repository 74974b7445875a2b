//! Provides the receiver and sender engines and the traits they are driven
//! through
//!
//! A run is started by building a [`Runner`] with [`make_runner`] and calling
//! [`Runner::run`]. Everything the engine observes is reported to a [`Sink`].

#[cfg(test)]
use mockall::automock;

use std::{
    sync::{Arc, atomic::AtomicBool},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    acquisition,
    config::Config,
    error::Result,
    packet::{PacketRecord, beacon::BeaconRecord},
    stats::FlowTable,
};

pub mod receiver;
pub mod sender;
pub mod timeout;

/// Trait describing an engine that runs to completion
pub trait Runner {
    /// Runs until the packet count is reached, a stop is requested or an
    /// error occurs
    fn run(&mut self) -> Result<()>;
}

/// Receives everything an engine reports during a run
#[cfg_attr(test, automock)]
pub trait Sink {
    /// A packet was accepted, the payload reference is only valid for the
    /// duration of the call
    fn on_received_packet(&mut self, record: &PacketRecord);

    /// A beacon was transmitted
    fn on_sent_beacon(&mut self, beacon: &BeaconRecord);

    /// No packet was accepted for the configured timeout
    fn on_timeout(&mut self, now: u64);

    /// Final statistics of a receive run
    fn on_receive_stats_final(&mut self, table: &FlowTable);

    /// Number of beacons sent by a send run
    fn on_send_stats_final(&mut self, sent: u64);
}

/// Current wall clock time in nanoseconds since the epoch
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Returns the engine for the configured mode: the sender, or a receiver
/// using the acquisition strategy the configured port calls for
pub fn make_runner(
    config: Config,
    sink: Box<dyn Sink>,
    stop: Arc<AtomicBool>,
) -> Box<dyn Runner> {
    if config.sender() {
        Box::new(sender::Sender::new(config, sink, stop))
    } else {
        let acquisition = acquisition::for_config(&config);
        Box::new(receiver::Receiver::new(config, acquisition, sink, stop))
    }
}
