//! Per-flow receive statistics
//!
//! A flow is identified by source address, source port and destination
//! port. The group is fixed for a run and therefore not part of the key.

use std::{
    cell::Cell,
    collections::{BTreeSet, HashMap},
    fmt::Display,
    net::Ipv4Addr,
    rc::Rc,
    time::{Duration, Instant},
};

/// Bytes attributed to every packet on top of its UDP payload: 12 bytes of
/// MAC addresses (no VLAN), 20 bytes IP header, 8 bytes UDP header and a
/// 4 byte frame check sequence
pub const FRAMING_OVERHEAD: u64 = 12 + 20 + 8 + 4;

/// Flow identity packed as `dport << 48 | source << 16 | sport`
///
/// The numeric order of the packed value is the order in which flows are
/// reported: by destination port, then source address, then source port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowKey(u64);

impl FlowKey {
    /// Packs a flow identity
    pub const fn new(source: Ipv4Addr, sport: u16, dport: u16) -> Self {
        let source = u32::from_be_bytes(source.octets()) as u64;
        Self(((dport as u64) << 48) | (source << 16) | sport as u64)
    }

    /// Returns the key from its packed representation
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Packed representation
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Source address of the flow
    pub const fn source(self) -> Ipv4Addr {
        let raw = ((self.0 >> 16) & 0xFFFF_FFFF) as u32;
        Ipv4Addr::from_bits(raw)
    }

    /// Source port of the flow
    pub const fn sport(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Destination port of the flow
    pub const fn dport(self) -> u16 {
        ((self.0 >> 48) & 0xFFFF) as u16
    }
}

impl Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} -> *:{}", self.source(), self.sport(), self.dport())
    }
}

/// Counters accumulated for one flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStats {
    packets: u64,
    bytes: u64,
}

impl FlowStats {
    fn first(payload_len: u64) -> Self {
        Self {
            packets: 1,
            bytes: payload_len + FRAMING_OVERHEAD,
        }
    }

    fn add(&mut self, payload_len: u64) {
        self.packets += 1;
        self.bytes += payload_len + FRAMING_OVERHEAD;
    }

    /// Number of packets seen
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Bytes seen including framing overhead
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Average packet size including framing overhead
    pub fn avg_packet_size(&self) -> u64 {
        self.bytes / self.packets
    }
}

/// Table of flow statistics for one capture run
#[derive(Debug, Default)]
pub struct FlowTable {
    flows: HashMap<FlowKey, FlowStats>,
    keys: BTreeSet<FlowKey>,
    duration: Rc<Cell<Duration>>,
}

/// Measures the capture session, the elapsed time is stored in the table
/// when the timer is dropped
#[must_use = "the session is measured until the timer is dropped"]
pub struct SessionTimer {
    start: Instant,
    duration: Rc<Cell<Duration>>,
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.duration.set(self.start.elapsed());
    }
}

impl FlowTable {
    /// Returns an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts one packet with `payload_len` UDP payload bytes
    pub fn update(&mut self, key: FlowKey, payload_len: usize) {
        let payload_len = payload_len as u64;

        if let Some(stats) = self.flows.get_mut(&key) {
            stats.add(payload_len);
        } else {
            self.flows.insert(key, FlowStats::first(payload_len));
            self.keys.insert(key);
        }
    }

    /// Starts measuring the session duration
    pub fn start_timer(&self) -> SessionTimer {
        SessionTimer {
            start: Instant::now(),
            duration: Rc::clone(&self.duration),
        }
    }

    /// Duration recorded by the last finished [`SessionTimer`]
    pub fn duration(&self) -> Duration {
        self.duration.get()
    }

    /// Statistics of a single flow
    pub fn get(&self, key: FlowKey) -> Option<&FlowStats> {
        self.flows.get(&key)
    }

    /// Iterates flows in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (FlowKey, &FlowStats)> + '_ {
        self.keys
            .iter()
            .filter_map(|key| self.flows.get(key).map(|stats| (*key, stats)))
    }

    /// Number of distinct flows
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// True if no packet was accounted
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Packets accounted across all flows
    pub fn total_packets(&self) -> u64 {
        self.flows.values().map(FlowStats::packets).sum()
    }
}

#[cfg(test)]
#[path = "./stats_tests.rs"]
mod tests;
