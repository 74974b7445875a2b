//! Library package for diagnosing IPv4 multicast delivery
//!
//! A run either joins a group and reports every packet received together
//! with per-flow statistics, or transmits numbered beacons to a group so
//! receivers elsewhere can identify the sender.
//!
//! # Examples
//!
//! ```no_run
//! use std::{
//!     net::Ipv4Addr,
//!     sync::{Arc, atomic::AtomicBool},
//! };
//!
//! use malt_lib::{
//!     config::Config,
//!     packet::{PacketRecord, beacon::BeaconRecord},
//!     runners::{Sink, make_runner},
//!     stats::FlowTable,
//! };
//!
//! struct Print;
//!
//! impl Sink for Print {
//!     fn on_received_packet(&mut self, record: &PacketRecord) {
//!         println!("{}:{} {} bytes", record.source, record.sport, record.payload_len());
//!     }
//!     fn on_sent_beacon(&mut self, _beacon: &BeaconRecord) {}
//!     fn on_timeout(&mut self, _now: u64) {}
//!     fn on_receive_stats_final(&mut self, table: &FlowTable) {
//!         println!("{} packets", table.total_packets());
//!     }
//!     fn on_send_stats_final(&mut self, _sent: u64) {}
//! }
//!
//! let config = Config::builder()
//!     .group(Ipv4Addr::new(239, 1, 2, 3))
//!     .port(23456u16)
//!     .interface("eth0")
//!     .interface_addr(Ipv4Addr::new(192, 168, 1, 10))
//!     .count(10u64)
//!     .build()
//!     .unwrap();
//!
//! let mut runner = make_runner(config, Box::new(Print), Arc::new(AtomicBool::new(false)));
//! runner.run().unwrap();
//! ```
//!
//! Capturing all ports of a group (no port configured) reads from a raw
//! socket and needs the `CAP_NET_RAW` capability.

#![deny(missing_docs)]
pub mod acquisition;
pub mod config;
pub mod error;
pub mod network;
pub mod packet;
pub mod runners;
pub mod stats;
