//! Immutable run configuration shared by the receiver and sender engines

use derive_builder::Builder;
use std::{fmt::Display, net::Ipv4Addr, time::Duration};

/// Timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u32 = 5;

/// Upper bound accepted for the timeout
pub const MAX_TIMEOUT_SECS: u32 = 60;

/// TTL used by the sender when none is configured
pub const DEFAULT_TTL: u32 = 255;

/// Selects which engine a run uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Join the group and report traffic
    #[default]
    Receiver,
    /// Periodically transmit beacons to the group
    Sender,
}

/// Data structure representing a fully validated malt configuration
///
/// # Examples
///
/// ```
/// # use std::net::Ipv4Addr;
/// # use malt_lib::config::ConfigBuilder;
/// let config = ConfigBuilder::default()
///     .group(Ipv4Addr::new(239, 1, 2, 3))
///     .port(23456u16)
///     .interface("eth0")
///     .interface_addr(Ipv4Addr::new(192, 168, 1, 10))
///     .build()
///     .unwrap();
/// assert!(!config.wildcard());
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Multicast group to join or send to
    group: Ipv4Addr,
    /// Destination UDP port, None captures all ports
    #[builder(default)]
    port: Option<u16>,
    /// Name of the multicast interface
    interface: String,
    /// IPv4 address of the multicast interface
    interface_addr: Ipv4Addr,
    /// Source for an (S,G) join, None joins (*,G)
    #[builder(default)]
    source: Option<Ipv4Addr>,
    /// Seconds without a packet of interest before a timeout is reported
    #[builder(default = "DEFAULT_TIMEOUT_SECS")]
    timeout_secs: u32,
    /// Receiver or sender
    #[builder(default)]
    mode: Mode,
    /// Outbound multicast TTL, only valid in sender mode
    #[builder(default)]
    ttl: Option<u32>,
    /// Number of packets after which the run stops, 0 is unlimited
    #[builder(default)]
    count: u64,
    /// Whether received payloads should be dumped
    #[builder(default)]
    show_payload: bool,
    /// Whether console output may be colored
    #[builder(default = "true")]
    colors: bool,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(group) = self.group {
            if !group.is_multicast() {
                return Err(format!("address {group} is not multicast"));
            }
        }

        if let Some(Some(0)) = self.port {
            return Err("invalid UDP port 0".into());
        }

        if let Some(Some(source)) = self.source {
            if source.is_multicast()
                || source.is_unspecified()
                || source.octets()[0] == 0
                || source.is_broadcast()
            {
                return Err(format!("invalid source IP address {source}"));
            }
        }

        if let Some(timeout) = self.timeout_secs {
            if timeout > MAX_TIMEOUT_SECS {
                return Err(format!("invalid timeout {timeout}"));
            }
        }

        let sender = self.mode == Some(Mode::Sender);

        if let Some(Some(ttl)) = self.ttl {
            if !sender {
                return Err("--ttl may only be used with --sender".into());
            }
            if ttl > 255 {
                return Err(format!("invalid TTL {ttl}"));
            }
        }

        if sender {
            if matches!(self.port, None | Some(None)) {
                return Err("the UDP port is required in the sender mode".into());
            }
            if let Some(Some(_)) = self.source {
                return Err("the source IP address may not be specified in \
                            the sender mode"
                    .into());
            }
            if self.show_payload == Some(true) {
                return Err("option -d|--data is not available in the \
                            sender mode"
                    .into());
            }
        }

        Ok(())
    }
}

impl Config {
    /// Returns a builder for Config
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Multicast group
    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    /// Destination port, 0 when capturing all ports
    pub fn dport(&self) -> u16 {
        self.port.unwrap_or(0)
    }

    /// True when no destination port was requested
    pub fn wildcard(&self) -> bool {
        self.port.is_none()
    }

    /// Multicast interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Multicast interface address
    pub fn interface_addr(&self) -> Ipv4Addr {
        self.interface_addr
    }

    /// Source of an (S,G) join if configured
    pub fn source(&self) -> Option<Ipv4Addr> {
        self.source
    }

    /// Timeout threshold, zero disables reporting
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.into())
    }

    /// Run mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True in sender mode
    pub fn sender(&self) -> bool {
        self.mode == Mode::Sender
    }

    /// Outbound multicast TTL
    pub fn ttl(&self) -> u32 {
        self.ttl.unwrap_or(DEFAULT_TTL)
    }

    /// Packet count limit, 0 is unlimited
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether payloads should be displayed
    pub fn show_payload(&self) -> bool {
        self.show_payload
    }

    /// Whether colors are enabled
    pub fn colors(&self) -> bool {
        self.colors
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "YES" } else { "NO" }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let port = match self.port {
            Some(port) => port.to_string(),
            None => "*".to_string(),
        };
        let source = match self.source {
            Some(source) => source.to_string(),
            None => "*".to_string(),
        };
        let sender = if self.sender() {
            format!("YES, TTL = {}", self.ttl())
        } else {
            "NO".to_string()
        };
        let count = if self.count == 0 {
            "unlimited".to_string()
        } else {
            self.count.to_string()
        };

        writeln!(f, "Group:                {}", self.group)?;
        writeln!(f, "UDP port:             {port}")?;
        writeln!(f, "Interface:            {}", self.interface)?;
        writeln!(f, "Interface IP address: {}", self.interface_addr)?;
        writeln!(f, "Source:               {source}")?;
        writeln!(f, "Timeout:              {} sec", self.timeout_secs)?;
        writeln!(f, "Sender:               {sender}")?;
        writeln!(f, "Count:                {count}")?;
        writeln!(f, "Show payload:         {}", yes_no(self.show_payload))?;
        write!(f, "Colors:               {}", yes_no(self.colors))
    }
}

#[cfg(test)]
#[path = "./config_tests.rs"]
mod tests;
