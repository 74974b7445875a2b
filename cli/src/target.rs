use std::{fmt::Display, net::Ipv4Addr, str::FromStr};

/// Port part of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpec {
    /// No `:` suffix
    Omitted,
    /// `:*`
    Any,
    /// `:<port>`
    Port(u16),
}

/// Multicast group and optional destination port given on the command line
/// as `<group>`, `<group>:<port>` or `<group>:*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub group: Ipv4Addr,
    pub port: PortSpec,
}

fn parse_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("invalid UDP port {value}")),
        Ok(port) => Ok(port),
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, port) = match s.split_once(':') {
            Some((group, "*")) => (group, PortSpec::Any),
            Some((group, port)) => {
                (group, PortSpec::Port(parse_port(port)?))
            }
            None => (s, PortSpec::Omitted),
        };

        let group = group
            .parse::<Ipv4Addr>()
            .map_err(|_| format!("invalid multicast group address {group}"))?;

        if !group.is_multicast() {
            return Err(format!("address {group} is not multicast"));
        }

        Ok(Self { group, port })
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            PortSpec::Omitted => write!(f, "{}", self.group),
            PortSpec::Any => write!(f, "{}:*", self.group),
            PortSpec::Port(port) => write!(f, "{}:{port}", self.group),
        }
    }
}

/// Merges the port of the target with the one given by `-p`, None captures
/// every port
pub fn resolve_port(
    target: &Target,
    port: Option<u16>,
) -> Result<Option<u16>, String> {
    match (target.port, port) {
        (PortSpec::Omitted, port) => Ok(port),
        (_, Some(_)) => Err("option -p|--port may not be used if UDP port \
                             is specified in the target"
            .into()),
        (PortSpec::Any, None) => Ok(None),
        (PortSpec::Port(port), None) => Ok(Some(port)),
    }
}

#[cfg(test)]
#[path = "./target_tests.rs"]
mod tests;
