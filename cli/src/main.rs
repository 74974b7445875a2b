//! CLI for verifying IPv4 multicast delivery
//!
//! # Examples
//!
//! ```bash
//! # help menu
//! malt --help
//!
//! # join 239.1.2.3 on eth0 and report traffic sent to port 23456
//! malt -i eth0 239.1.2.3:23456
//!
//! # report traffic to every port of the group (requires CAP_NET_RAW)
//! sudo malt -i eth0 239.1.2.3
//!
//! # send a beacon every second
//! malt -i eth0 239.1.2.3:23456 --sender --ttl 8
//! ```
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use log::*;
use malt_lib::{
    config::{Config, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS, Mode},
    network::{self, NetworkInterface},
    runners,
};
use std::{
    net::Ipv4Addr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

mod output;
mod target;

use output::ConsoleSink;
use target::Target;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI for verifying IPv4 multicast delivery
struct Args {
    /// Multicast group with an optional UDP port, <group>[:<port>|:*].
    /// Without a port traffic to every port of the group is reported, which
    /// requires the CAP_NET_RAW capability
    target: Target,

    /// Multicast interface
    #[arg(short, long)]
    intf: String,

    /// UDP port, may not be used if the target carries a port
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Source of an IGMPv3 source specific (S,G) join
    #[arg(short, long)]
    source: Option<Ipv4Addr>,

    /// Seconds without traffic before a timeout is reported, 0 disables
    /// timeout reporting
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser =
            clap::value_parser!(u32).range(..=i64::from(MAX_TIMEOUT_SECS))
    )]
    timeout: u32,

    /// Send a beacon to the group and port every second instead of
    /// receiving
    #[arg(long, default_value_t = false)]
    sender: bool,

    /// TTL of the transmitted beacons, only with --sender [default: 255]
    #[arg(long, value_parser = clap::value_parser!(u32).range(..=255))]
    ttl: Option<u32>,

    /// Show UDP payloads in hexadecimal and printable ASCII
    #[arg(short, long, default_value_t = false)]
    data: bool,

    /// Stop after this many packets, 0 is unlimited
    #[arg(short, long, default_value_t = 0)]
    count: u64,

    /// Suppress colors in the output
    #[arg(long, default_value_t = false)]
    nocolors: bool,

    /// Log the effective configuration before running
    #[arg(long, default_value_t = false)]
    show_config: bool,

    /// Prints debug logs including those from malt-lib
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[doc(hidden)]
fn initialize_logger(args: &Args) -> Result<()> {
    let filter = if args.debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let color = if args.nocolors {
        simplelog::ColorChoice::Never
    } else {
        simplelog::ColorChoice::Auto
    };

    simplelog::TermLogger::init(
        filter,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        color,
    )?;

    Ok(())
}

#[doc(hidden)]
fn build_config(args: &Args, interface: &NetworkInterface) -> Result<Config> {
    let port =
        target::resolve_port(&args.target, args.port).map_err(|e| eyre!(e))?;

    let mode = if args.sender {
        Mode::Sender
    } else {
        Mode::Receiver
    };

    let config = Config::builder()
        .group(args.target.group)
        .port(port)
        .interface(interface.name.clone())
        .interface_addr(interface.ipv4)
        .source(args.source)
        .timeout_secs(args.timeout)
        .mode(mode)
        .ttl(args.ttl)
        .count(args.count)
        .show_payload(args.data)
        .colors(!args.nocolors)
        .build()?;

    Ok(config)
}

#[doc(hidden)]
fn print_config(config: &Config) {
    info!("configuration:");
    for line in config.to_string().lines() {
        info!("{line}");
    }
}

#[doc(hidden)]
fn install_stop_handler(stop: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::Relaxed);
    })
    .map_err(|err| eyre!("failed to set ctrl-c handler: {}", err))
}

#[doc(hidden)]
fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    initialize_logger(&args)?;

    let interface = network::get_interface(&args.intf).ok_or_else(|| {
        eyre!("invalid IPv4 multicast interface '{}'", args.intf)
    })?;

    if !interface.multicast {
        warn!("interface {} does not advertise multicast", interface.name);
    }

    let config = build_config(&args, &interface)?;

    if args.show_config {
        print_config(&config);
    }

    let stop = Arc::new(AtomicBool::new(false));
    install_stop_handler(Arc::clone(&stop))?;

    let sink = ConsoleSink::new(&config);
    let mut runner = runners::make_runner(config, Box::new(sink), stop);

    runner.run()?;

    Ok(())
}

#[cfg(test)]
#[path = "./main_tests.rs"]
mod tests;
