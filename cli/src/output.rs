use malt_lib::{
    config::Config,
    packet::{
        PacketRecord,
        beacon::{self, BeaconRecord},
    },
    runners::Sink,
    stats::{FlowKey, FlowStats, FlowTable},
};
use log::*;
use paris::formatter::colorize_string;
use prettytable::{
    Attr, Row, Table, color,
    format::{FormatBuilder, LinePosition, LineSeparator},
    row,
};
use std::{fmt::Write, net::Ipv4Addr, time::Duration};

const BEACON_TAGS: &str = "<bright-red>";
const PACKET_TAGS: &str = "<bright-yellow>";
const PAYLOAD_TAGS: &str = "<yellow>";
const TIMEOUT_TAGS: &str = "<bright-white>";
const SENT_TAGS: &str = "<bold><red>";

const NANOS_PER_SEC: u64 = 1_000_000_000;
const SECS_PER_DAY: u64 = 86_400;

/// Formats nanoseconds since the epoch as `HH:MM:SS.mmm` (UTC)
pub fn format_timestamp(nanos: u64) -> String {
    let secs = nanos / NANOS_PER_SEC;
    let millis = (nanos % NANOS_PER_SEC) / 1_000_000;
    let of_day = secs % SECS_PER_DAY;

    format!(
        "{:02}:{:02}:{:02}.{millis:03}",
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

/// Formats a duration as seconds rounded to milliseconds
pub fn format_duration(duration: Duration) -> String {
    let millis = (duration.as_nanos() + 500_000) / 1_000_000;
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

/// Formats a bit rate with two decimals in the largest fitting unit
pub fn format_rate(bits_per_sec: f64) -> String {
    if bits_per_sec < 1e3 {
        format!("{bits_per_sec:.2}bps")
    } else if bits_per_sec < 1e6 {
        format!("{:.2}Kbps", bits_per_sec / 1e3)
    } else if bits_per_sec < 1e9 {
        format!("{:.2}Mbps", bits_per_sec / 1e6)
    } else {
        format!("{:.2}Gbps", bits_per_sec / 1e9)
    }
}

fn format_ttl(ttl: i16) -> String {
    if ttl < 0 { "?".into() } else { ttl.to_string() }
}

fn format_target(group: Ipv4Addr, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{group}:{port}"),
        None => format!("{group}:*"),
    }
}

/// Formats the line describing a received packet, returns true when the
/// payload is a beacon
pub fn packet_line(record: &PacketRecord) -> (String, bool) {
    let mut line = format!(
        "{} {}:{}->{}:{} TTL {}",
        format_timestamp(record.timestamp),
        record.source,
        record.sport,
        record.group,
        record.dport,
        format_ttl(record.ttl)
    );

    let Some(beacon) = beacon::decode(record.payload()) else {
        return (line, false);
    };

    let _ = write!(
        line,
        ", malt pkt seq #{} | {} {}",
        beacon.sequence,
        String::from_utf8_lossy(beacon.host_name),
        format_timestamp(beacon.time_nanos)
    );

    (line, true)
}

/// Hex and printable ASCII view of a payload in rows of 16 bytes
pub fn hexdump(payload: &[u8]) -> String {
    let mut out = String::new();

    for (i, row) in payload.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
        }

        out.push_str("  ");

        for col in 0..16 {
            if col == 8 {
                out.push(' ');
            }
            match row.get(col) {
                Some(byte) => {
                    let _ = write!(out, "{byte:02x} ");
                }
                None => out.push_str("   "),
            }
        }

        out.push(' ');

        out.extend(row.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '.'
            }
        }));
    }

    out
}

fn flow_row(
    key: FlowKey,
    stats: &FlowStats,
    duration: Duration,
) -> Row {
    let secs = duration.as_secs_f64();
    let rate = if secs > 0.0 {
        (stats.bytes() * 8) as f64 / secs
    } else {
        0.0
    };

    row![
        format!("{}:{}", key.source(), key.sport()),
        key.dport(),
        r->stats.packets(),
        r->stats.bytes(),
        r->stats.avg_packet_size(),
        r->format_rate(rate)
    ]
}

fn paint_row(row: &mut Row) {
    for cell in row.iter_mut() {
        cell.style(Attr::ForegroundColor(color::BRIGHT_YELLOW));
    }
}

fn report_header(
    group: Ipv4Addr,
    port: Option<u16>,
    table: &FlowTable,
) -> String {
    let target = format_target(group, port);
    let duration = format_duration(table.duration());

    if table.is_empty() {
        format!("No traffic received for {target} in {duration} sec")
    } else {
        format!("Traffic received for {target} in {duration} sec")
    }
}

/// Builds the per flow statistics table, cells are painted bright yellow
/// when `colors` is set
pub fn flow_table(table: &FlowTable, colors: bool) -> Table {
    let mut flows = Table::new();
    flows.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separators(
                &[LinePosition::Title],
                LineSeparator::new('=', ' ', ' ', ' '),
            )
            .padding(0, 0)
            .build(),
    );

    let mut titles = row!["Source", "DPort", "Pkts", "Bytes", "APS", "Rate"];
    if colors {
        paint_row(&mut titles);
    }
    flows.set_titles(titles);

    for (key, stats) in table.iter() {
        let mut row = flow_row(key, stats, table.duration());
        if colors {
            paint_row(&mut row);
        }
        flows.add_row(row);
    }

    flows
}

/// Formats the final receive statistics
pub fn receive_report(
    group: Ipv4Addr,
    port: Option<u16>,
    table: &FlowTable,
) -> String {
    let header = report_header(group, port, table);

    if table.is_empty() {
        return header;
    }

    format!("{header}\n{}", flow_table(table, false))
}

/// Sink printing everything a run reports to stdout
pub struct ConsoleSink {
    group: Ipv4Addr,
    port: Option<u16>,
    show_payload: bool,
    colors: bool,
}

impl ConsoleSink {
    /// Returns a sink for the run described by `config`, colors are only used
    /// when enabled and supported by stdout
    pub fn new(config: &Config) -> Self {
        let colors = config.colors()
            && supports_color::on(supports_color::Stream::Stdout).is_some();

        Self {
            group: config.group(),
            port: (!config.wildcard()).then(|| config.dport()),
            show_payload: config.show_payload(),
            colors,
        }
    }

    fn paint(&self, tags: &str, text: &str) -> String {
        if self.colors {
            colorize_string(format!("{tags}{text}</>"))
        } else {
            text.to_string()
        }
    }
}

impl Sink for ConsoleSink {
    fn on_received_packet(&mut self, record: &PacketRecord) {
        let (line, is_beacon) = packet_line(record);
        let tags = if is_beacon { BEACON_TAGS } else { PACKET_TAGS };

        println!("{}", self.paint(tags, &line));

        if self.show_payload {
            println!(
                "{}",
                self.paint(PAYLOAD_TAGS, &hexdump(record.payload()))
            );
        }
    }

    fn on_sent_beacon(&mut self, beacon: &BeaconRecord) {
        let line = format!(
            "{} sent malt pkt seq #{}",
            format_timestamp(beacon.time_nanos),
            beacon.sequence
        );
        println!("{}", self.paint(BEACON_TAGS, &line));
    }

    fn on_timeout(&mut self, now: u64) {
        let line = format!("{} timeout", format_timestamp(now));
        println!("{}", self.paint(TIMEOUT_TAGS, &line));
    }

    fn on_receive_stats_final(&mut self, table: &FlowTable) {
        let header = report_header(self.group, self.port, table);
        println!("\n{}", self.paint(PACKET_TAGS, &header));

        if table.is_empty() {
            return;
        }

        let flows = flow_table(table, self.colors);

        if !self.colors {
            print!("{flows}");
            return;
        }

        if let Err(e) = flows.print_tty(true) {
            warn!("failed to print receive statistics: {e}");
        }
    }

    fn on_send_stats_final(&mut self, sent: u64) {
        let line = format!("sent {sent} packets");
        println!("\n{}", self.paint(SENT_TAGS, &line));
    }
}

#[cfg(test)]
#[path = "./output_tests.rs"]
mod tests;
