use super::*;

const GROUP: Ipv4Addr = Ipv4Addr::new(239, 1, 2, 3);

fn record(payload: &[u8]) -> PacketRecord {
    let mut record = PacketRecord::new(GROUP);
    record.source = Ipv4Addr::new(10, 0, 0, 5);
    record.sport = 40000;
    record.dport = 5000;
    record.ttl = 12;
    // 13:45:07.250 on some day
    record.timestamp = (19_000 * 86_400 + 13 * 3600 + 45 * 60 + 7)
        * 1_000_000_000
        + 250_000_000;
    record.set_payload(payload);
    record
}

#[test]
fn formats_timestamp_as_utc_time_of_day() {
    assert_eq!(format_timestamp(0), "00:00:00.000");
    assert_eq!(format_timestamp(record(b"").timestamp), "13:45:07.250");
    assert_eq!(format_timestamp(86_399_999_999_999), "23:59:59.999");
}

#[test]
fn formats_duration_in_seconds() {
    assert_eq!(format_duration(Duration::from_millis(2500)), "2.500");
    assert_eq!(format_duration(Duration::from_nanos(999_600_000)), "1.000");
    assert_eq!(format_duration(Duration::ZERO), "0.000");
}

#[test]
fn scales_rates() {
    assert_eq!(format_rate(999.0), "999.00bps");
    assert_eq!(format_rate(1_500.0), "1.50Kbps");
    assert_eq!(format_rate(2_346_000.0), "2.35Mbps");
    assert_eq!(format_rate(10_000_000_000.0), "10.00Gbps");
}

#[test]
fn describes_plain_packet() {
    let (line, is_beacon) = packet_line(&record(b"hello"));

    assert!(!is_beacon);
    assert_eq!(line, "13:45:07.250 10.0.0.5:40000->239.1.2.3:5000 TTL 12");
}

#[test]
fn marks_unknown_ttl() {
    let mut record = record(b"");
    record.ttl = -1;

    let (line, _) = packet_line(&record);

    assert!(line.ends_with("TTL ?"));
}

#[test]
fn describes_beacon_packet() {
    let mut beacon = BeaconRecord::new(b"sender-host");
    beacon.sequence = 9;
    beacon.time_nanos = 1_000_000_000 * 3600;

    let (line, is_beacon) = packet_line(&record(&beacon.to_raw()));

    assert!(is_beacon);
    assert_eq!(
        line,
        "13:45:07.250 10.0.0.5:40000->239.1.2.3:5000 TTL 12, \
         malt pkt seq #9 | sender-host 01:00:00.000"
    );
}

#[test]
fn dumps_payload_in_rows_of_sixteen() {
    let payload = b"0123456789abcdef\x00XY";

    let dump = hexdump(payload);
    let lines = dump.lines().collect::<Vec<_>>();

    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "  30 31 32 33 34 35 36 37  38 39 61 62 63 64 65 66  0123456789abcdef"
    );
    assert!(lines[1].starts_with("  00 58 59 "));
    assert!(lines[1].ends_with(" .XY"));
    assert_eq!(lines[0].len(), lines[1].len() + 13);
}

#[test]
fn reports_no_traffic() {
    let table = FlowTable::new();

    assert_eq!(
        receive_report(GROUP, None, &table),
        "No traffic received for 239.1.2.3:* in 0.000 sec"
    );
}

#[test]
fn reports_flows_in_table() {
    let mut table = FlowTable::new();
    {
        let _timer = table.start_timer();
    }
    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 9), 1000, 6000), 56);
    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 5), 2000, 5000), 100);

    let report = receive_report(GROUP, Some(5000), &table);
    let lines = report.lines().collect::<Vec<_>>();

    assert!(lines[0].starts_with("Traffic received for 239.1.2.3:5000 in "));
    assert!(lines[1].starts_with("Source"));
    assert!(lines[1].contains("DPort"));
    assert!(lines[1].contains("Rate"));
    assert!(lines[2].starts_with("====="));
    assert!(lines[3].starts_with("10.0.0.5:2000"));
    assert!(lines[3].contains(" 144 "));
    assert!(lines[4].starts_with("10.0.0.9:1000"));
    assert!(lines[4].contains(" 100 "));
}

#[test]
fn colored_table_keeps_layout() {
    let mut table = FlowTable::new();
    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 5), 2000, 5000), 100);
    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 6), 2000, 5000), 100);

    let plain = flow_table(&table, false);
    let colored = flow_table(&table, true);

    assert_eq!(colored.len(), 2);
    assert_eq!(colored.to_string(), plain.to_string());
}

fn sink(colors: bool) -> ConsoleSink {
    ConsoleSink {
        group: GROUP,
        port: Some(5000),
        show_payload: false,
        colors,
    }
}

#[test]
fn paints_only_with_colors_enabled() {
    let painted = sink(true).paint(BEACON_TAGS, "seq #1");

    assert!(painted.contains("seq #1"));
    assert!(painted.starts_with("\x1b["));
    assert!(!painted.contains("<bright-red>"));

    assert_eq!(sink(false).paint(BEACON_TAGS, "seq #1"), "seq #1");
}
