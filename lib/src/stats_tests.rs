use super::*;

#[test]
fn packs_flow_key_fields() {
    let source = Ipv4Addr::new(192, 168, 1, 20);
    let key = FlowKey::new(source, 40000, 5000);

    assert_eq!(key.source(), source);
    assert_eq!(key.sport(), 40000);
    assert_eq!(key.dport(), 5000);
    assert_eq!(
        key.raw(),
        (5000u64 << 48) | (0xC0A8_0114u64 << 16) | 40000
    );
}

#[test]
fn flow_key_round_trips_through_raw() {
    let samples = [
        (Ipv4Addr::new(0, 0, 0, 0), 0, 0),
        (Ipv4Addr::new(255, 255, 255, 255), u16::MAX, u16::MAX),
        (Ipv4Addr::new(10, 1, 2, 3), 1, 65534),
    ];

    for (source, sport, dport) in samples {
        let key = FlowKey::new(source, sport, dport);
        let unpacked = FlowKey::from_raw(key.raw());

        assert_eq!(unpacked, key);
        assert_eq!(unpacked.source(), source);
        assert_eq!(unpacked.sport(), sport);
        assert_eq!(unpacked.dport(), dport);
    }
}

#[test]
fn enumerates_by_destination_port_first() {
    let source = Ipv4Addr::new(10, 0, 0, 1);
    let mut table = FlowTable::new();

    table.update(FlowKey::new(source, 1234, 500), 1);
    table.update(FlowKey::new(source, 1234, 100), 1);
    table.update(FlowKey::new(source, 1234, 300), 1);

    let ports = table.iter().map(|(key, _)| key.dport()).collect::<Vec<_>>();

    assert_eq!(ports, vec![100, 300, 500]);
}

#[test]
fn orders_by_source_within_port() {
    let mut table = FlowTable::new();

    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 9), 1, 5000), 1);
    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 2), 7, 5000), 1);
    table.update(FlowKey::new(Ipv4Addr::new(10, 0, 0, 2), 3, 5000), 1);

    let flows = table
        .iter()
        .map(|(key, _)| (key.source(), key.sport()))
        .collect::<Vec<_>>();

    assert_eq!(
        flows,
        vec![
            (Ipv4Addr::new(10, 0, 0, 2), 3),
            (Ipv4Addr::new(10, 0, 0, 2), 7),
            (Ipv4Addr::new(10, 0, 0, 9), 1),
        ]
    );
}

#[test]
fn accumulates_bytes_with_framing_overhead() {
    let key = FlowKey::new(Ipv4Addr::new(10, 0, 0, 1), 1000, 2000);
    let mut table = FlowTable::new();

    table.update(key, 10);
    table.update(key, 20);
    table.update(key, 30);

    let stats = table.get(key).unwrap();
    assert_eq!(stats.packets(), 3);
    // (10 + 44) + (20 + 44) + (30 + 44)
    assert_eq!(stats.bytes(), 192);
    assert_eq!(stats.avg_packet_size(), 64);
    assert_eq!(table.len(), 1);
    assert_eq!(table.total_packets(), 3);
}

#[test]
fn empty_table_reports_nothing() {
    let table = FlowTable::new();

    assert!(table.is_empty());
    assert_eq!(table.iter().count(), 0);
    assert_eq!(table.total_packets(), 0);
    assert_eq!(table.duration(), Duration::ZERO);
}

#[test]
fn timer_records_duration_on_drop() {
    let table = FlowTable::new();

    {
        let _timer = table.start_timer();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(table.duration(), Duration::ZERO);
    }

    assert!(table.duration() >= Duration::from_millis(20));
}
