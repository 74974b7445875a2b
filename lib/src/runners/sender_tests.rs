use mockall::{Sequence, predicate::*};
use std::net::{Ipv4Addr, UdpSocket};

use super::*;

use crate::{config::Mode, packet::beacon, runners::MockSink};

fn loopback_config(count: u64) -> Config {
    Config::builder()
        .group(Ipv4Addr::new(239, 255, 77, 2))
        .port(23457u16)
        .interface("lo")
        .interface_addr(Ipv4Addr::LOCALHOST)
        .mode(Mode::Sender)
        .ttl(1u32)
        .count(count)
        .build()
        .unwrap()
}

#[test]
fn sends_count_beacons_in_sequence() {
    let mut seq = Sequence::new();
    let mut sink = MockSink::new();

    for expected in 0..3u64 {
        sink.expect_on_sent_beacon()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |beacon| {
                beacon.sequence == expected && beacon.time_nanos > 0
            })
            .returning(|_| ());
    }

    sink.expect_on_send_stats_final()
        .with(eq(3))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| ());

    let stop = Arc::new(AtomicBool::new(false));
    let mut sender = Sender::new(loopback_config(3), Box::new(sink), stop)
        .interval(Duration::from_millis(10));

    assert!(sender.run().is_ok());
}

#[test]
fn reports_nothing_sent_when_stopped() {
    let mut sink = MockSink::new();
    sink.expect_on_sent_beacon().never();
    sink.expect_on_send_stats_final()
        .with(eq(0))
        .times(1)
        .returning(|_| ());

    let stop = Arc::new(AtomicBool::new(true));
    let mut sender = Sender::new(loopback_config(0), Box::new(sink), stop);

    assert!(sender.run().is_ok());
}

#[test]
fn stops_on_request_between_beacons() {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_after_second = Arc::clone(&stop);

    let mut sink = MockSink::new();
    sink.expect_on_sent_beacon()
        .times(2)
        .returning(move |beacon| {
            if beacon.sequence == 1 {
                stop_after_second.store(true, Ordering::Relaxed);
            }
        });
    sink.expect_on_send_stats_final()
        .with(eq(2))
        .times(1)
        .returning(|_| ());

    let mut sender = Sender::new(loopback_config(0), Box::new(sink), stop)
        .interval(Duration::from_millis(10));

    assert!(sender.run().is_ok());
}

#[test]
fn uses_default_interval() {
    let sender = Sender::new(
        loopback_config(1),
        Box::new(MockSink::new()),
        Arc::new(AtomicBool::new(false)),
    );

    assert_eq!(sender.interval, DEFAULT_SEND_INTERVAL);
}

#[test]
fn transmits_current_counters_on_the_wire() {
    let group = Ipv4Addr::new(239, 255, 77, 3);
    let listener = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
    listener
        .join_multicast_v4(&group, &Ipv4Addr::LOCALHOST)
        .unwrap();
    listener
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = Config::builder()
        .group(group)
        .port(port)
        .interface("lo")
        .interface_addr(Ipv4Addr::LOCALHOST)
        .mode(Mode::Sender)
        .ttl(1u32)
        .count(2u64)
        .build()
        .unwrap();

    let mut sink = MockSink::new();
    sink.expect_on_sent_beacon().times(2).returning(|_| ());
    sink.expect_on_send_stats_final().returning(|_| ());

    let stop = Arc::new(AtomicBool::new(false));
    let mut sender = Sender::new(config, Box::new(sink), stop)
        .interval(Duration::from_millis(10));

    assert!(sender.run().is_ok());

    let mut buf = [0u8; 128];
    for expected in 0..2u64 {
        let len = listener.recv(&mut buf).unwrap();
        let view = beacon::decode(&buf[..len]).unwrap();
        assert_eq!(view.sequence, expected);
        assert!(view.time_nanos > 0);
    }
}
