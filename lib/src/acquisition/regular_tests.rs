use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use nix::sys::socket::getsockopt;

use super::*;

fn loopback_config(port: u16) -> Config {
    Config::builder()
        .group(Ipv4Addr::new(239, 255, 0, 1))
        .port(port)
        .interface("lo")
        .interface_addr(Ipv4Addr::LOCALHOST)
        .build()
        .unwrap()
}

#[test]
fn receives_payload_with_ttl() {
    let strategy = RegularAcquisition::new();
    let socket = strategy.open_socket().unwrap();
    strategy.configure_socket(&socket).unwrap();

    let bind = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    socket.bind(&bind.into()).unwrap();
    let port = socket
        .local_addr()
        .unwrap()
        .as_socket_ipv4()
        .unwrap()
        .port();

    let config = loopback_config(port);

    let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    client.set_ttl(42).unwrap();
    client.send_to(b"hello", (Ipv4Addr::LOCALHOST, port)).unwrap();
    let client_port = client.local_addr().unwrap().port();

    let mut strategy = strategy;
    let mut record = PacketRecord::new(config.group());

    let reception = strategy
        .receive_packet(&socket, &mut record, &config, 77)
        .unwrap();

    assert_eq!(reception, Reception::Accepted);
    assert_eq!(record.payload(), b"hello");
    assert_eq!(record.source, Ipv4Addr::LOCALHOST);
    assert_eq!(record.sport, client_port);
    assert_eq!(record.group, config.group());
    assert_eq!(record.dport, port);
    assert_eq!(record.ttl, 42);
    assert_eq!(record.timestamp, 77);
}

#[test]
fn filters_when_nothing_is_pending() {
    let mut strategy = RegularAcquisition::new();
    let socket = strategy.open_socket().unwrap();
    socket.set_nonblocking(true).unwrap();

    let bind = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    socket.bind(&bind.into()).unwrap();

    let config = loopback_config(9);
    let mut record = PacketRecord::new(config.group());
    record.set_payload(b"kept");

    let reception = strategy
        .receive_packet(&socket, &mut record, &config, 1)
        .unwrap();

    assert_eq!(reception, Reception::Filtered);
    assert_eq!(record.payload(), b"kept");
}

#[test]
fn configures_ttl_reception() {
    let strategy = RegularAcquisition::new();
    let socket = strategy.open_socket().unwrap();

    assert!(!getsockopt(&socket, sockopt::Ipv4RecvTtl).unwrap());

    strategy.configure_socket(&socket).unwrap();

    assert!(getsockopt(&socket, sockopt::Ipv4RecvTtl).unwrap());
}
