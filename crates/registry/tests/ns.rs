//! Scenario-level tests for the protocol handler, mirroring the literal
//! walkthroughs used to validate the name-service's reactive behaviour.

use registry::{
    addr::QrtrAddr,
    handler::{Handler, Outbound, Wire},
};
use codec::control::{ClientFields, ControlPacket, ServerFields};

const LOCAL: u32 = 1;

fn addr(node: u32, port: u32) -> QrtrAddr {
    QrtrAddr::new(node, port)
}

fn ctrl(dest: QrtrAddr, p: ControlPacket) -> Outbound {
    Outbound { dest, wire: Wire::Control, bytes: p.encode().to_vec() }
}

/// Seeds the registry with a server record, the same way a prior
/// `NEW_SERVER` would, discarding whatever it fans out.
fn seed(h: &mut Handler, node: u32, port: u32, service: u32, instance: u32) {
    h.handle_control(addr(node, port), ControlPacket::NewServer(ServerFields { service, instance, node, port }));
}

#[test]
fn scenario_1_hello_replays_local_catalog() {
    let mut h = Handler::new(LOCAL);
    seed(&mut h, LOCAL, 100, 1, 0x10001);

    let out = h.handle_control(addr(2, 0xFFFF_FFFE), ControlPacket::Hello);

    assert_eq!(
        out,
        vec![
            ctrl(addr(2, 0xFFFF_FFFE), ControlPacket::Hello),
            ctrl(
                addr(2, 0xFFFF_FFFE),
                ControlPacket::NewServer(ServerFields { service: 1, instance: 0x10001, node: LOCAL, port: 100 })
            ),
        ]
    );
}

#[test]
fn scenario_2_new_lookup_snapshot_then_terminator() {
    let mut h = Handler::new(LOCAL);
    seed(&mut h, 5, 200, 3, 1);
    seed(&mut h, 5, 201, 3, 2);
    seed(&mut h, 5, 202, 4, 1);

    let subscriber = addr(LOCAL, 42);
    let out = h.handle_control(subscriber, ControlPacket::NewLookup { service: 3, instance: 0 });

    assert_eq!(out.len(), 3);
    assert_eq!(out.last().unwrap(), &ctrl(subscriber, ControlPacket::LookupResult(ServerFields::default())));

    let matches: Vec<_> = out[..2]
        .iter()
        .map(|o| ControlPacket::decode(&o.bytes).unwrap())
        .collect();
    assert!(matches.contains(&ControlPacket::LookupResult(ServerFields { service: 3, instance: 1, node: 5, port: 200 })));
    assert!(matches.contains(&ControlPacket::LookupResult(ServerFields { service: 3, instance: 2, node: 5, port: 201 })));
}

#[test]
fn scenario_3_new_server_broadcasts_and_notifies_subscribers() {
    let mut h = Handler::new(LOCAL);
    h.handle_control(addr(LOCAL, 10), ControlPacket::NewLookup { service: 7, instance: 0 });
    h.handle_control(addr(LOCAL, 11), ControlPacket::NewLookup { service: 0, instance: 0 });

    let out = h.handle_control(
        addr(LOCAL, 300),
        ControlPacket::NewServer(ServerFields { service: 7, instance: 0x20001, node: LOCAL, port: 300 }),
    );

    let expected_result = ControlPacket::LookupResult(ServerFields { service: 7, instance: 0x20001, node: LOCAL, port: 300 });
    assert!(out.contains(&ctrl(
        QrtrAddr::broadcast_ctrl(),
        ControlPacket::NewServer(ServerFields { service: 7, instance: 0x20001, node: LOCAL, port: 300 })
    )));
    assert!(out.contains(&ctrl(addr(LOCAL, 10), expected_result.clone())));
    assert!(out.contains(&ctrl(addr(LOCAL, 11), expected_result)));
}

#[test]
fn scenario_4_del_client_broadcasts_del_server_and_forwards_to_remaining_local_service() {
    let mut h = Handler::new(LOCAL);
    seed(&mut h, LOCAL, 300, 7, 0x20001);
    seed(&mut h, LOCAL, 400, 9, 1);

    let out = h.handle_control(addr(LOCAL, 300), ControlPacket::DelClient(ClientFields { node: LOCAL, port: 300 }));

    assert_eq!(
        out,
        vec![
            ctrl(
                QrtrAddr::broadcast_ctrl(),
                ControlPacket::DelServer(ServerFields { service: 7, instance: 0x20001, node: LOCAL, port: 300 })
            ),
            ctrl(addr(LOCAL, 400), ControlPacket::DelClient(ClientFields { node: LOCAL, port: 300 })),
        ]
    );
    assert!(!out.iter().any(|o| matches!(ControlPacket::decode(&o.bytes), Ok(ControlPacket::LookupResult(_)))));
}

#[test]
fn scenario_5_bye_purges_node_and_notifies_every_local_service() {
    let mut h = Handler::new(LOCAL);
    seed(&mut h, 5, 10, 1, 0);
    seed(&mut h, 5, 11, 2, 0);
    seed(&mut h, 5, 12, 3, 0);
    seed(&mut h, LOCAL, 400, 9, 1);
    seed(&mut h, LOCAL, 401, 10, 1);

    let out = h.handle_control(addr(5, 0xFFFF_FFFE), ControlPacket::Bye);

    assert_eq!(
        out,
        vec![
            ctrl(addr(LOCAL, 400), ControlPacket::Bye),
            ctrl(addr(LOCAL, 401), ControlPacket::Bye),
        ]
    );
    assert!(h.registry.get_node(5).unwrap().services.is_empty());
}

#[test]
fn scenario_6_lookup_result_round_trips() {
    let original = ControlPacket::LookupResult(ServerFields { service: 0x12345678, instance: 0x9ABCDEF0, node: 7, port: 300 });
    let bytes = original.encode();
    assert_eq!(ControlPacket::decode(&bytes).unwrap(), original);
}

#[test]
fn p7_remote_server_changes_produce_no_broadcast() {
    let mut h = Handler::new(LOCAL);
    let out = h.handle_control(
        addr(2, 100),
        ControlPacket::NewServer(ServerFields { service: 1, instance: 0, node: 2, port: 100 }),
    );
    assert!(out.is_empty());

    let out = h.handle_control(
        addr(2, 100),
        ControlPacket::DelServer(ServerFields { service: 1, instance: 0, node: 2, port: 100 }),
    );
    assert!(out.is_empty());
}

#[test]
fn p6_subscriber_cleanup_stops_future_notifications() {
    let mut h = Handler::new(LOCAL);
    h.handle_control(addr(LOCAL, 42), ControlPacket::NewLookup { service: 7, instance: 0 });
    h.handle_control(addr(LOCAL, 42), ControlPacket::DelClient(ClientFields { node: LOCAL, port: 42 }));

    let out = h.handle_control(
        addr(LOCAL, 300),
        ControlPacket::NewServer(ServerFields { service: 7, instance: 1, node: LOCAL, port: 300 }),
    );
    assert!(!out.iter().any(|o| o.dest == addr(LOCAL, 42)));
}
