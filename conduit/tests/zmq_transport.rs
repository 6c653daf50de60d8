//! Channels over libzmq (requires the `zmq` feature and a system libzmq).

mod common;

use common::settings;
use conduit::zmq_transport::ZmqTransport;
use conduit::{ConduitError, Connection, MessagingContext};
use serde_json::json;

fn distributed_context() -> MessagingContext<ZmqTransport> {
    let mut context = MessagingContext::new(ZmqTransport::new());
    context
        .initialize(&settings(json!({
            "storm.cluster.mode": "distributed",
            "zmq.linger.millis": 0,
        })))
        .unwrap();
    context
}

#[test]
fn test_push_pull_over_tcp() {
    conduit::dev_tracing::init_tracing();
    let port = portpicker::pick_unused_port().expect("no free port");
    let mut context = distributed_context();

    let mut receiver = context.bind("T1", port).unwrap();
    let mut sender = context.connect("T1", "127.0.0.1", port).unwrap();

    sender.send("hello").unwrap();
    sender.send("world").unwrap();
    assert_eq!(receiver.receive().unwrap(), "hello");
    assert_eq!(receiver.receive().unwrap(), "world");
    assert!(receiver.try_receive().unwrap().is_none());

    sender.close().unwrap();
    receiver.close().unwrap();
    context.terminate().unwrap();
}

#[test]
fn test_second_bind_reports_addr_in_use() {
    let port = portpicker::pick_unused_port().expect("no free port");
    let mut context = distributed_context();

    let first = context.bind("T1", port).unwrap();
    let err = context.bind("T1", port).unwrap_err();
    assert!(err.is_addr_in_use(), "unexpected error: {err}");

    first.close().unwrap();
    context.terminate().unwrap();
}

#[test]
fn test_connect_to_absent_peer_succeeds() {
    let port = portpicker::pick_unused_port().expect("no free port");
    let mut context = distributed_context();

    let sender = context.connect("T1", "127.0.0.1", port).unwrap();
    sender.close().unwrap();
    context.terminate().unwrap();
    assert!(matches!(context.terminate(), Err(ConduitError::NotInitialized)));
}
