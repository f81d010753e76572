// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Recording behaviour of the messaging and scheduler facades.

mod common;

use actor_instruments::{
    names, ConnectionDirection, Direction, GuardPolicy, InstrumentRegistry, InstrumentsConfig,
    Instruments, MetricsProvider, Phase, ValidityGuard,
};
use common::{counter, counter_total, find, harness, harness_with, series_of, TestMessage};
use metrics_util::debugging::DebuggingRecorder;
use rand::seq::SliceRandom;

// ============ Counter Scenarios ============

#[test]
fn test_pings_are_counted_per_destination() {
    let h = harness();
    let messaging = &h.instruments.messaging;

    for _ in 0..3 {
        messaging.on_ping_send(&"node-a:11111");
    }
    messaging.on_ping_send(&"node-b:11111");

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::MESSAGING_PINGS_SENT, &[("Destination", "node-a:11111")]),
        Some(3)
    );
    assert_eq!(
        counter(&snapshot, names::MESSAGING_PINGS_SENT, &[("Destination", "node-b:11111")]),
        Some(1)
    );
    assert!(series_of(&snapshot, names::MESSAGING_PINGS_RECEIVED).is_empty());
}

#[test]
fn test_each_ping_event_has_its_own_instrument() {
    let h = harness();
    let messaging = &h.instruments.messaging;
    let node = std::net::SocketAddr::from(([10, 0, 0, 3], 11111));

    messaging.on_ping_send(&node);
    messaging.on_ping_receive(&node);
    messaging.on_ping_receive(&node);
    messaging.on_ping_reply_received(&node);
    messaging.on_ping_reply_missed(&node);
    messaging.on_ping_reply_missed(&node);
    messaging.on_ping_reply_missed(&node);

    let snapshot = h.snapshot();
    let tags = [("Destination", "10.0.0.3:11111")];
    assert_eq!(counter(&snapshot, names::MESSAGING_PINGS_SENT, &tags), Some(1));
    assert_eq!(counter(&snapshot, names::MESSAGING_PINGS_RECEIVED, &tags), Some(2));
    assert_eq!(counter(&snapshot, names::MESSAGING_PINGS_REPLY_RECEIVED, &tags), Some(1));
    assert_eq!(counter(&snapshot, names::MESSAGING_PINGS_REPLY_MISSED, &tags), Some(3));
}

#[test]
fn test_expired_messages_are_counted_per_phase() {
    let h = harness();
    let messaging = &h.instruments.messaging;

    messaging.on_message_expired(Phase::Dispatch);
    messaging.on_message_expired(Phase::Dispatch);
    messaging.on_message_expired(Phase::Invoke);

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::MESSAGING_EXPIRED, &[("Phase", "Dispatch")]),
        Some(2)
    );
    assert_eq!(
        counter(&snapshot, names::MESSAGING_EXPIRED, &[("Phase", "Invoke")]),
        Some(1)
    );
    // No other phase is ever exported.
    assert_eq!(series_of(&snapshot, names::MESSAGING_EXPIRED).len(), 2);
}

#[test]
fn test_repeated_increments_leave_other_series_untouched() {
    let h = harness();
    let messaging = &h.instruments.messaging;
    let request = TestMessage(Some(Direction::Request));

    messaging.on_rejected_message(Some(&TestMessage(Some(Direction::Response))));
    for _ in 0..25 {
        messaging.on_rejected_message(Some(&request));
    }

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::MESSAGING_REJECTED, &[("Direction", "Request")]),
        Some(25)
    );
    assert_eq!(
        counter(&snapshot, names::MESSAGING_REJECTED, &[("Direction", "Response")]),
        Some(1)
    );
    assert_eq!(counter_total(&snapshot, names::MESSAGING_SENT_FAILED), 0);
    assert_eq!(counter_total(&snapshot, names::MESSAGING_SENT_DROPPED), 0);
    assert_eq!(counter_total(&snapshot, names::MESSAGING_REROUTED), 0);
}

#[test]
fn test_local_sends_and_client_connections() {
    let h = harness();
    let messaging = &h.instruments.messaging;

    messaging.on_local_message_sent();
    messaging.on_local_message_sent();
    messaging.on_client_connected();

    let snapshot = h.snapshot();
    assert_eq!(counter(&snapshot, names::MESSAGING_SENT_LOCAL_MESSAGES, &[]), Some(2));
    assert_eq!(counter(&snapshot, names::GATEWAY_CONNECTED_CLIENTS, &[]), Some(1));
}

#[test]
fn test_long_running_turns() {
    let h = harness();
    let scheduler = &h.instruments.scheduler;

    scheduler.on_long_running_turn(Phase::Invoke);
    scheduler.on_long_running_turn(Phase::Invoke);

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::SCHEDULER_LONG_RUNNING_TURNS, &[("Phase", "Invoke")]),
        Some(2)
    );
}

// ============ Guard Policy Tests ============

#[test]
fn test_unclassifiable_guarded_events_change_nothing() {
    let h = harness();
    let messaging = &h.instruments.messaging;
    let no_direction = TestMessage(None);

    messaging.on_failed_sent_message(None::<&TestMessage>);
    messaging.on_dropped_sent_message(None::<&TestMessage>);
    messaging.on_rejected_message(None::<&TestMessage>);
    messaging.on_failed_sent_message(Some(&no_direction));
    messaging.on_dropped_sent_message(Some(&no_direction));
    messaging.on_rejected_message(Some(&no_direction));

    let snapshot = h.snapshot();
    for name in [
        names::MESSAGING_SENT_FAILED,
        names::MESSAGING_SENT_DROPPED,
        names::MESSAGING_REJECTED,
    ] {
        assert!(series_of(&snapshot, name).is_empty(), "{name} was recorded");
    }
}

#[test]
fn test_classified_guarded_events_are_counted() {
    let h = harness();
    let messaging = &h.instruments.messaging;
    let one_way = TestMessage(Some(Direction::OneWay));

    messaging.on_failed_sent_message(Some(&one_way));
    messaging.on_dropped_sent_message(Some(&one_way));
    messaging.on_dropped_sent_message(Some(&one_way));

    let snapshot = h.snapshot();
    let tags = [("Direction", "OneWay")];
    assert_eq!(counter(&snapshot, names::MESSAGING_SENT_FAILED, &tags), Some(1));
    assert_eq!(counter(&snapshot, names::MESSAGING_SENT_DROPPED, &tags), Some(2));
}

#[test]
fn test_reroute_is_trusted_by_default() {
    let h = harness();
    assert_eq!(
        h.instruments.messaging.guard_policy().rerouted,
        ValidityGuard::Trust
    );

    h.instruments
        .messaging
        .on_message_reroute(Some(&TestMessage(Some(Direction::Request))));

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::MESSAGING_REROUTED, &[("Direction", "Request")]),
        Some(1)
    );
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "no message")]
fn test_trusted_reroute_without_message_asserts() {
    let h = harness();
    h.instruments
        .messaging
        .on_message_reroute(None::<&TestMessage>);
}

#[test]
fn test_reroute_can_be_suppressed_by_policy() {
    let policy = GuardPolicy {
        rerouted: ValidityGuard::Suppress,
        ..GuardPolicy::default()
    };
    let h = harness_with(InstrumentsConfig::new().with_guard_policy(policy));
    let messaging = &h.instruments.messaging;

    messaging.on_message_reroute(None::<&TestMessage>);
    messaging.on_message_reroute(Some(&TestMessage(None)));

    let snapshot = h.snapshot();
    assert!(series_of(&snapshot, names::MESSAGING_REROUTED).is_empty());
}

#[test]
#[cfg(not(debug_assertions))]
fn test_trusted_failed_records_none_direction() {
    let h = harness_with(
        InstrumentsConfig::new().with_guard_policy(GuardPolicy::uniform(ValidityGuard::Trust)),
    );

    h.instruments
        .messaging
        .on_failed_sent_message(Some(&TestMessage(None)));

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::MESSAGING_SENT_FAILED, &[("Direction", "None")]),
        Some(1)
    );
}

// ============ Message Size Tests ============

#[test]
fn test_send_records_size_and_header_bytes() {
    let h = harness();
    let msg = TestMessage(Some(Direction::Request));

    h.instruments
        .messaging
        .on_message_send(&msg, 512, 32, ConnectionDirection::Outbound, None);

    let snapshot = h.snapshot();
    let sizes = series_of(&snapshot, names::MESSAGING_SENT_MESSAGES_SIZE);
    assert_eq!(sizes.len(), 1);
    assert_eq!(
        sizes[0].labels,
        vec![
            ("ConnectionDirection".to_owned(), "Outbound".to_owned()),
            ("MessageDirection".to_owned(), "Request".to_owned()),
        ]
    );
    assert_eq!(sizes[0].samples(), vec![512.0]);
    assert_eq!(counter(&snapshot, names::MESSAGING_SENT_BYTES_HEADER, &[]), Some(32));
    assert!(series_of(&snapshot, names::MESSAGING_RECEIVED_MESSAGES_SIZE).is_empty());
}

#[test]
fn test_remote_node_selects_a_separate_series() {
    let h = harness();
    let messaging = &h.instruments.messaging;
    let msg = TestMessage(Some(Direction::Response));

    messaging.on_message_receive(&msg, 100, 10, ConnectionDirection::Inbound, None);
    for total in [300, 500] {
        messaging.on_message_receive(
            &msg,
            total,
            10,
            ConnectionDirection::Inbound,
            Some(&"node-7:11111"),
        );
    }

    let snapshot = h.snapshot();
    let local = find(
        &snapshot,
        names::MESSAGING_RECEIVED_MESSAGES_SIZE,
        &[("ConnectionDirection", "Inbound"), ("MessageDirection", "Response")],
    )
    .expect("series without remote node");
    let remote = find(
        &snapshot,
        names::MESSAGING_RECEIVED_MESSAGES_SIZE,
        &[
            ("ConnectionDirection", "Inbound"),
            ("MessageDirection", "Response"),
            ("RemoteNode", "node-7:11111"),
        ],
    )
    .expect("series with remote node");

    assert_eq!(local.samples(), vec![100.0]);
    assert_eq!(remote.samples(), vec![300.0, 500.0]);
    assert_eq!(
        counter(&snapshot, names::MESSAGING_RECEIVED_BYTES_HEADER, &[]),
        Some(30)
    );
}

#[test]
fn test_size_of_message_without_direction_is_tagged_none() {
    let h = harness();

    h.instruments
        .messaging
        .on_message_send(&TestMessage(None), 64, 8, ConnectionDirection::Outbound, None);

    let snapshot = h.snapshot();
    assert!(find(
        &snapshot,
        names::MESSAGING_SENT_MESSAGES_SIZE,
        &[("ConnectionDirection", "Outbound"), ("MessageDirection", "None")],
    )
    .is_some());
}

#[test]
fn test_header_bytes_are_order_independent() {
    let msg = TestMessage(Some(Direction::OneWay));
    let mut headers: Vec<usize> = (1..=40).map(|i| i * 3).collect();
    let expected: u64 = headers.iter().map(|&b| b as u64).sum();

    let mut rng = rand::rng();
    for _ in 0..3 {
        headers.shuffle(&mut rng);
        let h = harness();
        let messaging = &h.instruments.messaging;

        for (i, &bytes) in headers.iter().enumerate() {
            let connection = if i % 2 == 0 {
                ConnectionDirection::Inbound
            } else {
                ConnectionDirection::Outbound
            };
            messaging.on_message_send(&msg, bytes * 10, bytes, connection, None);
            messaging.on_message_receive(&msg, bytes * 10, bytes, connection, None);
        }

        let snapshot = h.snapshot();
        assert_eq!(
            counter(&snapshot, names::MESSAGING_SENT_BYTES_HEADER, &[]),
            Some(expected)
        );
        assert_eq!(
            counter(&snapshot, names::MESSAGING_RECEIVED_BYTES_HEADER, &[]),
            Some(expected)
        );
    }
}

// ============ Provider Tests ============

/// Calls every recording operation once.
fn record_every_event(instruments: &Instruments) {
    let messaging = &instruments.messaging;
    let msg = TestMessage(Some(Direction::Request));

    messaging.on_message_expired(Phase::Send);
    messaging.on_ping_send(&"n");
    messaging.on_ping_receive(&"n");
    messaging.on_ping_reply_received(&"n");
    messaging.on_ping_reply_missed(&"n");
    messaging.on_failed_sent_message(Some(&msg));
    messaging.on_dropped_sent_message(Some(&msg));
    messaging.on_rejected_message(Some(&msg));
    messaging.on_message_reroute(Some(&msg));
    messaging.on_message_send(&msg, 1, 1, ConnectionDirection::Outbound, Some(&"n"));
    messaging.on_message_receive(&msg, 1, 1, ConnectionDirection::Inbound, None);
    messaging.on_local_message_sent();
    messaging.on_client_connected();
    instruments.scheduler.on_long_running_turn(Phase::Invoke);
}

#[test]
fn test_disabled_provider_records_nothing() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let registry = InstrumentRegistry::new(InstrumentsConfig::new().disabled());
        assert!(!registry.provider().is_enabled());
        let instruments = Instruments::new(&registry);
        record_every_event(&instruments);
    });

    assert!(snapshotter.snapshot().into_vec().is_empty());
}

#[test]
fn test_global_provider_records_into_recorder_in_scope() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let registry = InstrumentRegistry::new(
            InstrumentsConfig::new().with_provider(MetricsProvider::Global),
        );
        let instruments = Instruments::new(&registry);
        record_every_event(&instruments);
    });

    let snapshot = snapshotter.snapshot().into_vec();
    // One series per instrument.
    assert_eq!(snapshot.len(), 16);
}

#[test]
fn test_global_provider_without_recorder_is_noop() {
    let registry = InstrumentRegistry::new(
        InstrumentsConfig::new().with_provider(MetricsProvider::Global),
    );
    let instruments = Instruments::new(&registry);

    record_every_event(&instruments);
}

#[test]
fn test_facades_share_registry_instruments() {
    let h = harness();
    let second = Instruments::new(&h.registry);

    h.instruments.messaging.on_message_expired(Phase::Respond);
    second.messaging.on_message_expired(Phase::Respond);

    let snapshot = h.snapshot();
    assert_eq!(
        counter(&snapshot, names::MESSAGING_EXPIRED, &[("Phase", "Respond")]),
        Some(2)
    );
}

#[test]
fn test_custom_prefix() {
    let config = InstrumentsConfig::new().with_prefix("gateway").unwrap();
    let h = harness_with(config);

    h.instruments.messaging.on_client_connected();

    let snapshot = h.snapshot();
    assert!(snapshot
        .iter()
        .any(|s| s.name == "gateway-gateway-connected-clients"));
    assert!(snapshot.iter().all(|s| s.name.starts_with("gateway-")));
}
