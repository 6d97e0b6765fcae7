//! End-to-end scenarios: upstream frames in, subscriber frames or exchange
//! publishes out.

use crate::support::{settle, NotifierStack, RecordingExchangeClient, TestSubscriber};
use notifier_data::{
    BlockEvents, Event, EventType, FinalizedBlock, RevertBlock, SubscribeEvent, SubscriptionEntry,
    WireEventKind,
};
use notifier_fanout::ExchangeClient;
use notifier_ingest::{topics, IngestError, PAYLOAD_VERSION_V1};
use notifier_runtime::{
    create_egress, create_payload_handler, ApiType, HubSettings, NotifierConfig, RabbitMqConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn event(address: &str, identifier: &str, topics: &[&str]) -> Event {
    Event {
        address: address.to_string(),
        identifier: identifier.to_string(),
        topics: topics.iter().map(|t| t.as_bytes().to_vec()).collect(),
        data: vec![0x01],
        tx_hash: "0xtx".to_string(),
    }
}

fn save_block_frame(hash: &str, events: Vec<Event>) -> Vec<u8> {
    serde_json::to_vec(&BlockEvents {
        hash: hash.to_string(),
        shard_id: 1,
        timestamp: 1_700_000_000,
        events,
    })
    .unwrap()
}

fn subscribe(stack: &NotifierStack, subscriber: &TestSubscriber, entries: Vec<SubscriptionEntry>) {
    stack
        .hub()
        .subscribe(SubscribeEvent {
            dispatcher_id: subscriber.id,
            entries,
        })
        .unwrap();
}

fn delivered_events(frame: &notifier_data::WireEvent) -> Vec<Event> {
    assert_eq!(frame.kind, WireEventKind::BlockEvents);
    serde_json::from_value(frame.data.clone()).unwrap()
}

#[tokio::test]
async fn test_wildcard_subscriber_receives_broadcast() {
    let stack = NotifierStack::hub_backed();
    let subscriber = TestSubscriber::attach(stack.hub(), 8);
    subscribe(
        &stack,
        &subscriber,
        vec![SubscriptionEntry {
            event_type: EventType::All,
            ..Default::default()
        }],
    );
    settle().await;

    let expected = event("erd1x", "transfer", &["T1"]);
    stack
        .handler
        .process_payload(
            &save_block_frame("0xaa", vec![expected.clone()]),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();

    let frames = subscriber.wait_for_frames(1).await;
    assert_eq!(delivered_events(&frames[0]), vec![expected]);
}

#[tokio::test]
async fn test_address_filters_partition_subscribers() {
    let stack = NotifierStack::hub_backed();
    let d1 = TestSubscriber::attach(stack.hub(), 8);
    let d2 = TestSubscriber::attach(stack.hub(), 8);
    subscribe(
        &stack,
        &d1,
        vec![SubscriptionEntry {
            address: Some("erd1x".to_string()),
            ..Default::default()
        }],
    );
    subscribe(
        &stack,
        &d2,
        vec![SubscriptionEntry {
            address: Some("erd1y".to_string()),
            ..Default::default()
        }],
    );
    settle().await;

    let at_x = event("erd1x", "transfer", &[]);
    let at_y = event("erd1y", "transfer", &[]);
    stack
        .handler
        .process_payload(
            &save_block_frame("0xaa", vec![at_x.clone(), at_y.clone()]),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();

    let frames1 = d1.wait_for_frames(1).await;
    let frames2 = d2.wait_for_frames(1).await;
    assert_eq!(delivered_events(&frames1[0]), vec![at_x]);
    assert_eq!(delivered_events(&frames2[0]), vec![at_y]);
}

#[tokio::test]
async fn test_topic_subset_filter_selects_events() {
    let stack = NotifierStack::hub_backed();
    let subscriber = TestSubscriber::attach(stack.hub(), 8);
    subscribe(
        &stack,
        &subscriber,
        vec![SubscriptionEntry {
            topics: vec!["T1".to_string()],
            ..Default::default()
        }],
    );
    settle().await;

    let matching = event("erd1x", "transfer", &["T1", "T2"]);
    stack
        .handler
        .process_payload(
            &save_block_frame(
                "0xaa",
                vec![matching.clone(), event("erd1x", "transfer", &["T3"])],
            ),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();

    let frames = subscriber.wait_for_frames(1).await;
    assert_eq!(delivered_events(&frames[0]), vec![matching]);
}

#[tokio::test]
async fn test_slow_subscriber_does_not_stall_healthy_peer() {
    let stack = NotifierStack::hub_backed_with(&NotifierConfig {
        hub: HubSettings {
            dispatcher_queue_capacity: 2,
            ..Default::default()
        },
        ..Default::default()
    });
    let (stalled, write_started) = TestSubscriber::attach_stalled(stack.hub(), 2);
    let healthy = TestSubscriber::attach(stack.hub(), 8);
    subscribe(&stack, &stalled, vec![SubscriptionEntry::default()]);
    subscribe(&stack, &healthy, vec![SubscriptionEntry::default()]);
    settle().await;

    // One batch sticks in the stalled transport, two fill its queue, the
    // fourth trips the disconnect. The healthy peer sees all of them.
    for i in 0..4 {
        stack
            .handler
            .process_payload(
                &save_block_frame(&format!("0x{i:02x}"), vec![event("erd1x", "transfer", &[])]),
                topics::SAVE_BLOCK,
                PAYLOAD_VERSION_V1,
            )
            .unwrap();
        if i == 0 {
            timeout(Duration::from_secs(1), write_started.notified())
                .await
                .expect("stalled write never started");
        }
    }

    healthy.wait_for_frames(4).await;

    // The disconnected subscriber is gone; later broadcasts still flow.
    stack
        .handler
        .process_payload(
            &save_block_frame("0xff", vec![event("erd1x", "transfer", &[])]),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();
    healthy.wait_for_frames(5).await;
}

#[tokio::test]
async fn test_revert_routes_only_to_revert_subscribers() {
    let stack = NotifierStack::hub_backed();
    let revert_sub = TestSubscriber::attach(stack.hub(), 8);
    let block_sub = TestSubscriber::attach(stack.hub(), 8);
    subscribe(
        &stack,
        &revert_sub,
        vec![SubscriptionEntry {
            event_type: EventType::RevertEvents,
            ..Default::default()
        }],
    );
    subscribe(
        &stack,
        &block_sub,
        vec![SubscriptionEntry {
            event_type: EventType::BlockEvents,
            ..Default::default()
        }],
    );
    settle().await;

    let revert = RevertBlock {
        hash: "0xaa".to_string(),
        nonce: 9,
        round: 10,
        epoch: 1,
    };
    stack
        .handler
        .process_payload(
            &serde_json::to_vec(&revert).unwrap(),
            topics::REVERT_INDEXED_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();

    let frames = revert_sub.wait_for_frames(1).await;
    assert_eq!(frames[0].kind, WireEventKind::RevertEvent);
    assert_eq!(frames[0].data["hash"], "0xaa");

    sleep(Duration::from_millis(50)).await;
    assert!(block_sub.frames().is_empty());
}

#[tokio::test]
async fn test_finalized_routes_to_all_subscribers_too() {
    let stack = NotifierStack::hub_backed();
    let all_sub = TestSubscriber::attach(stack.hub(), 8);
    subscribe(
        &stack,
        &all_sub,
        vec![SubscriptionEntry {
            event_type: EventType::All,
            ..Default::default()
        }],
    );
    settle().await;

    stack
        .handler
        .process_payload(
            &serde_json::to_vec(&FinalizedBlock {
                hash: "0xbb".to_string(),
            })
            .unwrap(),
            topics::FINALIZED_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();

    let frames = all_sub.wait_for_frames(1).await;
    assert_eq!(frames[0].kind, WireEventKind::FinalizedEvent);
    assert_eq!(frames[0].data["hash"], "0xbb");
}

#[tokio::test]
async fn test_unknown_payload_version_is_rejected() {
    let stack = NotifierStack::hub_backed();

    let err = stack
        .handler
        .process_payload(
            &save_block_frame("0xaa", Vec::new()),
            topics::SAVE_BLOCK,
            "v3",
        )
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::InvalidPayloadVersion { version } if version == "v3"
    ));

    // The registered version still decodes.
    stack
        .handler
        .process_payload(
            &save_block_frame("0xaa", Vec::new()),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_ingest_delivery() {
    let stack = NotifierStack::hub_backed();
    let subscriber = TestSubscriber::attach(stack.hub(), 8);
    subscribe(&stack, &subscriber, vec![SubscriptionEntry::default()]);
    settle().await;

    stack.egress.shutdown();
    settle().await;

    let err = stack
        .handler
        .process_payload(
            &save_block_frame("0xaa", vec![event("erd1x", "transfer", &[])]),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap_err();
    assert!(matches!(err, IngestError::GatewayClosed));
    assert!(subscriber.frames().is_empty());
}

#[tokio::test]
async fn test_rabbit_egress_publishes_every_stream() {
    let config = NotifierConfig {
        api_type: ApiType::RabbitApi,
        rabbit_mq: RabbitMqConfig {
            url: "amqp://localhost:5672".to_string(),
            events_exchange: "events".to_string(),
            revert_events_exchange: "revert".to_string(),
            finalized_events_exchange: "finalized".to_string(),
        },
        ..Default::default()
    };
    let client = Arc::new(RecordingExchangeClient::default());
    let egress = create_egress(&config, Some(client.clone() as Arc<dyn ExchangeClient>)).unwrap();
    let handler = create_payload_handler(egress.gateway()).unwrap();

    handler
        .process_payload(
            &save_block_frame("0xaa", vec![event("erd1x", "transfer", &["T1"])]),
            topics::SAVE_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();
    handler
        .process_payload(
            &serde_json::to_vec(&RevertBlock {
                hash: "0xbb".to_string(),
                nonce: 1,
                round: 1,
                epoch: 0,
            })
            .unwrap(),
            topics::REVERT_INDEXED_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();
    handler
        .process_payload(
            &serde_json::to_vec(&FinalizedBlock {
                hash: "0xcc".to_string(),
            })
            .unwrap(),
            topics::FINALIZED_BLOCK,
            PAYLOAD_VERSION_V1,
        )
        .unwrap();

    timeout(Duration::from_secs(2), async {
        loop {
            if client.published().len() >= 3 {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("publishes did not arrive");

    // The three streams ride separate channels; no ordering holds between
    // them, so look publishes up by exchange.
    let published = client.published();
    let by_exchange = |name: &str| {
        published
            .iter()
            .find(|(exchange, _)| exchange == name)
            .unwrap_or_else(|| panic!("nothing published to {name}"))
            .1
            .clone()
    };
    assert_eq!(by_exchange("events")["hash"], "0xaa");
    assert_eq!(by_exchange("events")["shardID"], 1);
    assert_eq!(by_exchange("revert")["hash"], "0xbb");
    assert_eq!(by_exchange("finalized")["hash"], "0xcc");
}
