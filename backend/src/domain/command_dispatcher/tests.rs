//! Tests for the dispatch cycle against mocked ports.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::domain::ports::{
    BrokerError, BrokerMessage, MockCommandSource, MockRouteStoreRepository,
    RouteStorePersistenceError,
};
use crate::domain::{RouteId, WaypointId};
use mockable::DefaultClock;
use rstest::rstest;
use tokio::sync::watch;

fn delivery(offset: i64, header: Option<&str>, payload: &str) -> Delivery {
    let headers = header
        .map(|name| BTreeMap::from([(COMMAND_HEADER.to_owned(), name.to_owned())]))
        .unwrap_or_default();
    Delivery {
        topic: "route-commands".to_owned(),
        offset,
        message: BrokerMessage {
            key: format!("key-{offset}"),
            headers,
            payload: payload.as_bytes().to_vec(),
        },
    }
}

fn dispatcher(
    source: MockCommandSource,
    store: MockRouteStoreRepository,
) -> CommandDispatcher<MockCommandSource, MockRouteStoreRepository> {
    let handler = RouteCommandHandler::new(Arc::new(store), Arc::new(DefaultClock));
    CommandDispatcher::new(Arc::new(source), handler, Duration::from_millis(1))
}

fn source_yielding(delivery: Delivery, ack: Result<(), BrokerError>) -> MockCommandSource {
    let offset = delivery.offset;
    let mut source = MockCommandSource::new();
    source
        .expect_next_message()
        .times(1)
        .return_once(move || Ok(delivery));
    source
        .expect_acknowledge()
        .withf(move |acked| acked.offset == offset)
        .times(1)
        .return_once(move |_| ack);
    source
}

#[rstest]
#[case::missing(None)]
#[case::unknown(Some("frobnicate"))]
#[tokio::test]
async fn unknown_headers_are_consumed_without_touching_store(#[case] header: Option<&str>) {
    let source = source_yielding(delivery(4, header, "{}"), Ok(()));
    let mut store = MockRouteStoreRepository::new();
    store.expect_delete_route().never();
    store.expect_insert_user().never();

    let report = dispatcher(source, store).dispatch_next().await;

    assert!(
        matches!(
            report,
            DispatchReport::Rejected {
                offset: 4,
                acknowledged: true,
                ..
            }
        ),
        "unexpected report: {report:?}"
    );
}

#[rstest]
#[tokio::test]
async fn undecodable_payload_is_consumed() {
    let source = source_yielding(
        delivery(5, Some("add-route"), r#"{"userId":"x"}"#),
        Ok(()),
    );
    let mut store = MockRouteStoreRepository::new();
    store.expect_insert_route().never();

    let report = dispatcher(source, store).dispatch_next().await;

    let DispatchReport::Rejected { error, .. } = report else {
        panic!("expected rejection, got {report:?}");
    };
    assert!(matches!(
        error,
        CommandDecodeError::Payload {
            command: CommandName::AddRoute,
            ..
        }
    ));
}

#[rstest]
#[tokio::test]
async fn handler_failure_still_acknowledges() {
    let source = source_yielding(
        delivery(6, Some("delete-route"), r#"{"token":"tok01","routeId":3}"#),
        Ok(()),
    );
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_delete_route()
        .times(1)
        .return_once(|_| Err(RouteStorePersistenceError::connection("refused")));

    let report = dispatcher(source, store).dispatch_next().await;

    assert!(matches!(
        report,
        DispatchReport::Handled {
            offset: 6,
            command: CommandName::DeleteRoute,
            outcome: CommandOutcome::Failed { .. },
            acknowledged: true,
        }
    ));
}

#[rstest]
#[tokio::test]
async fn acknowledge_failure_is_reported() {
    let source = source_yielding(
        delivery(7, Some("rename-route-id"), r#"{"userId":1,"routeId":3,"newName":"Loop"}"#),
        Err(BrokerError::unavailable("commit timed out")),
    );
    let mut store = MockRouteStoreRepository::new();
    store.expect_rename_route().times(1).return_once(|_, _| Ok(1));

    let mut dispatcher = dispatcher(source, store);
    let report = dispatcher.dispatch_next().await;

    assert!(matches!(
        report,
        DispatchReport::Handled {
            outcome: CommandOutcome::Applied { rows: 1 },
            acknowledged: false,
            ..
        }
    ));
    assert_eq!(dispatcher.state(), DispatcherState::Polling);
}

#[rstest]
#[tokio::test]
async fn poll_failure_consumes_nothing() {
    let mut source = MockCommandSource::new();
    source
        .expect_next_message()
        .times(1)
        .return_once(|| Err(BrokerError::unavailable("broker down")));
    source.expect_acknowledge().never();

    let report = dispatcher(source, MockRouteStoreRepository::new())
        .dispatch_next()
        .await;

    assert_eq!(
        report,
        DispatchReport::PollFailed {
            reason: "command broker is unavailable: broker down".to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn run_keeps_polling_after_a_poll_failure() {
    let (stop, shutdown) = watch::channel(false);
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let mut source = MockCommandSource::new();
    source.expect_next_message().returning(move || {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => Err(BrokerError::unavailable("broker down")),
            1 => Ok(delivery(
                8,
                Some("delete-route"),
                r#"{"token":"tok01","routeId":3}"#,
            )),
            _ => {
                let _ = stop.send(true);
                Err(BrokerError::unavailable("draining"))
            }
        }
    });
    source
        .expect_acknowledge()
        .withf(|acked| acked.offset == 8)
        .times(1)
        .returning(|_| Ok(()));
    let mut store = MockRouteStoreRepository::new();
    store.expect_delete_route().times(1).returning(|_| Ok(1));

    tokio::time::timeout(Duration::from_secs(5), dispatcher(source, store).run(shutdown))
        .await
        .expect("dispatcher stops once shutdown is requested");

    assert!(polls.load(Ordering::SeqCst) >= 3);
}

#[rstest]
#[tokio::test]
async fn shutdown_lets_the_in_flight_command_finish() {
    let (stop, shutdown) = watch::channel(false);
    let mut source = MockCommandSource::new();
    source.expect_next_message().times(1).return_once(|| {
        Ok(delivery(
            9,
            Some("add-route"),
            r#"{"userId":1,"routeName":"Loop","waypoints":[
                {"waypointName":"A","lat":1.0,"lon":2.0},
                {"waypointName":"B","lat":1.5,"lon":2.5},
                {"waypointName":"C","lat":2.0,"lon":3.0}]}"#,
        ))
    });
    source
        .expect_acknowledge()
        .withf(|acked| acked.offset == 9)
        .times(1)
        .return_once(|_| Ok(()));
    let mut store = MockRouteStoreRepository::new();
    store.expect_insert_route().times(1).return_once(move |_| {
        stop.send(true).expect("dispatcher holds the receiver");
        Ok(RouteId::new(40))
    });
    let inserted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inserted);
    store.expect_insert_waypoint().times(3).returning(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(WaypointId::new(100 + i32::try_from(n).expect("small count")))
    });

    tokio::time::timeout(Duration::from_secs(5), dispatcher(source, store).run(shutdown))
        .await
        .expect("dispatcher stops after the in-flight command");

    assert_eq!(inserted.load(Ordering::SeqCst), 3);
}
