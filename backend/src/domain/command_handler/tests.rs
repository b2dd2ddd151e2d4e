//! Tests for command handlers against a mocked store.

use super::*;
use crate::domain::ports::MockRouteStoreRepository;
use crate::domain::{
    DeleteRoute, ExternalUserId, PublicToken, RenameRouteById, RenameRouteByToken, RouteWaypoint,
    UserId, UserName, WaypointId, WaypointName,
};
use chrono::{DateTime, Local, TimeZone, Utc};
use rstest::{fixture, rstest};
use std::sync::Mutex;

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

fn handler(store: MockRouteStoreRepository, clock: Arc<dyn Clock>) -> RouteCommandHandler<MockRouteStoreRepository> {
    RouteCommandHandler::new(Arc::new(store), clock)
}

fn token() -> PublicToken {
    PublicToken::new("tok01").expect("token")
}

fn create_user_command() -> Command {
    Command::CreateUser(CreateUser {
        external_id: ExternalUserId::new(555),
        token: token(),
        user_name: UserName::new("Ann").expect("name"),
    })
}

fn add_route_command() -> Command {
    Command::AddRoute(AddRoute {
        user_id: UserId::new(1),
        route_name: RouteName::new("Morning Ride").expect("name"),
        waypoints: vec![
            RouteWaypoint {
                waypoint_name: WaypointName::new("Start").expect("name"),
                lat: 10.0,
                lon: 20.0,
            },
            RouteWaypoint {
                waypoint_name: WaypointName::new("Middle").expect("name"),
                lat: 10.05,
                lon: 20.05,
            },
            RouteWaypoint {
                waypoint_name: WaypointName::new("End").expect("name"),
                lat: 10.1,
                lon: 20.1,
            },
        ],
    })
}

#[rstest]
#[tokio::test]
async fn create_user_stamps_registration_with_clock(clock: Arc<dyn Clock>) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_insert_user()
        .withf(|user| {
            user.external_id == ExternalUserId::new(555)
                && user.token.as_ref() == "tok01"
                && user.registered_at == fixture_timestamp()
        })
        .times(1)
        .return_once(|_| Ok(UserInsertOutcome::Created(UserId::new(1))));

    let outcome = handler(store, clock).handle(&create_user_command()).await;
    assert_eq!(outcome, CommandOutcome::Applied { rows: 1 });
}

#[rstest]
#[tokio::test]
async fn duplicate_create_user_is_unchanged(clock: Arc<dyn Clock>) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_insert_user()
        .times(1)
        .return_once(|_| Ok(UserInsertOutcome::AlreadyExists));

    let outcome = handler(store, clock).handle(&create_user_command()).await;
    assert_eq!(outcome, CommandOutcome::Unchanged);
}

#[rstest]
#[tokio::test]
async fn add_route_inserts_waypoints_with_positions(clock: Arc<dyn Clock>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_insert_route()
        .withf(|route| route.uploaded_at == fixture_timestamp() && route.user_id == UserId::new(1))
        .times(1)
        .return_once(|_| Ok(RouteId::new(7)));
    store
        .expect_insert_waypoint()
        .times(3)
        .returning(move |waypoint| {
            let mut seen = recorder.lock().expect("recorder lock");
            seen.push((
                waypoint.route_id,
                waypoint.name.as_ref().to_owned(),
                waypoint.order_index,
            ));
            Ok(WaypointId::new(i32::try_from(seen.len()).expect("small")))
        });

    let outcome = handler(store, clock).handle(&add_route_command()).await;

    assert_eq!(outcome, CommandOutcome::Applied { rows: 4 });
    let seen = seen.lock().expect("recorder lock");
    assert_eq!(
        *seen,
        vec![
            (RouteId::new(7), "Start".to_owned(), OrderIndex::new(0)),
            (RouteId::new(7), "Middle".to_owned(), OrderIndex::new(1)),
            (RouteId::new(7), "End".to_owned(), OrderIndex::new(2)),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn add_route_skips_waypoints_when_route_insert_fails(clock: Arc<dyn Clock>) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_insert_route()
        .times(1)
        .return_once(|_| Err(RouteStorePersistenceError::query("foreign key violation")));
    store.expect_insert_waypoint().never();

    let outcome = handler(store, clock).handle(&add_route_command()).await;
    assert!(matches!(outcome, CommandOutcome::Failed { .. }));
}

#[rstest]
#[tokio::test]
async fn add_route_continues_after_waypoint_failure(clock: Arc<dyn Clock>) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_insert_route()
        .times(1)
        .return_once(|_| Ok(RouteId::new(7)));
    store
        .expect_insert_waypoint()
        .times(3)
        .returning(|waypoint| {
            if waypoint.order_index == OrderIndex::new(1) {
                Err(RouteStorePersistenceError::query("value too long"))
            } else {
                Ok(WaypointId::new(waypoint.order_index.get() + 100))
            }
        });

    let outcome = handler(store, clock).handle(&add_route_command()).await;
    assert_eq!(
        outcome,
        CommandOutcome::PartiallyApplied {
            rows: 3,
            failed_waypoints: 1
        }
    );
}

#[rstest]
#[case(1, CommandOutcome::Applied { rows: 1 })]
#[case(0, CommandOutcome::Unchanged)]
#[tokio::test]
async fn delete_route_uses_token_authorization(
    clock: Arc<dyn Clock>,
    #[case] rows: u64,
    #[case] expected: CommandOutcome,
) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_delete_route()
        .withf(|auth| *auth == RouteAuthorization::by_token(token(), RouteId::new(3)))
        .times(1)
        .return_once(move |_| Ok(rows));
    let command = Command::DeleteRoute(DeleteRoute {
        token: token(),
        route_id: RouteId::new(3),
    });

    let outcome = handler(store, clock).handle(&command).await;
    assert_eq!(outcome, expected);
}

#[rstest]
#[tokio::test]
async fn rename_by_id_uses_owner_authorization(clock: Arc<dyn Clock>) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_rename_route()
        .withf(|auth, name| {
            *auth == RouteAuthorization::by_owner(UserId::new(1), RouteId::new(3))
                && name.as_ref() == "Evening Ride"
        })
        .times(1)
        .return_once(|_, _| Ok(1));
    let command = Command::RenameRouteById(RenameRouteById {
        user_id: UserId::new(1),
        route_id: RouteId::new(3),
        new_name: RouteName::new("Evening Ride").expect("name"),
    });

    let outcome = handler(store, clock).handle(&command).await;
    assert_eq!(outcome, CommandOutcome::Applied { rows: 1 });
}

#[rstest]
#[tokio::test]
async fn rename_by_token_contains_store_errors(clock: Arc<dyn Clock>) {
    let mut store = MockRouteStoreRepository::new();
    store
        .expect_rename_route()
        .times(1)
        .return_once(|_, _| Err(RouteStorePersistenceError::connection("pool timed out")));
    let command = Command::RenameRouteByToken(RenameRouteByToken {
        token: token(),
        route_id: RouteId::new(3),
        route_name: RouteName::new("Evening Ride").expect("name"),
    });

    let outcome = handler(store, clock).handle(&command).await;
    assert_eq!(
        outcome,
        CommandOutcome::Failed {
            reason: "route store connection failed: pool timed out".to_owned()
        }
    );
}
