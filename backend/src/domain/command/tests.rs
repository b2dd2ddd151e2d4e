//! Tests for command wire names and strict payload decoding.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case("create-user", CommandName::CreateUser)]
#[case("add-route", CommandName::AddRoute)]
#[case("delete-route", CommandName::DeleteRoute)]
#[case("rename-route-id", CommandName::RenameRouteById)]
#[case("rename-route-token", CommandName::RenameRouteByToken)]
fn wire_names_map_both_ways(#[case] wire: &str, #[case] name: CommandName) {
    assert_eq!(wire.parse::<CommandName>(), Ok(name));
    assert_eq!(name.as_str(), wire);
}

#[rstest]
fn every_command_name_has_a_wire_name() {
    assert!(CommandName::all().all(|name| !name.as_str().is_empty()));
    assert_eq!(CommandName::all().count(), 5);
}

#[rstest]
fn decode_requires_header() {
    assert_eq!(
        Command::decode(None, b"{}"),
        Err(CommandDecodeError::MissingHeader)
    );
}

#[rstest]
#[case("frobnicate")]
#[case("rename-route")]
#[case("")]
fn decode_rejects_unknown_names(#[case] header: &str) {
    assert_eq!(
        Command::decode(Some(header), b"{}"),
        Err(CommandDecodeError::UnknownCommand {
            name: header.to_owned()
        })
    );
}

#[rstest]
fn decode_create_user() {
    let payload = json!({ "externalId": 555, "token": "tok01", "userName": "Ann" });
    let command = Command::decode(
        Some("create-user"),
        &serde_json::to_vec(&payload).expect("payload"),
    )
    .expect("decodes");

    let Command::CreateUser(create) = command else {
        panic!("expected create-user, got {command:?}");
    };
    assert_eq!(create.external_id, ExternalUserId::new(555));
    assert_eq!(create.token.as_ref(), "tok01");
    assert_eq!(create.user_name.as_ref(), "Ann");
}

#[rstest]
fn decode_add_route_keeps_waypoint_order() {
    let payload = json!({
        "userId": 1,
        "routeName": "Morning Ride",
        "waypoints": [
            { "waypointName": "Start", "lat": 10.0, "lon": 20.0 },
            { "waypointName": "End", "lat": 10.1, "lon": 20.1 }
        ]
    });
    let command = Command::decode(
        Some("add-route"),
        &serde_json::to_vec(&payload).expect("payload"),
    )
    .expect("decodes");

    let Command::AddRoute(add) = command else {
        panic!("expected add-route, got {command:?}");
    };
    let names: Vec<&str> = add
        .waypoints
        .iter()
        .map(|wp| wp.waypoint_name.as_ref())
        .collect();
    assert_eq!(names, vec!["Start", "End"]);
}

#[rstest]
#[case::missing_field("delete-route", json!({ "token": "tok01" }))]
#[case::unknown_field("delete-route", json!({ "token": "tok01", "routeId": 3, "extra": true }))]
#[case::wrong_type("rename-route-id", json!({ "userId": "one", "routeId": 3, "newName": "x" }))]
#[case::invalid_token("rename-route-token", json!({ "token": "a b", "routeId": 3, "routeName": "x" }))]
#[case::blank_name("rename-route-id", json!({ "userId": 1, "routeId": 3, "newName": "  " }))]
fn decode_rejects_malformed_payloads(#[case] header: &str, #[case] payload: serde_json::Value) {
    let bytes = serde_json::to_vec(&payload).expect("payload");
    let result = Command::decode(Some(header), &bytes);
    assert!(
        matches!(result, Err(CommandDecodeError::Payload { .. })),
        "unexpected result: {result:?}"
    );
}

#[rstest]
fn decode_rejects_non_json_bytes() {
    let result = Command::decode(Some("create-user"), b"not json");
    assert!(matches!(
        result,
        Err(CommandDecodeError::Payload {
            command: CommandName::CreateUser,
            ..
        })
    ));
}

#[rstest]
fn encode_uses_camel_case_field_names() {
    let command = Command::RenameRouteByToken(RenameRouteByToken {
        token: PublicToken::new("tok01").expect("token"),
        route_id: RouteId::new(3),
        route_name: RouteName::new("Evening").expect("name"),
    });

    let value: serde_json::Value =
        serde_json::from_slice(&command.encode().expect("encodes")).expect("json");
    assert_eq!(
        value,
        json!({ "token": "tok01", "routeId": 3, "routeName": "Evening" })
    );
}

#[rstest]
fn authorizations_follow_payload_identity() {
    let delete = DeleteRoute {
        token: PublicToken::new("tok01").expect("token"),
        route_id: RouteId::new(3),
    };
    let rename = RenameRouteById {
        user_id: UserId::new(1),
        route_id: RouteId::new(3),
        new_name: RouteName::new("x").expect("name"),
    };

    assert!(matches!(
        delete.authorization(),
        RouteAuthorization::ByToken { .. }
    ));
    assert_eq!(
        rename.authorization(),
        RouteAuthorization::by_owner(UserId::new(1), RouteId::new(3))
    );
}
