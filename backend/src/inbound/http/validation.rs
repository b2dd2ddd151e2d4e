//! Parsing helpers that turn raw path and body values into domain types.
//!
//! Every failure becomes an `invalid_request` error whose details name the
//! offending field, the rejected value and a machine-readable code.

use serde_json::json;

use crate::domain::{Error, ExternalUserId, PublicToken, RouteId, RouteName};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    InvalidNumber,
    InvalidToken,
    InvalidName,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidNumber => "invalid_number",
            Self::InvalidToken => "invalid_token",
            Self::InvalidName => "invalid_name",
        }
    }
}

fn invalid(field: &str, value: &str, code: ValidationCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_external_id(raw: &str) -> Result<ExternalUserId, Error> {
    raw.parse::<i64>().map(ExternalUserId::new).map_err(|_| {
        invalid(
            "externalId",
            raw,
            ValidationCode::InvalidNumber,
            "externalId must be a 64-bit integer",
        )
    })
}

pub(crate) fn parse_route_id(raw: &str) -> Result<RouteId, Error> {
    raw.parse::<i32>().map(RouteId::new).map_err(|_| {
        invalid(
            "routeId",
            raw,
            ValidationCode::InvalidNumber,
            "routeId must be a 32-bit integer",
        )
    })
}

pub(crate) fn parse_token(raw: &str) -> Result<PublicToken, Error> {
    PublicToken::new(raw)
        .map_err(|err| invalid("token", raw, ValidationCode::InvalidToken, err.to_string()))
}

pub(crate) fn parse_route_name(raw: &str) -> Result<RouteName, Error> {
    RouteName::new(raw)
        .map_err(|err| invalid("routeName", raw, ValidationCode::InvalidName, err.to_string()))
}
