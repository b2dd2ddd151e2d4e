//! Domain primitives, commands, and services.
//!
//! Purpose: Define strongly typed users, routes and write commands, plus the
//! services that move commands through the broker and apply them to the
//! store. Adapters live in `inbound` and `outbound`; nothing here depends on
//! them.
//!
//! Public surface:
//! - Error / ErrorCode: read-path error payload.
//! - User, Route and their value types.
//! - Command / CommandName: write-side vocabulary.
//! - CommandEncoder, CommandDispatcher, RouteCommandHandler: write pipeline.
//! - RouteCatalogService: read path.

pub mod command;
pub mod command_dispatcher;
pub mod command_encoder;
pub mod command_handler;
pub mod error;
pub mod identity;
pub mod ports;
pub mod route;
pub mod route_catalog_service;
pub mod user;

pub use self::command::{
    AddRoute, COMMAND_HEADER, Command, CommandDecodeError, CommandName, CreateUser, DeleteRoute,
    RenameRouteById, RenameRouteByToken, RouteWaypoint,
};
pub use self::command_dispatcher::{CommandDispatcher, DispatchReport, DispatcherState};
pub use self::command_encoder::CommandEncoder;
pub use self::command_handler::{CommandOutcome, RouteCommandHandler};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::RouteAuthorization;
pub use self::route::{
    NewRoute, NewWaypoint, OrderIndex, Route, RouteId, RouteLimit, RouteName, RouteRecord,
    RouteValidationError, Waypoint, WaypointId, WaypointName, WaypointRecord,
};
pub use self::route_catalog_service::RouteCatalogService;
pub use self::user::{
    ExternalUserId, NewUser, PublicToken, User, UserId, UserName, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use route_ledger::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
