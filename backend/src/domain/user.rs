//! User data model.
//!
//! A user is created once through the `create-user` command and is never
//! modified afterwards. Three identifiers coexist: the store-assigned
//! [`UserId`], the opaque [`PublicToken`] handed to clients, and the
//! [`ExternalUserId`] issued by the upstream messaging platform.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length of a public token, in characters.
pub const PUBLIC_TOKEN_MAX: usize = 64;
/// Maximum length of user, route, and waypoint names, in characters.
pub const NAME_MAX: usize = 128;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("public token must not be empty")]
    EmptyToken,
    #[error("public token must be at most {max} characters")]
    TokenTooLong { max: usize },
    #[error("public token must not contain whitespace or '/'")]
    TokenInvalidCharacters,
    #[error("user name must not be empty")]
    EmptyUserName,
    #[error("user name must be at most {max} characters")]
    UserNameTooLong { max: usize },
}

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the upstream messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalUserId(i64);

impl ExternalUserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExternalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token that identifies a user to clients.
///
/// Tokens appear in URL paths, so whitespace and `/` are rejected.
///
/// # Examples
/// ```
/// use route_ledger::domain::PublicToken;
///
/// assert!(PublicToken::new("tok01").is_ok());
/// assert!(PublicToken::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicToken(String);

impl PublicToken {
    /// Validate and construct a [`PublicToken`].
    pub fn new(token: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(token.into())
    }

    fn from_owned(token: String) -> Result<Self, UserValidationError> {
        if token.is_empty() {
            return Err(UserValidationError::EmptyToken);
        }
        if token.chars().count() > PUBLIC_TOKEN_MAX {
            return Err(UserValidationError::TokenTooLong {
                max: PUBLIC_TOKEN_MAX,
            });
        }
        if token.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(UserValidationError::TokenInvalidCharacters);
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for PublicToken {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PublicToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PublicToken> for String {
    fn from(value: PublicToken) -> Self {
        value.0
    }
}

impl TryFrom<String> for PublicToken {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Display name chosen by the user on the upstream platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and construct a [`UserName`].
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(name.into())
    }

    fn from_owned(name: String) -> Result<Self, UserValidationError> {
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyUserName);
        }
        if name.chars().count() > NAME_MAX {
            return Err(UserValidationError::UserNameTooLong { max: NAME_MAX });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Registered user as stored.
///
/// ## Invariants
/// - `token` and `external_id` are each unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = i64, example = 1)]
    id: UserId,
    #[schema(value_type = String, example = "tok01")]
    token: PublicToken,
    #[schema(value_type = i64, example = 555)]
    external_id: ExternalUserId,
    #[schema(value_type = String, example = "Ann")]
    user_name: UserName,
    registered_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        token: PublicToken,
        external_id: ExternalUserId,
        user_name: UserName,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            token,
            external_id,
            user_name,
            registered_at,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn token(&self) -> &PublicToken {
        &self.token
    }

    pub fn external_id(&self) -> ExternalUserId {
        self.external_id
    }

    pub fn user_name(&self) -> &UserName {
        &self.user_name
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

/// User fields supplied by `create-user`; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub external_id: ExternalUserId,
    pub token: PublicToken,
    pub user_name: UserName,
    pub registered_at: DateTime<Utc>,
}
