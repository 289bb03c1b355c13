//! The §7 error taxonomy realized as one `ApiError` enum every crate's
//! typed error converts into at the HTTP boundary. Each variant carries the
//! exact status that taxonomy assigns it and serializes to the `{message,
//! ...}` envelope shape the admin/guest surfaces share.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    NotFound(String),

    #[error("no tenancy has capacity")]
    Capacity { alternative_tenancies: Vec<String> },

    #[error("{message}")]
    Conflict { message: String, registered_to: Option<String> },

    #[error("{0}")]
    Rpc(String, StatusCode),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, json!({ "message": message })),
            Self::Auth(message) => (StatusCode::UNAUTHORIZED, json!({ "message": message })),
            Self::Permission(message) => (StatusCode::FORBIDDEN, json!({ "message": message })),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            Self::Capacity { alternative_tenancies } => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "no tenancy has capacity", "alternativeTenancies": alternative_tenancies }),
            ),
            Self::Conflict { message, registered_to } => (
                StatusCode::BAD_REQUEST,
                json!({ "message": message, "registeredTo": registered_to }),
            ),
            Self::Rpc(message, status) => (status, json!({ "message": message })),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": message })),
        };
        (status, Json(body)).into_response()
    }
}

impl From<wafleet_registry::Error> for ApiError {
    fn from(e: wafleet_registry::Error) -> Self {
        match e {
            wafleet_registry::Error::AlreadyRegistered { phone, tenancy } => Self::Conflict {
                message: format!("phone {phone} is already registered to {tenancy}"),
                registered_to: Some(tenancy),
            },
            wafleet_registry::Error::CapacityFull(_) => Self::Capacity {
                alternative_tenancies: vec![],
            },
            wafleet_registry::Error::BotNotFound(id) => Self::NotFound(format!("bot {id} not found")),
            wafleet_registry::Error::ServerNotFound(name) => Self::NotFound(format!("server {name} not found")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<wafleet_placement::Error> for ApiError {
    fn from(e: wafleet_placement::Error) -> Self {
        match e {
            wafleet_placement::Error::RegisteredElsewhere { phone, tenancy } => Self::Conflict {
                message: format!("phone {phone} is already registered to {tenancy}"),
                registered_to: Some(tenancy),
            },
            wafleet_placement::Error::AllFull => Self::Capacity {
                alternative_tenancies: vec![],
            },
            wafleet_placement::Error::Registry(inner) => inner.into(),
            wafleet_placement::Error::Message(m) => Self::Internal(m),
        }
    }
}

impl From<wafleet_credentials::Error> for ApiError {
    fn from(e: wafleet_credentials::Error) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<wafleet_supervisor::Error> for ApiError {
    fn from(e: wafleet_supervisor::Error) -> Self {
        match e {
            wafleet_supervisor::Error::BotNotFound(id) => Self::NotFound(format!("bot {id} not found")),
            wafleet_supervisor::Error::NotApproved(id) => Self::Permission(format!("bot {id} is not approved")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<wafleet_lifecycle::Error> for ApiError {
    fn from(e: wafleet_lifecycle::Error) -> Self {
        match e {
            wafleet_lifecycle::Error::BotNotFound => Self::NotFound("bot not found".into()),
            wafleet_lifecycle::Error::CrossTenancy => {
                Self::Permission("cross-tenancy lifecycle commands require signed RPC".into())
            },
            wafleet_lifecycle::Error::Registry(inner) => inner.into(),
            wafleet_lifecycle::Error::Placement(inner) => inner.into(),
            wafleet_lifecycle::Error::Supervisor(inner) => inner.into(),
            wafleet_lifecycle::Error::Message(m) => Self::Internal(m),
        }
    }
}

impl From<wafleet_guestauth::Error> for ApiError {
    fn from(e: wafleet_guestauth::Error) -> Self {
        use wafleet_guestauth::Error as E;
        match e {
            E::NotRegistered | E::BotNotFound => Self::NotFound(e.to_string()),
            E::NotApproved | E::NotVerified => Self::Permission(e.to_string()),
            E::Expired | E::OtpNotFound | E::OtpMismatch | E::OtpExpired | E::InvalidToken => {
                Self::Auth(e.to_string())
            },
            E::Credentials(inner) => inner.into(),
            E::Registry(inner) => inner.into(),
            E::Supervisor(inner) => inner.into(),
            E::Message(m) => Self::Internal(m),
        }
    }
}

impl From<wafleet_auth::Error> for ApiError {
    fn from(e: wafleet_auth::Error) -> Self {
        Self::Auth(e.to_string())
    }
}
