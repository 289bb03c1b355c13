use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("missing or malformed Authorization header")]
    MissingBearer,

    #[error("invalid or expired admin token")]
    InvalidToken,
}

impl From<wafleet_common::token::TokenError> for Error {
    fn from(_: wafleet_common::token::TokenError) -> Self {
        Self::InvalidToken
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wafleet_common::impl_context!();
