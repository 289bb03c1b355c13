use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("source server not in catalog")]
    UnknownSource,

    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token audience does not match this tenancy")]
    WrongAudience,

    #[error(transparent)]
    Registry(#[from] wafleet_registry::Error),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wafleet_common::impl_context!();
