use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("phone {phone} is already registered to {tenancy}")]
    AlreadyRegistered { phone: String, tenancy: String },

    #[error("tenancy {0} is at capacity")]
    CapacityFull(String),

    #[error("bot {0} not found")]
    BotNotFound(String),

    #[error("server {0} not found")]
    ServerNotFound(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wafleet_common::impl_context!();
