use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("bot {0} not found")]
    BotNotFound(String),

    #[error("bot {0} is not approved")]
    NotApproved(String),

    #[error(transparent)]
    Registry(#[from] wafleet_registry::Error),

    #[error(transparent)]
    Session(#[from] wafleet_session::Error),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wafleet_common::impl_context!();
