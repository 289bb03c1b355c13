use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("bot not found on this tenancy")]
    BotNotFound,

    #[error("cross-tenancy lifecycle commands require signed RPC, not direct batch operation")]
    CrossTenancy,

    #[error(transparent)]
    Registry(#[from] wafleet_registry::Error),

    #[error(transparent)]
    Placement(#[from] wafleet_placement::Error),

    #[error(transparent)]
    Supervisor(#[from] wafleet_supervisor::Error),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wafleet_common::impl_context!();
