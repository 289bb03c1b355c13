use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("phone {phone} is registered to {tenancy}")]
    RegisteredElsewhere { phone: String, tenancy: String },

    #[error("all tenancies are full")]
    AllFull,

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
