use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("credentials could not be parsed as JSON or base64-encoded JSON")]
    Unparseable,

    #[error("credentials must be a non-empty JSON object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no phone number could be extracted from credentials")]
    PhoneNotFound,

    #[error("credentials phone number mismatch")]
    PhoneMismatch,

    #[error("decoded credentials exceed the 5 MB size limit")]
    TooLarge,

    #[error("phone {phone} is already registered to {tenancy}")]
    AlreadyRegistered { phone: String, tenancy: String },
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wafleet_common::impl_context!();
