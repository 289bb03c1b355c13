use thiserror::Error;
use wafleet_common::FromMessage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("phone number is not registered to any tenancy")]
    NotRegistered,

    #[error("bot not found on this tenancy")]
    BotNotFound,

    #[error("only approved bots can authenticate guests")]
    NotApproved,

    #[error("bot approval has expired")]
    Expired,

    #[error("bot credentials are not verified")]
    NotVerified,

    #[error("no OTP request found for this phone number")]
    OtpNotFound,

    #[error("OTP does not match")]
    OtpMismatch,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("invalid or expired guest token")]
    InvalidToken,

    #[error(transparent)]
    Credentials(#[from] wafleet_credentials::Error),

    #[error(transparent)]
    Registry(#[from] wafleet_registry::Error),

    #[error(transparent)]
    Supervisor(#[from] wafleet_supervisor::Error),
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
