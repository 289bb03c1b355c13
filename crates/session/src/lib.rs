//! Session Worker contract (C3): the trait a Supervisor drives per bot
//! instance, independent of which WhatsApp client library backs it.

pub mod error;
pub mod worker;

pub use error::{Error, Result};
pub use worker::{
    DisconnectReason, SessionEvent, SessionEventSink, SessionStatus, SessionWorker,
    SessionWorkerFactory,
};
