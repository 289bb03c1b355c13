//! Concrete Session Worker (C3) backed by a WhatsApp-protocol client. The
//! client itself (Noise handshake, framing, pairing) is a [`client::WaSessionClient`]
//! implementation supplied by whatever session library a deployment links in.

pub mod client;
pub mod worker;

pub use client::{WaClientError, WaDisconnect, WaSessionClient, WaSessionClientFactory};
pub use worker::{WhatsAppSessionWorker, WhatsAppWorkerFactory};
