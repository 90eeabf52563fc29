//! Upstream bank account data API access.
//!
//! [`Transport`] is the seam for HTTP; [`BankDataClient`] drives the consent flow
//! endpoints on top of it and records progress in a
//! [`Session`](bankflow_core::session::Session).

pub mod client;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::BankDataClient;
pub use transport::{Method, ReqwestTransport, ReqwestTransportBuilder, RetryPolicy, Transport};
