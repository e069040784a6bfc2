//! Outbound HTTP client.
//!
//! [`HttpClient`] encodes parameters per verb and hands an
//! [`OutboundRequest`] to an [`Exchange`]. The shipped [`UreqExchange`] does
//! not verify TLS certificates and sets no timeout.

mod client;
mod errors;
mod exchange;
mod query;
mod response;

pub use client::HttpClient;
pub use errors::HttpError;
pub use exchange::{
    Credentials, Exchange, ExchangeFailure, Method, OutboundRequest, RawResponse, UreqExchange,
};
pub use query::{build_query, url_add_query};
pub use response::HttpResponse;

const HTTP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::http");
