#![forbid(unsafe_code)]

mod client;
mod error;
mod types;

pub use client::HttpClient;
pub use error::{Error, Result, TransportErrorKind};
pub use types::{HttpRequest, HttpResponse};
