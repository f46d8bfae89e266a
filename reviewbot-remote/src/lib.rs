//! Typed Review Board client: GET/PUT/POST against the review server with a
//! bearer token, form-encoded multipart bodies for writes, JSON decoding on
//! reads. No retry, no custom timeout beyond the HTTP client's defaults.

pub mod client;
pub mod errors;
pub mod trait_api;
pub mod types;

pub use client::{RbClient, RbConfig};
pub use errors::{Error, RbResult};
pub use trait_api::ReviewBoardApi;
