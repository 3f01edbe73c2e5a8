//! LSAT core library.
//!
//! This library provides the token data model and primitives for the LSAT
//! pay-per-request authentication protocol: token identifiers, macaroon
//! envelopes, the process root key, and the payment backend interface.

pub mod backend;
pub mod errors;
pub mod header;
pub mod identifier;
pub mod macaroon;
pub mod root_key;
pub mod types;
